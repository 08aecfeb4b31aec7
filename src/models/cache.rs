use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::meeting::MeetingFilters;

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        let fetched_at = Utc::now();
        Self {
            value,
            fetched_at,
            expires_at: fetched_at + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    LatestSession,
    FallbackSession,
    Drivers,
    Leaderboard,
    Telemetry,
    Stats,
    Stints,
    Meetings,
    MeetingSession,
}

/// Structured cache key with value equality: the view, the session, the
/// sorted driver set and any view-specific filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ViewKind,
    pub session_key: Option<u32>,
    pub drivers: BTreeSet<u32>,
    pub meeting_key: Option<u32>,
    pub filters: Option<MeetingFilters>,
}

impl CacheKey {
    pub fn new(kind: ViewKind, session_key: Option<u32>) -> Self {
        Self {
            kind,
            session_key,
            drivers: BTreeSet::new(),
            meeting_key: None,
            filters: None,
        }
    }

    pub fn with_drivers(mut self, drivers: impl IntoIterator<Item = u32>) -> Self {
        self.drivers = drivers.into_iter().collect();
        self
    }

    pub fn with_meeting(mut self, meeting_key: Option<u32>) -> Self {
        self.meeting_key = meeting_key;
        self
    }

    pub fn with_filters(mut self, filters: &MeetingFilters) -> Self {
        self.filters = Some(filters.normalized());
        self
    }
}
