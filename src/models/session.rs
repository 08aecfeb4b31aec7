use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::race_utils::parse_timestamp;

/// One timed on-track activity as reported by the `sessions` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_key: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_key: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Session {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.date_start.as_deref().and_then(parse_timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.date_end.as_deref().and_then(parse_timestamp)
    }

    /// A missing or unparseable start counts as already started.
    pub fn has_started_at(&self, now: DateTime<Utc>) -> bool {
        match self.start_time() {
            Some(start) => now >= start,
            None => true,
        }
    }

    /// False only when both bounds parse and the end precedes the start.
    pub fn has_consistent_window(&self) -> bool {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    pub fn heading(&self) -> String {
        format!(
            "{} • {}",
            self.session_name.as_deref().unwrap_or("Race"),
            self.location.as_deref().unwrap_or("TBC")
        )
    }
}
