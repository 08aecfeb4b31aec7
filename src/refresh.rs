//! In-memory refresh orchestration: one slot per [`CacheKey`], at most one
//! request in flight per key, superseded results discarded, and the last good
//! value kept when a refresh fails.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    handlers::session::{has_started, ResolvedSession},
    models::{
        cache::{CacheEntry, CacheKey},
        error::{Error, Result},
        Session,
    },
    utils::config::RefreshPolicy,
};

#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Fetching with nothing to show yet.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_error: bool,
    pub error: Option<Arc<Error>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            updated_at: None,
            is_loading: false,
            is_fetching: false,
            is_error: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Slots idle for this many minutes are dropped when a poller stops.
pub const IDLE_SLOT_MINUTES: i64 = 10;

struct Slot<T> {
    entry: Option<CacheEntry<T>>,
    generation: u64,
    in_flight: bool,
    error: Option<Arc<Error>>,
    touched_at: DateTime<Utc>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            entry: None,
            generation: 0,
            in_flight: false,
            error: None,
            touched_at: Utc::now(),
        }
    }
}

/// Clears the in-flight flag if the request future is dropped before it
/// completes (an aborted poller, a cancelled caller).
struct InFlight<'a, T> {
    slots: &'a DashMap<CacheKey, Slot<T>>,
    key: &'a CacheKey,
    generation: u64,
    armed: bool,
}

impl<T> InFlight<'_, T> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(mut slot) = self.slots.get_mut(self.key) {
            if slot.generation == self.generation {
                debug!(key = ?self.key, "request cancelled, clearing in-flight flag");
                slot.in_flight = false;
            }
        }
    }
}

impl<T: Clone> Slot<T> {
    fn snapshot(&self) -> QueryState<T> {
        QueryState {
            data: self.entry.as_ref().map(|e| e.value.clone()),
            updated_at: self.entry.as_ref().map(|e| e.fetched_at),
            is_loading: self.in_flight && self.entry.is_none(),
            is_fetching: self.in_flight,
            is_error: self.error.is_some(),
            error: self.error.clone(),
        }
    }
}

pub struct QueryCache<T> {
    slots: DashMap<CacheKey, Slot<T>>,
    stale_after: Duration,
}

impl<T: Clone + Send + Sync> QueryCache<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            stale_after,
        }
    }

    pub fn state(&self, key: &CacheKey) -> QueryState<T> {
        self.slots
            .get(key)
            .map(|slot| slot.snapshot())
            .unwrap_or_default()
    }

    /// Runs `fetch` for `key` unless a request for that key is already in
    /// flight, in which case the current snapshot is returned and `fetch` is
    /// dropped unpolled.
    pub async fn fetch<F>(&self, key: CacheKey, fetch: F) -> QueryState<T>
    where
        F: Future<Output = Result<T>>,
    {
        let generation = {
            let mut slot = self.slots.entry(key.clone()).or_default();
            if slot.in_flight {
                debug!(?key, "request already in flight");
                return slot.snapshot();
            }
            slot.generation += 1;
            slot.in_flight = true;
            slot.touched_at = Utc::now();
            slot.generation
        };

        let guard = InFlight {
            slots: &self.slots,
            key: &key,
            generation,
            armed: true,
        };
        let outcome = fetch.await;
        // Must be released before the slot is locked again below.
        guard.disarm();

        let Some(mut slot) = self.slots.get_mut(&key) else {
            debug!(?key, "slot removed while fetching, result dropped");
            return QueryState::default();
        };
        if slot.generation != generation {
            debug!(?key, generation, "superseded result dropped");
            return slot.snapshot();
        }
        slot.in_flight = false;
        match outcome {
            Ok(value) => {
                slot.entry = Some(CacheEntry::new(value, self.stale_after));
                slot.error = None;
            }
            Err(err) => {
                warn!(?key, error = %err, "refresh failed, keeping previous data");
                slot.error = Some(Arc::new(err));
            }
        }
        slot.snapshot()
    }

    /// Serves a fresh cached value without touching the network.
    pub async fn get_or_fetch<F>(&self, key: CacheKey, fetch: F) -> QueryState<T>
    where
        F: Future<Output = Result<T>>,
    {
        let fresh = self.slots.get(&key).and_then(|slot| {
            slot.entry
                .as_ref()
                .filter(|entry| !entry.is_expired() && slot.error.is_none())
                .map(|_| slot.snapshot())
        });
        match fresh {
            Some(state) => state,
            None => self.fetch(key, fetch).await,
        }
    }

    /// Any in-flight completion for `key` will be ignored.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(mut slot) = self.slots.get_mut(key) {
            slot.generation += 1;
            slot.in_flight = false;
        }
    }

    pub fn remove(&self, key: &CacheKey) {
        self.slots.remove(key);
    }

    /// Drops slots with no request in flight that nobody has fetched for
    /// `idle_for`. Returns how many were removed.
    pub fn prune_idle(&self, idle_for: Duration) -> usize {
        let cutoff = Utc::now() - idle_for;
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.in_flight || slot.touched_at > cutoff);
        let removed = before.saturating_sub(self.slots.len());
        if removed > 0 {
            debug!(removed, "pruned idle cache slots");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Aborts the polling task on drop, so replacing a poller for new parameters
/// stops the old key's refreshes, then prunes idle slots of its cache.
pub struct Poller {
    handle: JoinHandle<()>,
    on_stop: Option<Box<dyn FnOnce() + Send>>,
}

impl Poller {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
        if let Some(on_stop) = self.on_stop.take() {
            on_stop();
        }
    }
}

pub fn spawn_polling<T, F, Fut>(
    cache: Arc<QueryCache<T>>,
    key: CacheKey,
    policy: RefreshPolicy,
    fetch: F,
) -> Poller
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let pruned = Arc::clone(&cache);
    let handle = tokio::spawn(async move {
        match policy.interval() {
            None => {
                cache.fetch(key, fetch()).await;
            }
            Some(period) => {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    cache.fetch(key.clone(), fetch()).await;
                }
            }
        }
    });
    Poller {
        handle,
        on_stop: Some(Box::new(move || {
            pruned.prune_idle(Duration::minutes(IDLE_SLOT_MINUTES));
        })),
    }
}

/// The resolver's output with flags taken only from the path that matters:
/// the latest-session query while it is live, the fallback query otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub resolved: ResolvedSession,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_error: bool,
    #[serde(skip)]
    pub error: Option<Arc<Error>>,
}

impl SessionView {
    /// Whether the fallback query should run for this latest-session state.
    /// When it should not, the cached fallback is still used for display.
    pub fn needs_fallback(latest: &QueryState<Option<Session>>, now: DateTime<Utc>) -> bool {
        let latest_session = latest.data.clone().flatten();
        !latest.is_fetching && !has_started(latest_session.as_ref(), now)
    }

    pub fn combine(
        latest: &QueryState<Option<Session>>,
        fallback: &QueryState<Option<Session>>,
        now: DateTime<Utc>,
    ) -> Self {
        let latest_session = latest.data.clone().flatten();
        let fallback_session = fallback.data.clone().flatten();
        let fallback_relevant = Self::needs_fallback(latest, now);

        let fallback_error = fallback_relevant && fallback.is_error && fallback_session.is_none();
        let latest_error = !fallback_relevant && latest.is_error && latest_session.is_none();
        let error = if fallback_error {
            fallback.error.clone().or_else(|| latest.error.clone())
        } else if latest_error {
            latest.error.clone()
        } else {
            None
        };

        SessionView {
            resolved: ResolvedSession::from_parts(latest_session, fallback_session, now),
            is_loading: latest.is_loading || (fallback_relevant && fallback.is_loading),
            is_fetching: latest.is_fetching || fallback.is_fetching,
            is_error: fallback_error || latest_error,
            error,
        }
    }
}
