use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::{
    client::{ResourceClient, DEFAULT_LAP_CEILING},
    handlers::{leaderboard, meetings, session, stats, strategy, telemetry},
    models::{
        cache::{CacheKey, ViewKind},
        leaderboard::LeaderboardRow,
        meeting::MeetingFilters,
        stats::{DriverStats, StintGroup},
        telemetry::TelemetryView,
        Driver, RaceMeeting, Session, Stint,
    },
    refresh::{spawn_polling, Poller, QueryCache, QueryState, SessionView},
    utils::{
        config::{Config, RefreshPolicy},
        logging::{init_tracing, parse_level, LOG_LEVEL_VAR},
    },
};

/// Shared dashboard state: one client and one refresh cache per view.
#[derive(Clone)]
pub struct AppState {
    pub client: ResourceClient,
    pub lap_ceiling: u32,
    pub latest_session_cache: Arc<QueryCache<Option<Session>>>,
    pub fallback_session_cache: Arc<QueryCache<Option<Session>>>,
    pub drivers_cache: Arc<QueryCache<Vec<Driver>>>,
    pub leaderboard_cache: Arc<QueryCache<Vec<LeaderboardRow>>>,
    pub telemetry_cache: Arc<QueryCache<TelemetryView>>,
    pub stats_cache: Arc<QueryCache<Vec<DriverStats>>>,
    pub stints_cache: Arc<QueryCache<Vec<Stint>>>,
    pub meetings_cache: Arc<QueryCache<Vec<RaceMeeting>>>,
    pub meeting_session_cache: Arc<QueryCache<Option<Session>>>,
}

impl AppState {
    /// Installs logging from `LOG_LEVEL`, then builds the client from the
    /// environment.
    pub fn init() -> Self {
        let level = std::env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_string());
        init_tracing(parse_level(&level));

        info!("Initializing dashboard state...");
        let config = Config::init();
        info!(
            primary = %config.primary_base_url,
            fallback = ?config.fallback_base_url,
            "Configuration loaded successfully"
        );
        Self::new(ResourceClient::new(config))
    }

    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            lap_ceiling: DEFAULT_LAP_CEILING,
            latest_session_cache: Arc::new(QueryCache::new(Duration::seconds(60))),
            fallback_session_cache: Arc::new(QueryCache::new(Duration::minutes(15))),
            drivers_cache: Arc::new(QueryCache::new(Duration::seconds(120))),
            leaderboard_cache: Arc::new(QueryCache::new(Duration::seconds(5))),
            telemetry_cache: Arc::new(QueryCache::new(Duration::seconds(15))),
            stats_cache: Arc::new(QueryCache::new(Duration::seconds(30))),
            stints_cache: Arc::new(QueryCache::new(Duration::seconds(30))),
            meetings_cache: Arc::new(QueryCache::new(Duration::hours(1))),
            meeting_session_cache: Arc::new(QueryCache::new(Duration::hours(1))),
        }
    }

    pub fn with_lap_ceiling(mut self, lap_ceiling: u32) -> Self {
        self.lap_ceiling = lap_ceiling;
        self
    }

    /// Refreshes the latest session, and the fallback search only while the
    /// latest session has not started.
    pub async fn session_view_at(&self, now: DateTime<Utc>) -> SessionView {
        let latest = self
            .latest_session_cache
            .fetch(session::latest_key(), session::fetch_latest_session(&self.client))
            .await;

        let exclude = latest.data.as_ref().and_then(|s| s.as_ref()).and_then(|s| s.meeting_key);
        let fallback_key = session::fallback_key(exclude);
        // While the latest query is in flight the last fallback stays on screen.
        let fallback = if SessionView::needs_fallback(&latest, now) {
            self.fallback_session_cache
                .get_or_fetch(fallback_key, session::fetch_fallback_session(&self.client, exclude, now))
                .await
        } else {
            self.fallback_session_cache.state(&fallback_key)
        };

        SessionView::combine(&latest, &fallback, now)
    }

    pub async fn session_view(&self) -> SessionView {
        self.session_view_at(Utc::now()).await
    }

    pub async fn drivers(&self, session_key: Option<u32>) -> QueryState<Vec<Driver>> {
        let client = &self.client;
        self.drivers_cache
            .fetch(CacheKey::new(ViewKind::Drivers, session_key), async move {
                match session_key {
                    Some(session_key) => client.drivers(session_key).await,
                    None => Ok(Vec::new()),
                }
            })
            .await
    }

    pub async fn leaderboard(&self, session_key: Option<u32>, drivers: &[Driver]) -> QueryState<Vec<LeaderboardRow>> {
        self.leaderboard_cache
            .fetch(
                leaderboard::cache_key(session_key, drivers),
                leaderboard::fetch_leaderboard(&self.client, session_key, drivers),
            )
            .await
    }

    pub async fn telemetry(&self, session_key: Option<u32>, drivers: &[Driver]) -> QueryState<TelemetryView> {
        self.telemetry_cache
            .fetch(
                telemetry::cache_key(session_key, drivers),
                telemetry::fetch_telemetry(&self.client, session_key, drivers, self.lap_ceiling),
            )
            .await
    }

    pub async fn stats(&self, session_key: Option<u32>, drivers: &[Driver]) -> QueryState<Vec<DriverStats>> {
        self.stats_cache
            .fetch(
                stats::cache_key(session_key, drivers),
                stats::fetch_stats(&self.client, session_key, drivers, self.lap_ceiling),
            )
            .await
    }

    /// Pit strategy groups for the drivers in `driver_filter` (all when empty).
    pub async fn strategy(
        &self,
        session_key: Option<u32>,
        drivers: &[Driver],
        driver_filter: &[u32],
    ) -> QueryState<Vec<StintGroup>> {
        let state = self
            .stints_cache
            .fetch(
                strategy::cache_key(session_key),
                strategy::fetch_stints(&self.client, session_key),
            )
            .await;
        QueryState {
            data: state
                .data
                .as_ref()
                .map(|stints| strategy::group_stints(stints, drivers, driver_filter)),
            updated_at: state.updated_at,
            is_loading: state.is_loading,
            is_fetching: state.is_fetching,
            is_error: state.is_error,
            error: state.error,
        }
    }

    /// Archive listings change rarely, so a cached copy is served while fresh.
    pub async fn meetings(&self, filters: &MeetingFilters) -> QueryState<Vec<RaceMeeting>> {
        self.meetings_cache
            .get_or_fetch(meetings::cache_key(filters), meetings::fetch_meetings(&self.client, filters))
            .await
    }

    pub async fn meeting_race_session(&self, meeting_key: u32) -> QueryState<Option<Session>> {
        self.meeting_session_cache
            .get_or_fetch(
                meetings::meeting_session_key(meeting_key),
                meetings::fetch_meeting_race_session(&self.client, Some(meeting_key)),
            )
            .await
    }

    /// Drops idle slots from every view cache.
    pub fn prune_idle(&self, idle_for: Duration) -> usize {
        self.latest_session_cache.prune_idle(idle_for)
            + self.fallback_session_cache.prune_idle(idle_for)
            + self.drivers_cache.prune_idle(idle_for)
            + self.leaderboard_cache.prune_idle(idle_for)
            + self.telemetry_cache.prune_idle(idle_for)
            + self.stats_cache.prune_idle(idle_for)
            + self.stints_cache.prune_idle(idle_for)
            + self.meetings_cache.prune_idle(idle_for)
            + self.meeting_session_cache.prune_idle(idle_for)
    }

    pub fn poll_leaderboard(&self, session_key: Option<u32>, drivers: Vec<Driver>, policy: RefreshPolicy) -> Poller {
        let client = self.client.clone();
        let key = leaderboard::cache_key(session_key, &drivers);
        spawn_polling(self.leaderboard_cache.clone(), key, policy, move || {
            let client = client.clone();
            let drivers = drivers.clone();
            async move { leaderboard::fetch_leaderboard(&client, session_key, &drivers).await }
        })
    }

    pub fn poll_telemetry(&self, session_key: Option<u32>, drivers: Vec<Driver>, policy: RefreshPolicy) -> Poller {
        let client = self.client.clone();
        let lap_ceiling = self.lap_ceiling;
        let key = telemetry::cache_key(session_key, &drivers);
        spawn_polling(self.telemetry_cache.clone(), key, policy, move || {
            let client = client.clone();
            let drivers = drivers.clone();
            async move { telemetry::fetch_telemetry(&client, session_key, &drivers, lap_ceiling).await }
        })
    }

    pub fn poll_stats(&self, session_key: Option<u32>, drivers: Vec<Driver>, policy: RefreshPolicy) -> Poller {
        let client = self.client.clone();
        let lap_ceiling = self.lap_ceiling;
        let key = stats::cache_key(session_key, &drivers);
        spawn_polling(self.stats_cache.clone(), key, policy, move || {
            let client = client.clone();
            let drivers = drivers.clone();
            async move { stats::fetch_stats(&client, session_key, &drivers, lap_ceiling).await }
        })
    }
}
