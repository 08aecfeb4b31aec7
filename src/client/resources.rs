use std::collections::BTreeSet;

use tokio::task::JoinSet;

use super::{QueryParams, Resource, ResourceClient};
use crate::{
    models::{
        error::Result, Driver, Interval, Lap, RaceMeeting, Session, SessionResult, Stint,
    },
    utils::race_utils::RACE_SESSION_TYPE,
};

/// How many recent race sessions are considered when looking for a fallback.
pub const FALLBACK_SEARCH_WINDOW: u32 = 20;
pub const DEFAULT_LAP_CEILING: u32 = 80;

impl ResourceClient {
    pub async fn latest_race_session(&self) -> Result<Option<Session>> {
        let params = QueryParams::new()
            .param("session_key", "latest")
            .param("session_type", RACE_SESSION_TYPE);
        let sessions: Vec<Session> = self.request(Resource::Sessions, &params).await?;
        Ok(sessions.into_iter().next())
    }

    /// Most recently ended race sessions first, bounded to `limit`.
    pub async fn recent_race_sessions(&self, limit: u32) -> Result<Vec<Session>> {
        let params = QueryParams::new()
            .param("session_type", RACE_SESSION_TYPE)
            .param("order", "date_end.desc")
            .param("limit", limit);
        self.request(Resource::Sessions, &params).await
    }

    pub async fn sessions(&self, params: &QueryParams) -> Result<Vec<Session>> {
        self.request(Resource::Sessions, params).await
    }

    pub async fn meeting_race_session(&self, meeting_key: u32) -> Result<Option<Session>> {
        let params = QueryParams::new()
            .param("meeting_key", meeting_key)
            .param("session_type", RACE_SESSION_TYPE);
        Ok(self.sessions(&params).await?.into_iter().next())
    }

    pub async fn drivers(&self, session_key: u32) -> Result<Vec<Driver>> {
        let params = QueryParams::new().param("session_key", session_key);
        self.request(Resource::Drivers, &params).await
    }

    /// With no drivers, one request for the whole field. Otherwise one request
    /// per driver, issued concurrently and unioned. The ceiling is applied
    /// server-side and again locally, since the mirror may ignore filters.
    pub async fn laps(&self, session_key: u32, drivers: &[u32], lap_ceiling: u32) -> Result<Vec<Lap>> {
        let base = QueryParams::new()
            .param("session_key", session_key)
            .param("lap_number<=", lap_ceiling);

        let mut laps: Vec<Lap> = if drivers.is_empty() {
            self.request(Resource::Laps, &base).await?
        } else {
            let unique: BTreeSet<u32> = drivers.iter().copied().collect();
            let mut tasks = JoinSet::new();
            for driver in unique {
                let client = self.clone();
                let params = base.clone().param("driver_number", driver);
                tasks.spawn(async move { client.request::<Lap>(Resource::Laps, &params).await });
            }
            let mut union = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                union.extend(joined??);
            }
            union
        };

        laps.retain(|lap| lap.lap_number <= lap_ceiling);
        laps.sort_by_key(|lap| (lap.driver_number, lap.lap_number));
        laps.dedup_by_key(|lap| (lap.driver_number, lap.lap_number));
        Ok(laps)
    }

    pub async fn intervals(&self, session_key: u32) -> Result<Vec<Interval>> {
        let params = QueryParams::new().param("session_key", session_key);
        self.request(Resource::Intervals, &params).await
    }

    pub async fn stints(&self, session_key: u32) -> Result<Vec<Stint>> {
        let params = QueryParams::new().param("session_key", session_key);
        self.request(Resource::Stints, &params).await
    }

    pub async fn meetings(&self, params: &QueryParams) -> Result<Vec<RaceMeeting>> {
        self.request(Resource::Meetings, params).await
    }

    pub async fn session_results(&self, session_key: u32) -> Result<Vec<SessionResult>> {
        let params = QueryParams::new().param("session_key", session_key);
        self.request(Resource::SessionResult, &params).await
    }

    /// Every classification this driver has, across all sessions.
    pub async fn driver_session_results(&self, driver_number: u32) -> Result<Vec<SessionResult>> {
        let params = QueryParams::new().param("driver_number", driver_number);
        self.request(Resource::SessionResult, &params).await
    }
}
