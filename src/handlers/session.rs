//! Which session the live dashboard should show.
//!
//! A started "latest" race session is shown live. Otherwise the most recently
//! completed race from a bounded recent window is substituted, skipping the
//! meeting of the upcoming session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    client::{ResourceClient, FALLBACK_SEARCH_WINDOW},
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        Session,
    },
};

pub const AWAITING_SESSION: &str = "Awaiting next race session";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSession {
    pub session: Option<Session>,
    pub is_fallback: bool,
    pub fallback_session: Option<Session>,
}

impl ResolvedSession {
    /// Live when `latest` has started; otherwise the fallback if there is one,
    /// else the not-yet-started session itself.
    pub fn from_parts(latest: Option<Session>, fallback: Option<Session>, now: DateTime<Utc>) -> Self {
        if has_started(latest.as_ref(), now) {
            return ResolvedSession {
                session: latest,
                is_fallback: false,
                fallback_session: None,
            };
        }
        ResolvedSession {
            is_fallback: fallback.is_some(),
            session: fallback.clone().or(latest),
            fallback_session: fallback,
        }
    }

    pub fn session_key(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.session_key)
    }

    pub fn heading(&self) -> String {
        self.session
            .as_ref()
            .map(Session::heading)
            .unwrap_or_else(|| AWAITING_SESSION.to_string())
    }
}

pub fn has_started(session: Option<&Session>, now: DateTime<Utc>) -> bool {
    session.is_some_and(|s| s.has_started_at(now))
}

/// Latest completed candidate outside `exclude_meeting`; failing that, the
/// first candidate outside it in upstream order. Sessions ending before they
/// start are never picked.
pub fn pick_fallback(
    candidates: &[Session],
    exclude_meeting: Option<u32>,
    now: DateTime<Utc>,
) -> Option<Session> {
    let eligible = |session: &&Session| {
        session.has_consistent_window()
            && match exclude_meeting {
                Some(meeting) => session.meeting_key != Some(meeting),
                None => true,
            }
    };

    let mut completed: Vec<(&Session, DateTime<Utc>)> = candidates
        .iter()
        .filter(eligible)
        .filter_map(|s| s.end_time().filter(|end| *end <= now).map(|end| (s, end)))
        .collect();
    completed.sort_by(|a, b| b.1.cmp(&a.1));

    completed
        .first()
        .map(|(session, _)| (*session).clone())
        .or_else(|| candidates.iter().find(eligible).cloned())
}

pub fn latest_key() -> CacheKey {
    CacheKey::new(ViewKind::LatestSession, None)
}

pub fn fallback_key(exclude_meeting: Option<u32>) -> CacheKey {
    CacheKey::new(ViewKind::FallbackSession, None).with_meeting(exclude_meeting)
}

pub async fn fetch_latest_session(client: &ResourceClient) -> Result<Option<Session>> {
    client.latest_race_session().await
}

pub async fn fetch_fallback_session(
    client: &ResourceClient,
    exclude_meeting: Option<u32>,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let candidates = client.recent_race_sessions(FALLBACK_SEARCH_WINDOW).await?;
    let picked = pick_fallback(&candidates, exclude_meeting, now);
    debug!(
        candidates = candidates.len(),
        ?exclude_meeting,
        picked = ?picked.as_ref().map(|s| s.session_key),
        "fallback session search"
    );
    Ok(picked)
}

pub async fn resolve_session_at(client: &ResourceClient, now: DateTime<Utc>) -> Result<ResolvedSession> {
    let latest = fetch_latest_session(client).await?;
    if has_started(latest.as_ref(), now) {
        return Ok(ResolvedSession::from_parts(latest, None, now));
    }

    let exclude = latest.as_ref().and_then(|s| s.meeting_key);
    let fallback = fetch_fallback_session(client, exclude, now).await?;
    let resolved = ResolvedSession::from_parts(latest, fallback, now);
    if resolved.is_fallback {
        info!(session_key = ?resolved.session_key(), "no live session, showing previous race");
    }
    Ok(resolved)
}

pub async fn resolve_session(client: &ResourceClient) -> Result<ResolvedSession> {
    resolve_session_at(client, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::ScriptedTransport, utils::config::Config};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
    }

    fn session(key: u32, meeting: u32, start: Option<&str>, end: Option<&str>) -> Session {
        Session {
            session_key: key,
            meeting_key: Some(meeting),
            date_start: start.map(str::to_string),
            date_end: end.map(str::to_string),
            session_type: Some("Race".into()),
            session_name: Some("Race".into()),
            location: None,
            country_name: None,
            circuit_short_name: None,
            year: Some(2024),
        }
    }

    #[test]
    fn absent_session_has_not_started() {
        assert!(!has_started(None, now()));
    }

    #[test]
    fn picks_latest_completed_outside_excluded_meeting() {
        let candidates = vec![
            session(3, 30, None, Some("2024-03-10T17:00:00+00:00")), // ends in the future
            session(2, 20, None, Some("2024-03-02T17:00:00+00:00")),
            session(4, 40, None, Some("2024-03-05T17:00:00+00:00")), // excluded meeting
            session(1, 10, None, Some("2024-02-24T17:00:00+00:00")),
        ];
        let picked = pick_fallback(&candidates, Some(40), now()).unwrap();
        assert_eq!(picked.session_key, 2);
    }

    #[test]
    fn without_completed_candidates_takes_first_eligible() {
        let candidates = vec![
            session(5, 50, None, Some("2024-03-10T17:00:00+00:00")),
            session(6, 60, None, None),
        ];
        assert_eq!(pick_fallback(&candidates, Some(50), now()).unwrap().session_key, 6);
        assert_eq!(pick_fallback(&candidates[..1], Some(50), now()), None);
        assert_eq!(pick_fallback(&[], None, now()), None);
    }

    #[test]
    fn inverted_window_is_never_picked() {
        let candidates = vec![
            session(7, 70, Some("2024-03-08T15:00:00+00:00"), Some("2024-03-08T13:00:00+00:00")),
            session(2, 20, Some("2024-03-02T15:00:00+00:00"), Some("2024-03-02T17:00:00+00:00")),
        ];
        assert_eq!(pick_fallback(&candidates, None, now()).unwrap().session_key, 2);
        assert_eq!(pick_fallback(&candidates[..1], None, now()), None);
    }

    #[test]
    fn started_latest_is_live() {
        let latest = session(9, 90, Some("2024-03-09T11:00:00+00:00"), None);
        let resolved = ResolvedSession::from_parts(Some(latest.clone()), None, now());
        assert_eq!(resolved.session, Some(latest));
        assert!(!resolved.is_fallback);
    }

    #[test]
    fn unresolved_when_nothing_found() {
        let resolved = ResolvedSession::from_parts(None, None, now());
        assert_eq!(resolved.session, None);
        assert!(!resolved.is_fallback);
        assert_eq!(resolved.heading(), AWAITING_SESSION);
    }

    #[test]
    fn upcoming_without_fallback_is_still_shown() {
        let upcoming = session(9, 90, Some("2024-03-16T15:00:00+00:00"), None);
        let resolved = ResolvedSession::from_parts(Some(upcoming.clone()), None, now());
        assert_eq!(resolved.session, Some(upcoming));
        assert!(!resolved.is_fallback);
    }

    #[tokio::test]
    async fn future_latest_falls_back_to_previous_race() {
        let fake = ScriptedTransport::shared();
        fake.route(
            "session_key=latest",
            r#"[{"session_key": 9500, "meeting_key": 1230, "date_start": "2024-03-16T15:00:00+00:00"}]"#,
        );
        fake.route(
            "order=date_end.desc",
            r#"[
                {"session_key": 9501, "meeting_key": 1230, "date_end": "2024-03-08T17:00:00+00:00"},
                {"session_key": 9472, "meeting_key": 1229, "date_end": "2024-03-02T17:00:00+00:00"}
            ]"#,
        );
        let client = ResourceClient::with_transport(Config::default(), fake.clone());

        let resolved = resolve_session_at(&client, now()).await.unwrap();

        assert!(resolved.is_fallback);
        assert_eq!(resolved.session_key(), Some(9472));
        assert_eq!(resolved.fallback_session.map(|s| s.session_key), Some(9472));
        assert_eq!(fake.request_count("limit=20"), 1);
    }

    #[tokio::test]
    async fn live_session_skips_fallback_query() {
        let fake = ScriptedTransport::shared();
        fake.route(
            "session_key=latest",
            r#"[{"session_key": 9472, "meeting_key": 1229, "date_start": "2024-03-09T11:00:00+00:00"}]"#,
        );
        let client = ResourceClient::with_transport(Config::default(), fake.clone());

        let resolved = resolve_session_at(&client, now()).await.unwrap();

        assert!(!resolved.is_fallback);
        assert_eq!(resolved.session_key(), Some(9472));
        assert_eq!(fake.requested_urls().len(), 1);
    }
}
