use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use pitwall::{
    models::meeting::MeetingFilters, testing::ScriptedTransport, AppState, Config, Error, ResourceClient,
};

const MIRROR: &str = "https://mirror.example/v1";

const MEETINGS: &str = r#"[
    {"meeting_key": 1228, "meeting_name": "Pre-Season Testing", "circuit_short_name": "Sakhir", "location": "Sakhir", "date_start": "2024-02-21T07:00:00+00:00"},
    {"meeting_key": 1229, "meeting_name": "Bahrain Grand Prix", "circuit_short_name": "Sakhir", "location": "Sakhir", "date_start": "2024-02-29T11:30:00+00:00"},
    {"meeting_key": 1230, "meeting_name": "Saudi Arabian Grand Prix", "circuit_short_name": "Jeddah", "location": "Jeddah", "date_start": "2024-03-07T13:30:00+00:00"},
    {"meeting_key": 1231, "meeting_name": "Australian Grand Prix", "circuit_short_name": "Melbourne", "location": "Melbourne", "date_start": "2024-03-22T01:30:00+00:00"}
]"#;

fn archive(fake: &Arc<ScriptedTransport>) -> AppState {
    let config = Config::default().with_fallback(Some(MIRROR.to_string()));
    AppState::new(ResourceClient::with_transport(config, fake.clone()))
}

fn keys(meetings: &[pitwall::models::RaceMeeting]) -> Vec<u32> {
    meetings.iter().map(|m| m.meeting_key).collect()
}

#[tokio::test]
async fn season_listing_comes_from_mirror_when_primary_is_down() {
    let fake = ScriptedTransport::shared();
    fake.route_status("api.openf1.org/v1/meetings", 503, "");
    fake.route("mirror.example/v1/meetings", MEETINGS);
    let state = archive(&fake);

    let listing = state.meetings(&MeetingFilters::for_year(2024)).await;

    assert!(!listing.is_error);
    assert_eq!(keys(&listing.data.unwrap()), vec![1231, 1230, 1229]);
    assert_eq!(fake.request_count("year=2024"), 2);
}

#[tokio::test]
async fn circuit_and_driver_filters_combine() {
    let fake = ScriptedTransport::shared();
    fake.route("/meetings?", MEETINGS);
    fake.route(
        "/session_result?driver_number=44",
        r#"[
            {"driver_number": 44, "meeting_key": 1228, "session_key": 9460},
            {"driver_number": 44, "meeting_key": 1229, "session_key": 9472, "position": 7},
            {"driver_number": 44, "meeting_key": 1230, "session_key": 9480, "position": 9}
        ]"#,
    );
    let state = archive(&fake);
    let filters = MeetingFilters {
        year: Some(2024),
        circuit: Some("  SAKHIR ".to_string()),
        driver_number: Some(44),
    };

    let listing = state.meetings(&filters).await.data.unwrap();
    assert_eq!(keys(&listing), vec![1229]);

    // Same filters with different spelling hit the cache.
    let respelled = MeetingFilters {
        circuit: Some("sakhir".to_string()),
        ..filters
    };
    assert_eq!(keys(&state.meetings(&respelled).await.data.unwrap()), vec![1229]);
    assert_eq!(fake.request_count("/meetings?"), 1);
}

#[tokio::test]
async fn meeting_race_session_resolves_key() {
    let fake = ScriptedTransport::shared();
    fake.route(
        "meeting_key=1229",
        r#"[{"session_key": 9472, "meeting_key": 1229, "session_type": "Race"}]"#,
    );
    let state = archive(&fake);

    let session = state.meeting_race_session(1229).await.data.flatten();
    assert_eq!(session.map(|s| s.session_key), Some(9472));

    let missing = state.meeting_race_session(1300).await;
    assert!(missing.is_error);
}

#[tokio::test]
async fn previous_race_fallback_through_the_mirror() {
    let fake = ScriptedTransport::shared();
    fake.route(
        "session_key=latest",
        r#"[{"session_key": 9500, "meeting_key": 1230, "date_start": "2024-03-09T17:00:00+00:00"}]"#,
    );
    fake.route_status("api.openf1.org/v1/sessions?session_type=Race&order", 500, "");
    fake.route(
        "mirror.example/v1/sessions?session_type=Race&order",
        r#"[{"session_key": 9472, "meeting_key": 1229, "date_end": "2024-03-02T17:00:00+00:00"}]"#,
    );
    let state = archive(&fake);
    let now = Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap();

    let view = state.session_view_at(now).await;

    assert!(view.resolved.is_fallback);
    assert_eq!(view.resolved.session_key(), Some(9472));
    assert!(!view.is_error);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_primary_backs_off_then_recovers() {
    let fake = ScriptedTransport::shared();
    fake.push_status(429);
    fake.push_status(429);
    fake.push_json(r#"[{"session_key": 9472}]"#);
    let client = ResourceClient::with_transport(Config::default().with_fallback(Some(MIRROR.into())), fake.clone());

    let started = tokio::time::Instant::now();
    let sessions = client.latest_race_session().await.unwrap();
    let waited = started.elapsed();

    assert_eq!(sessions.map(|s| s.session_key), Some(9472));
    assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
    assert_eq!(fake.request_count("mirror.example"), 0);
}

#[tokio::test]
async fn both_endpoints_down_reports_both_statuses() {
    let fake = ScriptedTransport::shared();
    fake.route_status("api.openf1.org", 502, "");
    fake.route_status("mirror.example", 503, "");
    let client = ResourceClient::with_transport(Config::default().with_fallback(Some(MIRROR.into())), fake.clone());

    let err = client.stints(9472).await.unwrap_err();
    match err {
        Error::Transport { primary, fallback, .. } => {
            assert_eq!(primary.map(|s| s.as_u16()), Some(502));
            assert_eq!(fallback.map(|s| s.as_u16()), Some(503));
        }
        other => panic!("unexpected error: {other}"),
    }
}
