use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    client::{QueryParams, ResourceClient},
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        meeting::MeetingFilters,
        RaceMeeting, Session, SessionResult,
    },
    utils::race_utils::is_testing_event,
};

pub fn drop_testing(meetings: Vec<RaceMeeting>) -> Vec<RaceMeeting> {
    meetings
        .into_iter()
        .filter(|m| !is_testing_event(m.meeting_name.as_deref()))
        .collect()
}

/// `search` is already lower-cased.
pub fn matches_circuit(meeting: &RaceMeeting, search: &str) -> bool {
    [
        meeting.circuit_short_name.as_deref(),
        meeting.location.as_deref(),
        meeting.meeting_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(search))
}

/// Meetings the driver has a result in, restricted to `allowed`.
pub fn driver_meeting_keys(results: &[SessionResult], allowed: &BTreeSet<u32>) -> BTreeSet<u32> {
    results
        .iter()
        .filter_map(|r| r.meeting_key)
        .filter(|key| allowed.contains(key))
        .collect()
}

pub fn filter_meetings(
    meetings: Vec<RaceMeeting>,
    filters: &MeetingFilters,
    driver_results: Option<&[SessionResult]>,
) -> Vec<RaceMeeting> {
    let race_meetings = drop_testing(meetings);
    let allowed: BTreeSet<u32> = race_meetings.iter().map(|m| m.meeting_key).collect();

    let mut filtered: Vec<RaceMeeting> = match filters.circuit_search() {
        Some(search) => race_meetings
            .into_iter()
            .filter(|m| matches_circuit(m, &search))
            .collect(),
        None => race_meetings,
    };

    if let Some(results) = driver_results {
        let keys = driver_meeting_keys(results, &allowed);
        filtered.retain(|m| keys.contains(&m.meeting_key));
    }

    filtered.sort_by(|a, b| b.start_time().cmp(&a.start_time()));
    filtered
}

pub fn cache_key(filters: &MeetingFilters) -> CacheKey {
    CacheKey::new(ViewKind::Meetings, None).with_filters(filters)
}

pub fn meeting_session_key(meeting_key: u32) -> CacheKey {
    CacheKey::new(ViewKind::MeetingSession, None).with_meeting(Some(meeting_key))
}

pub async fn fetch_meetings(client: &ResourceClient, filters: &MeetingFilters) -> Result<Vec<RaceMeeting>> {
    let params = QueryParams::new().param("year", filters.year);

    let (meetings, driver_results) = match filters.driver_number {
        Some(driver_number) => {
            let (meetings, results) = tokio::try_join!(
                client.meetings(&params),
                client.driver_session_results(driver_number)
            )?;
            (meetings, Some(results))
        }
        None => (client.meetings(&params).await?, None),
    };
    debug!(
        year = ?filters.year,
        meetings = meetings.len(),
        driver_results = driver_results.as_ref().map(Vec::len),
        "meeting inputs"
    );

    Ok(filter_meetings(meetings, filters, driver_results.as_deref()))
}

pub async fn fetch_meeting_race_session(
    client: &ResourceClient,
    meeting_key: Option<u32>,
) -> Result<Option<Session>> {
    match meeting_key {
        Some(meeting_key) => client.meeting_race_session(meeting_key).await,
        None => Ok(None),
    }
}
