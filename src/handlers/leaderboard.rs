use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::{
    client::ResourceClient,
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        leaderboard::{LeaderboardRow, UNCLASSIFIED_POSITION},
        stint::group_by_driver,
        Driver, Interval, SessionResult, Stint,
    },
    utils::{format::format_gap, policy::CURRENT_TYRE},
};

/// Most recent snapshot per driver. Equal timestamps keep the later entry;
/// an unparseable timestamp loses to any parseable one.
pub fn latest_intervals(intervals: &[Interval]) -> BTreeMap<u32, &Interval> {
    let mut latest: BTreeMap<u32, &Interval> = BTreeMap::new();
    for entry in intervals {
        match latest.get(&entry.driver_number) {
            Some(existing) if entry.timestamp() < existing.timestamp() => {}
            _ => {
                latest.insert(entry.driver_number, entry);
            }
        }
    }
    latest
}

pub fn assemble_leaderboard(
    drivers: &[Driver],
    intervals: &[Interval],
    results: &[SessionResult],
    stints: &[Stint],
) -> Vec<LeaderboardRow> {
    let driver_map: HashMap<u32, &Driver> = drivers.iter().map(|d| (d.driver_number, d)).collect();
    let mut result_map: HashMap<u32, &SessionResult> = HashMap::new();
    for result in results {
        result_map.entry(result.driver_number).or_insert(result);
    }
    let stint_lookup = group_by_driver(stints);

    let mut rows: Vec<LeaderboardRow> = latest_intervals(intervals)
        .into_iter()
        .filter_map(|(driver_number, interval)| {
            let Some(driver) = driver_map.get(&driver_number) else {
                debug!(driver_number, "interval for unknown driver dropped");
                return None;
            };
            let result = result_map.get(&driver_number).copied();
            let number_of_laps = result.and_then(|r| r.number_of_laps);
            let compound = stint_lookup
                .get(&driver_number)
                .and_then(|driver_stints| CURRENT_TYRE.resolve(driver_stints, number_of_laps));

            Some(LeaderboardRow {
                position: result.and_then(|r| r.position).unwrap_or(UNCLASSIFIED_POSITION),
                driver: (*driver).clone(),
                gap_label: format_gap(interval.gap_to_leader.as_ref()),
                interval_label: format_gap(interval.interval.as_ref()),
                compound,
                number_of_laps,
                status: result.and_then(SessionResult::status_label),
            })
        })
        .collect();

    rows.sort_by_key(|row| row.position);
    rows
}

pub fn cache_key(session_key: Option<u32>, drivers: &[Driver]) -> CacheKey {
    CacheKey::new(ViewKind::Leaderboard, session_key).with_drivers(drivers.iter().map(|d| d.driver_number))
}

/// No session or no drivers is "not enough input": an empty board, not an error.
pub async fn fetch_leaderboard(
    client: &ResourceClient,
    session_key: Option<u32>,
    drivers: &[Driver],
) -> Result<Vec<LeaderboardRow>> {
    let Some(session_key) = session_key else {
        return Ok(Vec::new());
    };
    if drivers.is_empty() {
        return Ok(Vec::new());
    }

    let (intervals, results, stints) = tokio::try_join!(
        client.intervals(session_key),
        client.session_results(session_key),
        client.stints(session_key)
    )?;
    debug!(
        session_key,
        intervals = intervals.len(),
        results = results.len(),
        stints = stints.len(),
        "leaderboard inputs"
    );

    Ok(assemble_leaderboard(drivers, &intervals, &results, &stints))
}
