use tracing::debug;

use crate::{
    client::ResourceClient,
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        stats::DriverStats,
        telemetry::Sectors,
        Driver, Lap, Stint,
    },
    utils::policy::resolve_speed,
};

fn min_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| v.is_finite()).reduce(f64::min)
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| v.is_finite()).reduce(f64::max)
}

pub fn driver_stats(driver: &Driver, laps: &[Lap], stints: &[Stint]) -> DriverStats {
    let own_laps: Vec<&Lap> = laps
        .iter()
        .filter(|lap| lap.driver_number == driver.driver_number)
        .collect();
    let stint_count = stints
        .iter()
        .filter(|stint| stint.driver_number == driver.driver_number)
        .count();

    // Out-laps include the pit lane and would skew both figures.
    let timed: Vec<f64> = own_laps
        .iter()
        .filter(|lap| lap.is_pit_out_lap != Some(true))
        .filter_map(|lap| lap.lap_duration)
        .filter(|t| t.is_finite() && *t > 0.0)
        .collect();
    let average_lap_time = if timed.is_empty() {
        None
    } else {
        Some(timed.iter().sum::<f64>() / timed.len() as f64)
    };

    DriverStats {
        driver: driver.clone(),
        pit_stops: stint_count.saturating_sub(1) as u32,
        average_lap_time,
        fastest_lap: min_of(timed.iter().copied()),
        fastest_sectors: Sectors {
            s1: min_of(own_laps.iter().filter_map(|l| l.duration_sector_1)),
            s2: min_of(own_laps.iter().filter_map(|l| l.duration_sector_2)),
            s3: min_of(own_laps.iter().filter_map(|l| l.duration_sector_3)),
        },
        top_speed: max_of(own_laps.iter().filter_map(|l| resolve_speed(l))),
    }
}

pub fn assemble_stats(drivers: &[Driver], laps: &[Lap], stints: &[Stint]) -> Vec<DriverStats> {
    drivers.iter().map(|driver| driver_stats(driver, laps, stints)).collect()
}

pub fn cache_key(session_key: Option<u32>, drivers: &[Driver]) -> CacheKey {
    CacheKey::new(ViewKind::Stats, session_key).with_drivers(drivers.iter().map(|d| d.driver_number))
}

pub async fn fetch_stats(
    client: &ResourceClient,
    session_key: Option<u32>,
    drivers: &[Driver],
    lap_ceiling: u32,
) -> Result<Vec<DriverStats>> {
    let Some(session_key) = session_key else {
        return Ok(Vec::new());
    };
    if drivers.is_empty() {
        return Ok(Vec::new());
    }

    let driver_numbers: Vec<u32> = drivers.iter().map(|d| d.driver_number).collect();
    let (laps, stints) = tokio::try_join!(
        client.laps(session_key, &driver_numbers, lap_ceiling),
        client.stints(session_key)
    )?;
    debug!(session_key, laps = laps.len(), stints = stints.len(), "stats inputs");

    Ok(assemble_stats(drivers, &laps, &stints))
}
