use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{
    client::ResourceClient,
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        stint::group_by_driver,
        telemetry::{ChartRow, LapDetail, LapKey, Sectors, TelemetryView},
        Driver, Lap, Stint,
    },
    utils::policy::{resolve_speed, TYRE_AT_LAP},
};

/// Builds the per-lap chart and the (driver, lap) detail lookup.
///
/// A detail is recorded for every lap of every selected driver, with or
/// without a speed. Chart rows cover the union of lap numbers seen across
/// the selection; a driver missing a lap gets `None` in that row.
pub fn assemble_telemetry(drivers: &[Driver], laps: &[Lap], stints: &[Stint]) -> TelemetryView {
    let selected: BTreeMap<u32, &Driver> = drivers.iter().map(|d| (d.driver_number, d)).collect();
    let stints_by_driver = group_by_driver(stints);

    let mut details: BTreeMap<LapKey, LapDetail> = BTreeMap::new();
    let mut lap_numbers: BTreeSet<u32> = BTreeSet::new();

    for lap in laps {
        let Some(driver) = selected.get(&lap.driver_number) else {
            continue;
        };
        lap_numbers.insert(lap.lap_number);

        let compound = stints_by_driver
            .get(&lap.driver_number)
            .and_then(|driver_stints| TYRE_AT_LAP.resolve(driver_stints, Some(lap.lap_number)));

        details.insert(
            LapKey::new(lap.driver_number, lap.lap_number),
            LapDetail {
                driver: (*driver).clone(),
                lap: lap.lap_number,
                speed: resolve_speed(lap),
                compound,
                sectors: Sectors {
                    s1: lap.duration_sector_1,
                    s2: lap.duration_sector_2,
                    s3: lap.duration_sector_3,
                },
                lap_time: lap.lap_duration,
            },
        );
    }

    let chart = lap_numbers
        .into_iter()
        .map(|lap| ChartRow {
            lap,
            speeds: selected
                .keys()
                .map(|driver_number| {
                    let speed = details
                        .get(&LapKey::new(*driver_number, lap))
                        .and_then(|detail| detail.speed);
                    (*driver_number, speed)
                })
                .collect(),
        })
        .collect();

    TelemetryView { chart, details }
}

pub fn cache_key(session_key: Option<u32>, drivers: &[Driver]) -> CacheKey {
    CacheKey::new(ViewKind::Telemetry, session_key).with_drivers(drivers.iter().map(|d| d.driver_number))
}

pub async fn fetch_telemetry(
    client: &ResourceClient,
    session_key: Option<u32>,
    drivers: &[Driver],
    lap_ceiling: u32,
) -> Result<TelemetryView> {
    let Some(session_key) = session_key else {
        return Ok(TelemetryView::default());
    };
    if drivers.is_empty() {
        return Ok(TelemetryView::default());
    }

    let driver_numbers: Vec<u32> = drivers.iter().map(|d| d.driver_number).collect();
    let (laps, stints) = tokio::try_join!(
        client.laps(session_key, &driver_numbers, lap_ceiling),
        client.stints(session_key)
    )?;
    debug!(session_key, laps = laps.len(), stints = stints.len(), "telemetry inputs");

    Ok(assemble_telemetry(drivers, &laps, &stints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn driver(number: u32) -> Driver {
        Driver {
            driver_number: number,
            broadcast_name: None,
            name_acronym: Some(format!("D{number}")),
            full_name: None,
            team_name: None,
            team_colour: None,
            headshot_url: None,
        }
    }

    fn lap(driver: u32, number: u32, st: Option<f64>, i1: Option<f64>) -> Lap {
        Lap {
            driver_number: driver,
            lap_number: number,
            date_start: None,
            lap_duration: Some(95.5),
            duration_sector_1: Some(30.1),
            duration_sector_2: None,
            duration_sector_3: Some(33.0),
            i1_speed: i1,
            i2_speed: None,
            st_speed: st,
            is_pit_out_lap: None,
        }
    }

    fn stint(driver: u32, number: u32, compound: &str, start: u32, end: u32) -> Stint {
        Stint {
            driver_number: driver,
            stint_number: Some(number),
            compound: Some(compound.to_string()),
            lap_start: Some(start),
            lap_end: Some(end),
            tyre_age_at_start: None,
        }
    }

    #[test]
    fn missing_laps_are_gaps_not_zero() {
        let drivers = vec![driver(1), driver(16)];
        let laps = vec![
            lap(1, 1, Some(310.0), None),
            lap(1, 2, Some(312.0), None),
            lap(16, 2, None, Some(280.0)),
            lap(16, 3, None, None),
        ];

        let view = assemble_telemetry(&drivers, &laps, &[]);

        let lap_numbers: Vec<u32> = view.chart.iter().map(|r| r.lap).collect();
        assert_eq!(lap_numbers, vec![1, 2, 3]);
        assert_eq!(view.chart[0].speed(1), Some(310.0));
        assert_eq!(view.chart[0].speed(16), None);
        assert!(view.chart[0].speeds.contains_key(&16));
        assert_eq!(view.chart[1].speed(16), Some(280.0));
        assert_eq!(view.chart[2].speed(1), None);
    }

    #[test]
    fn details_exist_without_speed() {
        let drivers = vec![driver(16)];
        let laps = vec![lap(16, 3, None, None)];
        let stints = vec![stint(16, 1, "INTERMEDIATE", 1, 10)];

        let view = assemble_telemetry(&drivers, &laps, &stints);

        let detail = view.detail(16, 3).unwrap();
        assert_eq!(detail.speed, None);
        assert_eq!(detail.compound.as_deref(), Some("INTERMEDIATE"));
        assert_eq!(detail.sectors.s1, Some(30.1));
        assert_eq!(detail.sectors.s2, None);
        assert_eq!(detail.lap_time, Some(95.5));
    }

    #[test]
    fn compound_is_absent_between_stints() {
        let drivers = vec![driver(1)];
        let laps = vec![lap(1, 19, Some(300.0), None), lap(1, 20, Some(301.0), None)];
        let stints = vec![stint(1, 1, "SOFT", 1, 18), stint(1, 2, "HARD", 20, 50)];

        let view = assemble_telemetry(&drivers, &laps, &stints);

        assert_eq!(view.detail(1, 19).unwrap().compound, None);
        assert_eq!(view.detail(1, 20).unwrap().compound.as_deref(), Some("HARD"));
    }

    #[test]
    fn unselected_drivers_are_ignored() {
        let view = assemble_telemetry(&[driver(1)], &[lap(44, 1, Some(300.0), None)], &[]);
        assert!(view.is_empty());
    }

    proptest! {
        #[test]
        fn chart_laps_are_the_sorted_union(
            raw in proptest::collection::vec((1u32..4, 1u32..30), 0..60)
        ) {
            let drivers: Vec<Driver> = (1..4).map(driver).collect();
            let laps: Vec<Lap> = raw.iter().map(|(d, n)| lap(*d, *n, Some(300.0), None)).collect();
            let view = assemble_telemetry(&drivers, &laps, &[]);

            let expected: Vec<u32> = raw.iter().map(|(_, n)| *n).collect::<BTreeSet<_>>().into_iter().collect();
            let actual: Vec<u32> = view.chart.iter().map(|r| r.lap).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
