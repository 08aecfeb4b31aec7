use serde::Serialize;

use crate::models::{driver::Driver, stint::Stint, telemetry::Sectors};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStats {
    pub driver: Driver,
    pub pit_stops: u32,
    pub average_lap_time: Option<f64>,
    pub fastest_lap: Option<f64>,
    pub fastest_sectors: Sectors,
    pub top_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StintSummary {
    pub stint_number: Option<u32>,
    pub compound: Option<String>,
    pub laps_label: String,
    pub tyre_age_at_start: Option<u32>,
}

/// The stints of one driver, in stint order, ready for a strategy panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StintGroup {
    pub driver_number: u32,
    pub driver_name: String,
    pub stints: Vec<StintSummary>,
}

impl StintSummary {
    pub fn from_stint(stint: &Stint) -> Self {
        let start = stint
            .lap_start
            .map(|lap| lap.to_string())
            .unwrap_or_else(|| "?".to_string());
        let end = stint
            .lap_end
            .map(|lap| lap.to_string())
            .unwrap_or_else(|| "now".to_string());
        Self {
            stint_number: stint.stint_number,
            compound: stint.compound.clone(),
            laps_label: format!("Laps {start} – {end}"),
            tyre_age_at_start: stint.tyre_age_at_start,
        }
    }
}
