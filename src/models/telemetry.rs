use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::driver::Driver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LapKey {
    pub driver_number: u32,
    pub lap_number: u32,
}

impl LapKey {
    pub fn new(driver_number: u32, lap_number: u32) -> Self {
        Self {
            driver_number,
            lap_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sectors {
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapDetail {
    pub driver: Driver,
    pub lap: u32,
    pub speed: Option<f64>,
    pub compound: Option<String>,
    pub sectors: Sectors,
    pub lap_time: Option<f64>,
}

/// One chart row per lap. Every selected driver has a column; `None` is a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub lap: u32,
    pub speeds: BTreeMap<u32, Option<f64>>,
}

impl ChartRow {
    pub fn speed(&self, driver_number: u32) -> Option<f64> {
        self.speeds.get(&driver_number).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryView {
    pub chart: Vec<ChartRow>,
    pub details: BTreeMap<LapKey, LapDetail>,
}

impl TelemetryView {
    pub fn detail(&self, driver_number: u32, lap_number: u32) -> Option<&LapDetail> {
        self.details.get(&LapKey::new(driver_number, lap_number))
    }

    pub fn is_empty(&self) -> bool {
        self.chart.is_empty() && self.details.is_empty()
    }
}
