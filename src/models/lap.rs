use serde::{Deserialize, Serialize};

/// One lap of one driver. Every measurement is optional: a gap in the feed
/// is "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver_number: u32,
    pub lap_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sector_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sector_2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sector_3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i1_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i2_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pit_out_lap: Option<bool>,
}
