use serde::Serialize;

use crate::models::driver::Driver;

/// Position used for drivers without a classification, so they sort last.
pub const UNCLASSIFIED_POSITION: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub position: u32,
    pub driver: Driver,
    pub gap_label: String,
    pub interval_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_laps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}
