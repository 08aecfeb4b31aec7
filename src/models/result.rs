use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of one driver in one session, from `session_result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub driver_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_laps: Option<u32>,
    // Qualifying reports one entry per segment, so these stay untyped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_to_leader: Option<Value>,
    #[serde(default)]
    pub dnf: Option<bool>,
    #[serde(default)]
    pub dsq: Option<bool>,
    #[serde(default)]
    pub dns: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_key: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<u32>,
}

impl SessionResult {
    pub fn status_label(&self) -> Option<&'static str> {
        if self.dnf == Some(true) {
            Some("DNF")
        } else if self.dsq == Some(true) {
            Some("DSQ")
        } else {
            None
        }
    }
}
