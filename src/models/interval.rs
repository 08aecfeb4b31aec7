use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::race_utils::parse_timestamp;

/// Gap values arrive either as seconds or as a label such as `"+1 LAP"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GapValue {
    Seconds(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub driver_number: u32,
    #[serde(default)]
    pub gap_to_leader: Option<GapValue>,
    #[serde(default)]
    pub interval: Option<GapValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_key: Option<u32>,
}

impl Interval {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_timestamp)
    }
}
