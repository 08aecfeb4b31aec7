use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::race_utils::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceMeeting {
    pub meeting_key: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_official_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl RaceMeeting {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.date_start.as_deref().and_then(parse_timestamp)
    }
}

/// Archive search: season, free-text circuit search, participating driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MeetingFilters {
    pub year: Option<i32>,
    pub circuit: Option<String>,
    pub driver_number: Option<u32>,
}

impl MeetingFilters {
    pub fn for_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    /// Trimmed, lower-cased search text; `None` when blank.
    pub fn circuit_search(&self) -> Option<String> {
        self.circuit
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }

    pub fn normalized(&self) -> Self {
        Self {
            year: self.year,
            circuit: self.circuit_search(),
            driver_number: self.driver_number,
        }
    }
}
