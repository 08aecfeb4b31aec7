use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A run on one tyre set. `lap_end` is absent while the stint is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub driver_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stint_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tyre_age_at_start: Option<u32>,
}

impl Stint {
    /// Inclusive range check. An open-ended stint covers everything from
    /// `lap_start` on; a stint without `lap_start` covers nothing.
    pub fn covers(&self, lap: u32) -> bool {
        match (self.lap_start, self.lap_end) {
            (Some(start), Some(end)) => start <= lap && lap <= end,
            (Some(start), None) => lap >= start,
            (None, _) => false,
        }
    }
}

/// Stints per driver number, in upstream order.
pub fn group_by_driver(stints: &[Stint]) -> BTreeMap<u32, Vec<&Stint>> {
    let mut by_driver: BTreeMap<u32, Vec<&Stint>> = BTreeMap::new();
    for stint in stints {
        by_driver.entry(stint.driver_number).or_default().push(stint);
    }
    by_driver
}
