use std::collections::HashMap;

use crate::{
    client::ResourceClient,
    models::{
        cache::{CacheKey, ViewKind},
        error::Result,
        stats::{StintGroup, StintSummary},
        stint::group_by_driver,
        Driver, Stint,
    },
};

/// Stints grouped per driver in stint order. An empty filter keeps everyone.
pub fn group_stints(stints: &[Stint], drivers: &[Driver], driver_filter: &[u32]) -> Vec<StintGroup> {
    let names: HashMap<u32, &Driver> = drivers.iter().map(|d| (d.driver_number, d)).collect();

    group_by_driver(stints)
        .into_iter()
        .filter(|(driver_number, _)| driver_filter.is_empty() || driver_filter.contains(driver_number))
        .map(|(driver_number, mut driver_stints)| {
            driver_stints.sort_by_key(|stint| stint.stint_number.unwrap_or(0));
            StintGroup {
                driver_number,
                driver_name: names
                    .get(&driver_number)
                    .map(|d| d.display_name())
                    .unwrap_or_else(|| format!("Driver {driver_number}")),
                stints: driver_stints.into_iter().map(StintSummary::from_stint).collect(),
            }
        })
        .collect()
}

pub fn cache_key(session_key: Option<u32>) -> CacheKey {
    CacheKey::new(ViewKind::Stints, session_key)
}

pub async fn fetch_stints(client: &ResourceClient, session_key: Option<u32>) -> Result<Vec<Stint>> {
    match session_key {
        Some(session_key) => client.stints(session_key).await,
        None => Ok(Vec::new()),
    }
}
