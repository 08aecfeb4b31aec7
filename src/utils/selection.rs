use crate::models::driver::Driver;

pub const MAX_SELECTED_DRIVERS: usize = 2;

/// Deselects a selected driver; otherwise adds it, evicting the oldest
/// selections once `max` is reached.
pub fn toggle_driver(selected: &[u32], driver_number: u32, max: usize) -> Vec<u32> {
    if selected.contains(&driver_number) {
        return selected
            .iter()
            .copied()
            .filter(|n| *n != driver_number)
            .collect();
    }
    if max == 0 {
        return Vec::new();
    }
    let keep_from = (selected.len() + 1).saturating_sub(max);
    let mut next: Vec<u32> = selected[keep_from..].to_vec();
    next.push(driver_number);
    next
}

pub fn default_selection(drivers: &[Driver], max: usize) -> Vec<u32> {
    drivers.iter().take(max).map(|d| d.driver_number).collect()
}
