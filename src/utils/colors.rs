use crate::models::driver::Driver;

const DRIVER_PALETTE: [&str; 15] = [
    "#f87171", "#22d3ee", "#facc15", "#a855f7", "#34d399", "#f97316", "#60a5fa", "#fcd34d",
    "#fb7185", "#38bdf8", "#f472b6", "#4ade80", "#c084fc", "#fbbf24", "#ef4444",
];

const UNKNOWN_TYRE: &str = "#6b7280";

pub fn driver_color(driver: &Driver) -> String {
    match driver.team_colour.as_deref().filter(|c| !c.is_empty()) {
        Some(colour) => format!("#{}", colour.trim_start_matches('#')),
        None => DRIVER_PALETTE[driver.driver_number as usize % DRIVER_PALETTE.len()].to_string(),
    }
}

pub fn tyre_color(compound: Option<&str>) -> &'static str {
    match compound.map(|c| c.to_uppercase()).as_deref() {
        Some("SOFT") => "#ff4d6d",
        Some("MEDIUM") => "#f5b301",
        Some("HARD") => "#9ca3af",
        Some("INTERMEDIATE") => "#22c55e",
        Some("WET") => "#0ea5e9",
        _ => UNKNOWN_TYRE,
    }
}
