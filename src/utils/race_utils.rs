use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const RACE_SESSION_TYPE: &str = "Race";

/// Upstream timestamps are RFC 3339; a few older records drop the offset,
/// and meeting dates can be bare days. Those are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn is_testing_event(meeting_name: Option<&str>) -> bool {
    meeting_name
        .map(|name| name.to_lowercase().contains("testing"))
        .unwrap_or(false)
}
