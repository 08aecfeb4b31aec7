use crate::models::interval::GapValue;

pub const MISSING: &str = "--";

/// `--` when absent, labels pass through, seconds get an explicit sign and
/// three decimals.
pub fn format_gap(value: Option<&GapValue>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(GapValue::Label(label)) => label.clone(),
        Some(GapValue::Seconds(seconds)) if !seconds.is_finite() => MISSING.to_string(),
        Some(GapValue::Seconds(seconds)) if *seconds > 0.0 => format!("+{seconds:.3}"),
        Some(GapValue::Seconds(seconds)) => format!("{seconds:.3}"),
    }
}

/// `m:ss.mmm`
pub fn format_lap_time(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite() && *s >= 0.0) else {
        return MISSING.to_string();
    };
    let total_ms = (seconds * 1000.0).round() as u64;
    let mins = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{mins}:{secs:02}.{ms:03}")
}

pub fn format_seconds(seconds: Option<f64>) -> String {
    match seconds.filter(|s| s.is_finite()) {
        Some(seconds) => format!("{seconds:.3}s"),
        None => MISSING.to_string(),
    }
}
