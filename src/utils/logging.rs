use tracing::Level;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

pub fn parse_level(raw: &str) -> Level {
    match raw.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Installs a fmt subscriber: this crate at `level`, everything else at INFO.
/// Returns false when a global subscriber was already set.
pub fn init_tracing(level: Level) -> bool {
    let filter = filter::Targets::new()
        .with_target(env!("CARGO_PKG_NAME"), level)
        .with_target("reqwest", Level::WARN)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default()
        .with(tracing_layer)
        .with(filter)
        .try_init()
        .is_ok()
}
