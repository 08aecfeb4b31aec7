use std::time::Duration;

pub const OPENF1_BASE_URL: &str = "https://api.openf1.org/v1";
pub const FALLBACK_URL_VAR: &str = "OPENF1_FALLBACK_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub primary_base_url: String,
    /// Mirror with the same schema. `None` disables the fallback request.
    pub fallback_base_url: Option<String>,
    /// Extra attempts after an HTTP 429, waiting `backoff_base * 2^attempt`.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_concurrent_requests: usize,
    pub min_request_spacing: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            primary_base_url: OPENF1_BASE_URL.to_string(),
            fallback_base_url: None,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_concurrent_requests: 6,
            min_request_spacing: Duration::ZERO,
        }
    }
}

impl Config {
    /// Reads the optional fallback mirror from the environment (or `.env`).
    pub fn init() -> Self {
        dotenv::dotenv().ok();
        Config::default().with_fallback(std::env::var(FALLBACK_URL_VAR).ok())
    }

    pub fn with_primary(mut self, url: impl Into<String>) -> Self {
        self.primary_base_url = url.into();
        self
    }

    /// Blank values count as "not configured".
    pub fn with_fallback(mut self, url: Option<String>) -> Self {
        self.fallback_base_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_concurrency(mut self, max_concurrent: usize, min_spacing: Duration) -> Self {
        self.max_concurrent_requests = max_concurrent.max(1);
        self.min_request_spacing = min_spacing;
        self
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

/// How often the orchestrator re-runs an assembler for one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    Every(Duration),
    Disabled,
}

impl RefreshPolicy {
    pub const SESSION: RefreshPolicy = RefreshPolicy::Every(Duration::from_secs(60));
    pub const DRIVERS: RefreshPolicy = RefreshPolicy::Every(Duration::from_secs(120));
    pub const LEADERBOARD: RefreshPolicy = RefreshPolicy::Every(Duration::from_secs(5));
    pub const TELEMETRY: RefreshPolicy = RefreshPolicy::Every(Duration::from_secs(15));
    pub const STATS: RefreshPolicy = RefreshPolicy::Every(Duration::from_secs(30));
    pub const ARCHIVE: RefreshPolicy = RefreshPolicy::Disabled;

    /// Live views stop polling once the dashboard shows a finished session.
    pub fn live_or_archived(self, is_fallback: bool) -> RefreshPolicy {
        if is_fallback {
            RefreshPolicy::Disabled
        } else {
            self
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            RefreshPolicy::Every(period) => Some(*period),
            RefreshPolicy::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fallback_is_disabled() {
        assert_eq!(Config::default().with_fallback(Some("  ".into())).fallback_base_url, None);
        assert_eq!(
            Config::default()
                .with_fallback(Some("https://mirror.example".into()))
                .fallback_base_url
                .as_deref(),
            Some("https://mirror.example")
        );
    }

    #[test]
    fn backoff_doubles() {
        let config = Config::default();
        assert_eq!(config.backoff_for(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for(2), Duration::from_secs(4));
    }

    #[test]
    fn fallback_views_stop_polling() {
        assert_eq!(RefreshPolicy::LEADERBOARD.live_or_archived(true), RefreshPolicy::Disabled);
        assert_eq!(
            RefreshPolicy::LEADERBOARD.live_or_archived(false).interval(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(RefreshPolicy::ARCHIVE.interval(), None);
    }
}
