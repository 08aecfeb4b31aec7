//! Typed access to the upstream timing API, with 429 backoff on the primary
//! host and a single fallback request against the mirror.

mod query;
mod resources;
mod transport;

use std::{fmt, sync::Arc};

use http::StatusCode;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

pub use query::{QueryParams, QueryValue};
pub use resources::{DEFAULT_LAP_CEILING, FALLBACK_SEARCH_WINDOW};
pub use transport::{HttpTransport, Transport, TransportResponse, Unreachable};

use crate::{
    models::error::{Error, Result},
    utils::{config::Config, rate_limiter::RateLimiter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Sessions,
    Drivers,
    Laps,
    Intervals,
    Stints,
    Meetings,
    SessionResult,
}

impl Resource {
    pub fn as_path(&self) -> &'static str {
        match self {
            Resource::Sessions => "sessions",
            Resource::Drivers => "drivers",
            Resource::Laps => "laps",
            Resource::Intervals => "intervals",
            Resource::Stints => "stints",
            Resource::Meetings => "meetings",
            Resource::SessionResult => "session_result",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Outcome of talking to one endpoint.
enum Attempt {
    Body(String),
    Failed(Option<StatusCode>),
}

#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
    limiter: RateLimiter,
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new(reqwest::Client::new())))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let limiter = RateLimiter::new(config.max_concurrent_requests, config.min_request_spacing);
        Self {
            transport,
            config: Arc::new(config),
            limiter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One logical request. Records come back exactly as the upstream sent
    /// them: missing fields stay `None` in the target type.
    pub async fn request<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: &QueryParams,
    ) -> Result<Vec<T>> {
        let url = build_url(&self.config.primary_base_url, resource, params)?;
        let body = match self.fetch_with_backoff(resource, &url).await? {
            Attempt::Body(body) => body,
            Attempt::Failed(primary) => {
                let Some(fallback_base) = self.config.fallback_base_url.as_deref() else {
                    return Err(Error::Transport {
                        resource,
                        primary,
                        fallback: None,
                    });
                };
                warn!(%resource, ?primary, "primary endpoint failed, trying fallback");
                let fallback_url = build_url(fallback_base, resource, params)?;
                match self.fetch_once(resource, &fallback_url).await? {
                    Attempt::Body(body) => body,
                    Attempt::Failed(fallback) => {
                        return Err(Error::Transport {
                            resource,
                            primary,
                            fallback,
                        })
                    }
                }
            }
        };

        let records: Vec<T> =
            serde_json::from_str(&body).map_err(|source| Error::Decode { resource, source })?;
        debug!(%resource, count = records.len(), "request complete");
        Ok(records)
    }

    async fn fetch_with_backoff(&self, resource: Resource, url: &Url) -> Result<Attempt> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(resource, url).await? {
                Attempt::Failed(Some(StatusCode::TOO_MANY_REQUESTS))
                    if attempt < self.config.max_retries =>
                {
                    let delay = self.config.backoff_for(attempt);
                    warn!(%resource, attempt, ?delay, "rate limited, backing off");
                    sleep(delay).await;
                    attempt += 1;
                }
                outcome => return Ok(outcome),
            }
        }
    }

    async fn fetch_once(&self, resource: Resource, url: &Url) -> Result<Attempt> {
        let _permit = self.limiter.acquire().await?;
        debug!(%resource, %url, "GET");
        match self.transport.get(url).await {
            Ok(res) if res.status.is_success() => Ok(Attempt::Body(res.body)),
            Ok(res) => Ok(Attempt::Failed(Some(res.status))),
            Err(err) => {
                warn!(%resource, %url, error = %err, "endpoint unreachable");
                Ok(Attempt::Failed(None))
            }
        }
    }
}

fn build_url(base: &str, resource: Resource, params: &QueryParams) -> Result<Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), resource.as_path());
    let mut url = Url::parse(&raw).map_err(|e| Error::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    params.apply(&mut url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use std::time::Duration;
    use tokio::time::Instant;

    const MIRROR: &str = "https://mirror.example/v1";

    fn client(fake: &Arc<ScriptedTransport>, fallback: Option<&str>) -> ResourceClient {
        let config = Config::default().with_fallback(fallback.map(str::to_string));
        ResourceClient::with_transport(config, fake.clone())
    }

    #[test]
    fn url_joins_base_and_path() {
        let url = build_url(
            "https://api.openf1.org/v1/",
            Resource::SessionResult,
            &QueryParams::new().param("session_key", 9158u32),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.openf1.org/v1/session_result?session_key=9158");
        assert!(build_url("not a url", Resource::Laps, &QueryParams::new()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_429_with_exponential_backoff() {
        let fake = Arc::new(ScriptedTransport::new());
        fake.push_status(429);
        fake.push_status(429);
        fake.push_json(r#"[{"driver_number": 1}]"#);

        let started = Instant::now();
        let rows: Vec<serde_json::Value> = client(&fake, Some(MIRROR))
            .request(Resource::Drivers, &QueryParams::new().param("session_key", 1u32))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
        let urls = fake.requested_urls();
        assert_eq!(urls.len(), 3);
        assert!(urls.iter().all(|u| u.starts_with("https://api.openf1.org/v1/drivers")));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_hit_the_mirror_once() {
        let fake = Arc::new(ScriptedTransport::new());
        for _ in 0..4 {
            fake.push_status(429);
        }
        fake.push_status(503);

        let started = Instant::now();
        let err = client(&fake, Some(MIRROR))
            .request::<serde_json::Value>(Resource::Laps, &QueryParams::new())
            .await
            .unwrap_err();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(7) && waited < Duration::from_secs(8));
        match err {
            Error::Transport {
                resource,
                primary,
                fallback,
            } => {
                assert_eq!(resource, Resource::Laps);
                assert_eq!(primary, Some(StatusCode::TOO_MANY_REQUESTS));
                assert_eq!(fallback, Some(StatusCode::SERVICE_UNAVAILABLE));
            }
            other => panic!("unexpected error {other:?}"),
        }
        let urls = fake.requested_urls();
        assert_eq!(urls.len(), 5);
        assert!(urls[4].starts_with(MIRROR));
    }

    #[tokio::test]
    async fn server_error_goes_straight_to_fallback() {
        let fake = Arc::new(ScriptedTransport::new());
        fake.push_status(500);
        fake.push_json(r#"[{"session_key": 7, "meeting_key": 3}]"#);

        let sessions: Vec<crate::models::Session> = client(&fake, Some(MIRROR))
            .request(Resource::Sessions, &QueryParams::new().param("session_key", "latest"))
            .await
            .unwrap();

        assert_eq!(sessions[0].session_key, 7);
        let urls = fake.requested_urls();
        assert_eq!(
            urls,
            vec![
                "https://api.openf1.org/v1/sessions?session_key=latest".to_string(),
                "https://mirror.example/v1/sessions?session_key=latest".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn no_fallback_configured() {
        let fake = Arc::new(ScriptedTransport::new());
        fake.push_status(502);

        let err = client(&fake, None)
            .request::<serde_json::Value>(Resource::Stints, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                primary: Some(StatusCode::BAD_GATEWAY),
                fallback: None,
                ..
            }
        ));
        assert_eq!(fake.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_primary_reports_no_status() {
        let fake = Arc::new(ScriptedTransport::new());
        fake.push_unreachable("connection reset");
        fake.push_unreachable("connection reset");

        let err = client(&fake, Some(MIRROR))
            .request::<serde_json::Value>(Resource::Intervals, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                primary: None,
                fallback: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let fake = Arc::new(ScriptedTransport::new());
        fake.push_json("<html>oops</html>");

        let err = client(&fake, None)
            .request::<serde_json::Value>(Resource::Meetings, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { resource: Resource::Meetings, .. }));
    }
}
