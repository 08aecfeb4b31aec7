use async_trait::async_trait;
use http::{header::ACCEPT, StatusCode};
use reqwest::{Client, Url};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

/// No HTTP response at all (DNS, TLS, connection reset, body read).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Unreachable(pub String);

/// The HTTP seam of the resource client. Production uses [`HttpTransport`];
/// tests script responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse, Unreachable>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, Unreachable> {
        let res = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Unreachable(e.to_string()))?;
        let status = res.status();
        let body = res.text().await.map_err(|e| Unreachable(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}
