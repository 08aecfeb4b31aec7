use http::StatusCode;
use thiserror::Error;

use crate::client::Resource;

#[derive(Debug, Error)]
pub enum Error {
    /// Both endpoints failed, or the primary failed with no fallback configured.
    /// `None` means no HTTP response was received from that endpoint.
    #[error("{resource} request failed: primary {} / fallback {}", status_label(.primary), status_label(.fallback))]
    Transport {
        resource: Resource,
        primary: Option<StatusCode>,
        fallback: Option<StatusCode>,
    },
    #[error("could not decode {resource} response: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid base url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("rate limiter closed")]
    RateLimiterClosed,
    #[error("request task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

fn status_label(status: &Option<StatusCode>) -> String {
    match status {
        Some(code) => code.as_u16().to_string(),
        None => "unavailable".to_string(),
    }
}

impl Error {
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_carries_both_statuses() {
        let err = Error::Transport {
            resource: Resource::Laps,
            primary: Some(StatusCode::BAD_GATEWAY),
            fallback: None,
        };
        assert_eq!(
            err.to_string(),
            "laps request failed: primary 502 / fallback unavailable"
        );
        assert!(err.is_transport());
    }
}
