//! A scripted [`Transport`] for exercising the client and assemblers without
//! network access.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Url;

use crate::client::{Transport, TransportResponse, Unreachable};

type Scripted = Result<TransportResponse, Unreachable>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Routes (substring match on the full URL, reusable, first match wins) are
/// consulted before the one-shot queue. Anything unmatched gets a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, TransportResponse)>>,
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn route(&self, url_fragment: &str, body: &str) {
        self.route_status(url_fragment, 200, body);
    }

    pub fn route_status(&self, url_fragment: &str, status: u16, body: &str) {
        lock(&self.routes).push((
            url_fragment.to_string(),
            TransportResponse {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body: body.to_string(),
            },
        ));
    }

    /// Every later response is held back by `delay` (tokio time, so paused
    /// clocks advance through it).
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn clear_routes(&self) {
        lock(&self.routes).clear();
    }

    pub fn push_json(&self, body: &str) {
        self.push(Ok(TransportResponse {
            status: StatusCode::OK,
            body: body.to_string(),
        }));
    }

    pub fn push_status(&self, status: u16) {
        self.push(Ok(TransportResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: String::new(),
        }));
    }

    pub fn push_unreachable(&self, reason: &str) {
        self.push(Err(Unreachable(reason.to_string())));
    }

    fn push(&self, response: Scripted) {
        lock(&self.queue).push_back(response);
    }

    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self, url_fragment: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|url| url.contains(url_fragment))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, Unreachable> {
        let url = url.as_str().to_string();
        lock(&self.requests).push(url.clone());
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let routed = lock(&self.routes)
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone());
        if let Some(response) = routed {
            return Ok(response);
        }

        lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(TransportResponse {
                    status: StatusCode::NOT_FOUND,
                    body: String::new(),
                })
            })
    }
}
