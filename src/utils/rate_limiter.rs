use std::sync::Arc;

use tokio::{
    sync::{Mutex, OwnedSemaphorePermit, Semaphore},
    time::{sleep, Duration, Instant},
};
use tracing::{debug, trace};

use crate::models::error::{Error, Result};

/// Bounds in-flight upstream requests and spaces their start times.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_start: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_delay: Duration) -> Self {
        RateLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_delay,
            last_start: Arc::new(Mutex::new(None)),
        }
    }

    /// The permit is released when the guard drops.
    pub async fn acquire(&self) -> Result<RateLimitGuard> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::RateLimiterClosed)?;

        if !self.min_delay.is_zero() {
            let mut last_start = self.last_start.lock().await;
            let wait = (*last_start).map(|last| self.min_delay.saturating_sub(last.elapsed()));
            if let Some(wait) = wait.filter(|w| !w.is_zero()) {
                debug!(?wait, "spacing upstream request");
                sleep(wait).await;
            }
            *last_start = Some(Instant::now());
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

impl Drop for RateLimitGuard {
    fn drop(&mut self) {
        trace!("request permit released");
    }
}
