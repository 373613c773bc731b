use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FplError, FplResult};
use crate::http_client::{HttpResponse, Transport};

const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Retry applies to transport failures only; HTTP statuses are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(5),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            initial_delay: delay,
            max_delay: delay,
            max_elapsed: None,
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Like `delay_for`, but never sleeping past `max_elapsed`.
    pub fn delay_within(&self, attempt: u32, elapsed: Duration) -> Duration {
        let delay = self.delay_for(attempt);
        match self.max_elapsed {
            Some(limit) => delay.min(limit.saturating_sub(elapsed)),
            None => delay,
        }
    }

    pub fn allows_another(&self, attempts_made: u32, elapsed: Duration) -> bool {
        let under_attempts = self.max_attempts.is_none_or(|max| attempts_made < max);
        let under_deadline = self.max_elapsed.is_none_or(|limit| elapsed < limit);
        under_attempts && under_deadline
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Fetcher<T: Transport> {
    transport: T,
    api_base: String,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, api_base: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            retry,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `path` is relative to the api base, e.g. `/bootstrap-static/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub fn fetch_body(&self, path: &str) -> FplResult<String> {
        let url = self.url_for(path);
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FplError::Cancelled { url });
            }
            attempts += 1;
            debug!(url = %url, attempt = attempts, "GET");
            match self.transport.get(&url) {
                Ok(resp) => return classify(&url, resp),
                Err(failure) => {
                    if !self.retry.allows_another(attempts, started.elapsed()) {
                        return Err(FplError::Transport {
                            url,
                            attempts,
                            message: failure.to_string(),
                        });
                    }
                    let delay = self.retry.delay_within(attempts, started.elapsed());
                    warn!(
                        url = %url,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "transport failure, retrying"
                    );
                    self.pause(delay, &url)?;
                }
            }
        }
    }

    pub fn fetch_json(&self, path: &str) -> FplResult<Value> {
        let body = self.fetch_body(path)?;
        serde_json::from_str(&body).map_err(|err| FplError::malformed("json", err))
    }

    fn pause(&self, delay: Duration, url: &str) -> FplResult<()> {
        let until = Instant::now() + delay;
        loop {
            if self.cancel.is_cancelled() {
                return Err(FplError::Cancelled {
                    url: url.to_string(),
                });
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            thread::sleep((until - now).min(CANCEL_POLL));
        }
    }
}

fn classify(url: &str, resp: HttpResponse) -> FplResult<String> {
    if resp.is_success() {
        return Ok(resp.body);
    }
    if resp.status == 503 {
        return Err(FplError::ServiceUnavailable {
            url: url.to_string(),
        });
    }
    Err(FplError::Upstream {
        url: url.to_string(),
        status: resp.status,
    })
}
