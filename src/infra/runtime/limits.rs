use std::future::Future;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// Build a reqwest client with short connect/request timeouts.
pub fn make_http_client() -> Result<reqwest::Client, reqwest::Error> {
    make_http_client_with(CONNECT_TIMEOUT, REQUEST_TIMEOUT)
}

pub fn make_http_client_with(
    connect: Duration,
    request: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(connect)
        .timeout(request)
        .build()
}

/// Exponential backoff: `retries` extra attempts, delay doubling up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_retries(2)
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }

    /// Delay before attempt `n` (attempt 0 runs immediately).
    pub fn delay_before(&self, n: u32) -> Duration {
        if n == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(n - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` until it succeeds or the policy is exhausted; returns the last error.
pub async fn retry_async<T, E, Fut, F>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= policy.retries => return Err(e),
            Err(_) => {
                attempt += 1;
                tracing::debug!(attempt, "retrying");
                tokio::time::sleep(policy.delay_before(attempt)).await;
            }
        }
    }
}
