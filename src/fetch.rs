//! Page fetching with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: core trait, fetch one URL and return the page body
//! - [`HttpFetcher`]: `reqwest` implementation
//! - [`RetryFetch`]: decorator adding retries to any `FetchAsync`
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::CrawlSettings;
use rand::{rng, Rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL after redirects.
    pub url: String,
    pub body: String,
}

/// Trait for async page fetching.
pub trait FetchAsync {
    /// Fetch `url`. HTTP error statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Page, Box<dyn Error>>;
}

/// Plain HTTP fetcher built from [`CrawlSettings`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &CrawlSettings) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Page, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            %final_url,
            "Fetched page"
        );
        Ok(Page {
            url: final_url,
            body,
        })
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`].
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.base_delay.saturating_mul(1 << shift).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Page, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + Duration::from_millis(jitter_ms);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails `failures` times, then serves a fixed body.
    struct Flaky {
        failures: usize,
        calls: Cell<usize>,
    }

    impl FetchAsync for Flaky {
        async fn fetch(&self, url: &str) -> Result<Page, Box<dyn Error>> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call <= self.failures {
                Err(format!("transient failure {call}").into())
            } else {
                Ok(Page {
                    url: url.to_string(),
                    body: "<html></html>".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let fetcher = RetryFetch::new(
            Flaky {
                failures: 2,
                calls: Cell::new(0),
            },
            3,
            Duration::from_millis(1),
        );
        let page = fetcher.fetch("https://example.org/").await.unwrap();
        assert_eq!(page.body, "<html></html>");
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let fetcher = RetryFetch::new(
            Flaky {
                failures: 10,
                calls: Cell::new(0),
            },
            2,
            Duration::from_millis(1),
        );
        assert!(fetcher.fetch("https://example.org/").await.is_err());
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let fetcher = RetryFetch::new(
            Flaky {
                failures: 0,
                calls: Cell::new(0),
            },
            5,
            Duration::from_secs(1),
        );
        assert_eq!(fetcher.backoff(1), Duration::from_secs(1));
        assert_eq!(fetcher.backoff(3), Duration::from_secs(4));
        assert_eq!(fetcher.backoff(10), Duration::from_secs(30));
    }
}
