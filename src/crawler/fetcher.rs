//! Page retrieval for the crawler
//!
//! The controller only needs "URL in, HTML out"; [`PageFetcher`] is that seam.
//! [`HttpFetcher`] is the production implementation: a `reqwest` client with a
//! transport timeout, behind a `governor` limiter that caps the request rate
//! regardless of the pacing configured on the controller.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use tracing::{debug, debug_span, instrument, Instrument};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Retrieves the HTML body of a page
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, CrawlError>> + Send;
}

/// Rate-limited HTTP fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl HttpFetcher {
    /// Build a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            limiter: Arc::new(limiter),
        })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched {}", url);
        Ok(body)
    }
}
