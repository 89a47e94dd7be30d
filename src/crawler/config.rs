//! # Crawler Configuration Module
//!
//! Configuration for the register crawl: endpoint templates, markup selectors,
//! the pagination ceiling, pacing, and the historical epoch. It uses a builder
//! pattern; every default is a named constant.
//!
//! URL templates use placeholders:
//!
//! - listing: `{page}`, `{from}`, `{to}` (dates as URL-encoded `dd/mm/yyyy`)
//! - information: `{application_number}` (URL-encoded)

use std::time::Duration;

use chrono::NaiveDate;

use crate::address::NormalizerConfig;
use crate::crawler::listing::ListingSelectors;

/// Search results for a date range, one page at a time
pub const DEFAULT_LISTING_URL_TEMPLATE: &str = "https://yorke.sa.gov.au/development/development-applications-register/page/{page}/?date_from={from}&date_to={to}";

/// Stable per-application URL stored as the information URL
pub const DEFAULT_INFORMATION_URL_TEMPLATE: &str =
    "https://yorke.sa.gov.au/development/development-applications-register/?application={application_number}";

/// Fixed endpoint for public comments
pub const DEFAULT_COMMENT_URL: &str = "mailto:admin@yorke.sa.gov.au";

/// Safety bound on listing pages fetched per window
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Lower bound of the randomized pause between requests
pub const DEFAULT_MIN_DELAY_MS: u64 = 1_000;

/// Upper bound of the randomized pause between requests
pub const DEFAULT_MAX_DELAY_MS: u64 = 3_000;

/// Hard ceiling on request rate, independent of the pause
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

/// Transport-level timeout for one request
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Earliest lodgement date known on the register
pub const DEFAULT_EPOCH: (i32, u32, u32) = (2007, 1, 1);

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Listing URL template
    pub listing_url_template: String,

    /// Information URL template
    pub information_url_template: String,

    /// Comment URL stored on every application
    pub comment_url: String,

    /// Selectors for the search results markup
    pub selectors: ListingSelectors,

    /// Maximum number of listing pages fetched per window
    pub max_pages: u32,

    /// Minimum pause between requests in milliseconds
    pub min_delay_ms: u64,

    /// Maximum pause between requests in milliseconds
    pub max_delay_ms: u64,

    /// Request rate ceiling
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// Earliest date historical windows are sampled from
    pub epoch: NaiveDate,

    /// Suburb lookup tuning
    pub normalizer: NormalizerConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let (year, month, day) = DEFAULT_EPOCH;
        Self {
            listing_url_template: DEFAULT_LISTING_URL_TEMPLATE.to_string(),
            information_url_template: DEFAULT_INFORMATION_URL_TEMPLATE.to_string(),
            comment_url: DEFAULT_COMMENT_URL.to_string(),
            selectors: ListingSelectors::default(),
            max_pages: DEFAULT_MAX_PAGES,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("da-scraper/{}", env!("CARGO_PKG_VERSION")),
            epoch: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the listing URL template
    pub fn listing_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.listing_url_template = template.into();
        self
    }

    /// Set the information URL template
    pub fn information_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.information_url_template = template.into();
        self
    }

    /// Set the comment URL
    pub fn comment_url(mut self, comment_url: impl Into<String>) -> Self {
        self.config.comment_url = comment_url.into();
        self
    }

    /// Set the listing selectors
    pub fn selectors(mut self, selectors: ListingSelectors) -> Self {
        self.config.selectors = selectors;
        self
    }

    /// Set the maximum number of listing pages per window
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the pause range between requests in milliseconds
    pub fn delay_ms(mut self, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.config.min_delay_ms = min_delay_ms;
        self.config.max_delay_ms = max_delay_ms.max(min_delay_ms);
        self
    }

    /// Set the request rate ceiling
    pub fn requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.config.requests_per_second = requests_per_second;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the historical epoch
    pub fn epoch(mut self, epoch: NaiveDate) -> Self {
        self.config.epoch = epoch;
        self
    }

    /// Set the normalizer tuning
    pub fn normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.config.normalizer = normalizer;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
