//! # Register Crawler Module
//!
//! Retrieval side of the scraper: walks the paginated search results of the
//! development application register one date window at a time, visits each
//! application's detail page, normalizes the address, and hands the result
//! to the store.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: endpoint templates, selectors, page ceiling, pacing
//! - `PageFetcher` / `HttpFetcher`: the "URL in, HTML out" collaborator
//! - `parse_listing_page` / `parse_detail_page`: markup extraction
//! - `DateWindow`: one-month windows, recent and randomly sampled historical
//! - `CrawlController`: the sequential page-by-page state machine
//!
//! ## Politeness
//!
//! Requests are strictly sequential. Each page fetch is followed by a random
//! pause, and `HttpFetcher` additionally enforces a hard request-rate ceiling.

mod config;
mod controller;
mod detail;
mod error;
mod fetcher;
mod listing;
mod pacing;
mod window;

pub use config::{
    CrawlerConfig, CrawlerConfigBuilder, DEFAULT_COMMENT_URL, DEFAULT_EPOCH,
    DEFAULT_INFORMATION_URL_TEMPLATE, DEFAULT_LISTING_URL_TEMPLATE, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_PAGES, DEFAULT_MIN_DELAY_MS, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT_SECS,
};
pub use controller::{CrawlController, RunReport, WindowReport};
pub use detail::{DetailFields, parse_date, parse_detail_page};
pub use error::CrawlError;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use listing::{ListingItem, ListingPage, ListingSelectors, parse_listing_page};
pub use pacing::Pacer;
pub use window::{DateWindow, information_url};
