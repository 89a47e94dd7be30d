//! # da-scraper - Development Application Register Scraper
//!
//! This crate keeps a clean, deduplicated feed of development applications
//! published on a council's paginated web register. Each run crawls a recent
//! date window plus one randomly chosen historical window, extracts the
//! application fields from loosely formatted HTML, normalizes addresses
//! against a suburb gazetteer, and stores every application exactly once.
//!
//! ## Features
//!
//! - Suburb recovery from free-text addresses with approximate matching,
//!   longest-suffix preference, and hundred-name exclusion
//! - Sequential, paced crawling with a hard page ceiling per window
//! - Insert-once, patch-forward persistence in SQLite via LibSQL
//! - Async API with Tokio
//! - Structured logging with `tracing`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use da_scraper::crawler::{CrawlController, CrawlerConfig, HttpFetcher};
//! use da_scraper::gazetteer::Gazetteer;
//! use da_scraper::store::{Database, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gazetteer = Gazetteer::from_files(Path::new("suburbs.txt"), Path::new("hundreds.txt"))?;
//!     let store = Database::new_from_path("data.sqlite", StoreConfig::default()).await?;
//!     let config = CrawlerConfig::default();
//!     let fetcher = HttpFetcher::new(&config)?;
//!
//!     let controller = CrawlController::new(fetcher, store, Arc::new(gazetteer), config);
//!     let today = chrono::Local::now().date_naive();
//!     let report = controller.run(today, &mut rand::thread_rng()).await?;
//!
//!     println!("Crawled {} windows", report.windows.len());
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod application;
pub mod crawler;
pub mod gazetteer;
pub mod store;

pub use address::normalize;
pub use application::DevelopmentApplication;
