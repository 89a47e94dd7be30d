//! Error types for the crawler module

use crate::store::DbError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The register answered with a non-success status
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    /// A configured CSS selector does not parse
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Persisting an application failed
    #[error("Store error: {0}")]
    Store(#[from] DbError),
}
