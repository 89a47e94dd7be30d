//! The development application record persisted by the scraper

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A development application as observed on the register
///
/// Built once per detail page visit and never mutated; a later visit builds
/// a fresh value that the store reconciles against what it already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentApplication {
    /// Council reference number, the primary key
    pub application_number: String,

    /// Normalized address where the suburb was recognized
    pub address: String,

    /// Free-text description of the development
    pub description: String,

    /// Stable URL for the application on the register
    pub information_url: String,

    /// Where the public can comment on the application
    pub comment_url: String,

    /// Date this record was observed
    pub scrape_date: NaiveDate,

    /// Date the application was lodged, when the register shows a valid one
    pub received_date: Option<NaiveDate>,

    /// Start of the public notice period (not populated by the crawler)
    pub on_notice_from: Option<NaiveDate>,

    /// End of the public notice period (not populated by the crawler)
    pub on_notice_to: Option<NaiveDate>,
}
