//! Persistence for scraped development applications
//!
//! The store follows an insert-once, patch-forward policy: the first values
//! seen for an application are authoritative, except that an information URL
//! still in a superseded format is migrated to the current one.

mod database;
pub mod error;
mod schema;

pub use database::Database;
pub use error::DbError;

/// SQL `LIKE` pattern matching the deprecated `entry/*` information URLs
pub const DEFAULT_LEGACY_URL_PATTERN: &str = "%/entry/%";

/// Configuration for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `LIKE` patterns of information URLs that may be rewritten on revisit
    pub legacy_url_patterns: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            legacy_url_patterns: vec![DEFAULT_LEGACY_URL_PATTERN.to_string()],
        }
    }
}

/// Result of reconciling a candidate application with the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The application was new and has been stored
    Inserted,

    /// The application existed and its legacy information URL was migrated
    Updated,

    /// The application existed and nothing changed
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_config() {
        let config = StoreConfig::default();
        assert_eq!(config.legacy_url_patterns, vec!["%/entry/%".to_string()]);
    }
}
