//! # Database Schema Module
//!
//! One table, `applications`, keyed by the council reference number. Every
//! column is text; dates are ISO `YYYY-MM-DD`. Creation is idempotent so the
//! schema is (re)applied on every open.

use crate::store::error::DbError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS applications (
            application_number TEXT PRIMARY KEY,
            address TEXT,
            description TEXT,
            information_url TEXT,
            comment_url TEXT,
            scrape_date TEXT,
            received_date TEXT,
            on_notice_from TEXT,
            on_notice_to TEXT
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create applications table: {}", e)))?;

    Ok(())
}
