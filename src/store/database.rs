//! Database operations for the application store

use crate::application::DevelopmentApplication;
use crate::store::error::DbError;
use crate::store::schema;
use crate::store::{Outcome, StoreConfig};
use chrono::NaiveDate;
use libsql::{Connection, Row, Value, params};
use tracing::{debug, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT application_number, address, description, information_url,
        comment_url, scrape_date, received_date, on_notice_from, on_notice_to
     FROM applications";

/// Database manager for the application store
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    config: StoreConfig,
}

impl Database {
    /// Create a new database manager with the default configuration
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        Self::with_config(conn, StoreConfig::default()).await
    }

    /// Create a new database manager with a custom configuration
    #[instrument(skip(conn))]
    pub async fn with_config(conn: Connection, config: StoreConfig) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self { conn, config })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str, config: StoreConfig) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::with_config(conn, config).await
    }

    /// Store an application once, migrating a legacy information URL on revisit
    #[instrument(skip(self, application), fields(application_number = %application.application_number))]
    pub async fn reconcile(&self, application: &DevelopmentApplication) -> Result<Outcome, DbError> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO applications (
                    application_number, address, description, information_url, comment_url,
                    scrape_date, received_date, on_notice_from, on_notice_to
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    text(&application.application_number),
                    text(&application.address),
                    text(&application.description),
                    text(&application.information_url),
                    text(&application.comment_url),
                    date(Some(application.scrape_date)),
                    date(application.received_date),
                    date(application.on_notice_from),
                    date(application.on_notice_to),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert application: {}", e)))?;

        if inserted > 0 {
            debug!("Inserted new application");
            return Ok(Outcome::Inserted);
        }

        if self.config.legacy_url_patterns.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        let legacy_clause = self
            .config
            .legacy_url_patterns
            .iter()
            .map(|_| "information_url LIKE ?")
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "UPDATE applications SET information_url = ?
             WHERE application_number = ? AND information_url <> ? AND ({})",
            legacy_clause
        );

        let mut values = vec![
            text(&application.information_url),
            text(&application.application_number),
            text(&application.information_url),
        ];
        values.extend(self.config.legacy_url_patterns.iter().map(|p| text(p)));

        let updated = self
            .conn
            .execute(&sql, values)
            .await
            .map_err(|e| DbError::Query(format!("Failed to update information URL: {}", e)))?;

        if updated > 0 {
            debug!("Migrated legacy information URL");
            Ok(Outcome::Updated)
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    /// Get an application by its reference number
    pub async fn get_application(
        &self,
        application_number: &str,
    ) -> Result<Option<DevelopmentApplication>, DbError> {
        let sql = format!("{} WHERE application_number = ?", SELECT_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, vec![text(application_number)])
            .await
            .map_err(|e| DbError::Query(format!("Failed to get application: {}", e)))?;

        rows.next()
            .await?
            .map(|row| row_to_application(&row))
            .transpose()
    }

    /// List stored applications, most recently lodged first
    #[instrument(skip(self))]
    pub async fn list_applications(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<DevelopmentApplication>, DbError> {
        let mut sql = format!(
            "{} ORDER BY received_date DESC, application_number",
            SELECT_COLUMNS
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut rows = self
            .conn
            .query(&sql, params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to list applications: {}", e)))?;

        let mut applications = Vec::new();
        while let Some(row) = rows.next().await? {
            applications.push(row_to_application(&row)?);
        }

        Ok(applications)
    }

    /// Number of stored applications
    pub async fn count_applications(&self) -> Result<i64, DbError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM applications", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to count applications: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn date(value: Option<NaiveDate>) -> Value {
    match value {
        Some(date) => Value::Text(date.format(DATE_FORMAT).to_string()),
        None => Value::Null,
    }
}

fn text_column(row: &Row, idx: i32) -> Result<Option<String>, DbError> {
    match row.get_value(idx)? {
        Value::Text(value) => Ok(Some(value)),
        Value::Null => Ok(None),
        other => Err(DbError::Data(format!(
            "Unexpected value in column {}: {:?}",
            idx, other
        ))),
    }
}

fn date_column(row: &Row, idx: i32) -> Result<Option<NaiveDate>, DbError> {
    text_column(row, idx)?
        .map(|value| {
            NaiveDate::parse_from_str(&value, DATE_FORMAT)
                .map_err(|e| DbError::Data(format!("Invalid date {:?}: {}", value, e)))
        })
        .transpose()
}

fn row_to_application(row: &Row) -> Result<DevelopmentApplication, DbError> {
    let application_number = text_column(row, 0)?
        .ok_or_else(|| DbError::Data("Missing application number".to_string()))?;
    let scrape_date = date_column(row, 5)?
        .ok_or_else(|| DbError::Data(format!("Missing scrape date for {}", application_number)))?;

    Ok(DevelopmentApplication {
        application_number,
        address: text_column(row, 1)?.unwrap_or_default(),
        description: text_column(row, 2)?.unwrap_or_default(),
        information_url: text_column(row, 3)?.unwrap_or_default(),
        comment_url: text_column(row, 4)?.unwrap_or_default(),
        scrape_date,
        received_date: date_column(row, 6)?,
        on_notice_from: date_column(row, 7)?,
        on_notice_to: date_column(row, 8)?,
    })
}
