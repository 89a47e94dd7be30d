//! Extraction of application fields from a detail page
//!
//! The detail page is a two-column key/value table. Only three keys are read;
//! anything missing simply stays empty and the caller decides whether the
//! application is usable.

use chrono::NaiveDate;
use scraper::Html;

use crate::crawler::error::CrawlError;
use crate::crawler::listing::{element_text, selector};

const KEY_APPLICATION_NUMBER: &str = "DA NUMBER";
const KEY_RECEIVED_DATE: &str = "DATE APPLICATION RECEIVED";
const KEY_DESCRIPTION: &str = "DEVELOPMENT DETAILS";

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d %B %Y", "%d %b %Y"];

/// Fields read from a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub application_number: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub description: String,
}

/// Parse the key/value table of a detail page
pub fn parse_detail_page(html: &str) -> Result<DetailFields, CrawlError> {
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;
    let document = Html::parse_document(html);

    let mut fields = DetailFields::default();

    for row in document.select(&row_selector) {
        let mut cells = row.select(&cell_selector).map(element_text);
        let (Some(key), Some(value)) = (cells.next(), cells.next()) else {
            continue;
        };

        match key.trim_end_matches(':').trim().to_uppercase().as_str() {
            KEY_APPLICATION_NUMBER if !value.is_empty() => {
                fields.application_number = Some(value);
            }
            KEY_RECEIVED_DATE => fields.received_date = parse_date(&value),
            KEY_DESCRIPTION => fields.description = value,
            _ => {}
        }
    }

    Ok(fields)
}

/// Parse a lodgement date in any of the formats the register has used
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}
