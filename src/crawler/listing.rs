//! Extraction of search result rows from a listing page

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::crawler::error::CrawlError;

/// CSS selectors describing the search results markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// One element per application
    pub row: String,

    /// Link to the detail page, relative to a row
    pub detail_link: String,

    /// Address snippet, relative to a row
    pub address: String,

    /// Present anywhere on the page when another page follows
    pub next_page: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: "table tbody tr".to_string(),
            detail_link: "a[href]".to_string(),
            address: "td:nth-of-type(2)".to_string(),
            next_page: "a.next".to_string(),
        }
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Absolute URL of the detail page
    pub detail_url: String,

    /// Raw address text shown in the results
    pub address: String,
}

/// A parsed page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub items: Vec<ListingItem>,
    pub has_next_page: bool,
}

pub(crate) fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse one page of search results
///
/// Rows without a detail link are ignored, as are repeated detail links.
pub fn parse_listing_page(
    html: &str,
    page_url: &str,
    selectors: &ListingSelectors,
) -> Result<ListingPage, CrawlError> {
    let row_selector = selector(&selectors.row)?;
    let link_selector = selector(&selectors.detail_link)?;
    let address_selector = selector(&selectors.address)?;
    let next_selector = selector(&selectors.next_page)?;

    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for row in document.select(&row_selector) {
        let Some(href) = row
            .select(&link_selector)
            .find_map(|link| link.value().attr("href"))
        else {
            continue;
        };

        let detail_url = base.join(href.trim())?.to_string();
        if !seen.insert(detail_url.clone()) {
            continue;
        }

        let address = row
            .select(&address_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        items.push(ListingItem { detail_url, address });
    }

    let has_next_page = document.select(&next_selector).next().is_some();
    debug!(
        items = items.len(),
        has_next_page, "Parsed listing page {}", page_url
    );

    Ok(ListingPage {
        items,
        has_next_page,
    })
}
