//! # Crawl Controller
//!
//! Drives one date window through the register as an explicit state machine:
//!
//! ```text
//! NextPage(n) -> FetchPage(n) -> ProcessItems -> NextPage(n + 1) ...
//!            \-> Done (n > max_pages)      \-> Done (no next page)
//! ```
//!
//! Everything is sequential: one request at a time, each followed by a
//! randomized pause. A hard page ceiling ends the window even if the markup
//! keeps advertising a next page. A transport failure aborts the run; the
//! store is idempotent, so the next run simply repeats the window.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::address::{Normalized, normalize_with};
use crate::application::DevelopmentApplication;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::detail::parse_detail_page;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::listing::{ListingItem, ListingPage, parse_listing_page};
use crate::crawler::pacing::Pacer;
use crate::crawler::window::{DateWindow, information_url};
use crate::gazetteer::Gazetteer;
use crate::store::{Database, Outcome};

/// Counters for one crawled window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowReport {
    /// Listing pages fetched
    pub pages: u32,
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
    /// Listed items that did not yield an application
    pub skipped: u32,
}

impl WindowReport {
    /// Items that reached the store
    pub fn stored(&self) -> u32 {
        self.inserted + self.updated + self.unchanged
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Windows crawled in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub windows: Vec<(DateWindow, WindowReport)>,
}

enum CrawlState {
    FetchPage(u32),
    ProcessItems { page: u32, listing: ListingPage },
    NextPage(u32),
    Done,
}

/// Crawls the register and feeds applications to the store
pub struct CrawlController<F: PageFetcher> {
    fetcher: F,
    store: Database,
    gazetteer: Arc<Gazetteer>,
    config: CrawlerConfig,
    pacer: Pacer,
}

impl<F: PageFetcher> CrawlController<F> {
    pub fn new(fetcher: F, store: Database, gazetteer: Arc<Gazetteer>, config: CrawlerConfig) -> Self {
        let pacer = Pacer::from_millis(config.min_delay_ms, config.max_delay_ms);
        Self {
            fetcher,
            store,
            gazetteer,
            config,
            pacer,
        }
    }

    /// The periodic job: the most recent month, then one random historical month
    #[instrument(skip(self, rng))]
    pub async fn run<R: Rng>(&self, today: NaiveDate, rng: &mut R) -> Result<RunReport, CrawlError> {
        let mut report = RunReport::default();

        let recent = DateWindow::recent(today);
        info!("Crawling recent window {}", recent);
        let recent_report = self.crawl_window(&recent, today).await?;
        report.windows.push((recent, recent_report));

        match DateWindow::random_historical(self.config.epoch, today, rng) {
            Some(historical) => {
                self.pacer.pause().await;
                info!("Crawling historical window {}", historical);
                let historical_report = self.crawl_window(&historical, today).await?;
                report.windows.push((historical, historical_report));
            }
            None => info!("No complete historical window since {}", self.config.epoch),
        }

        Ok(report)
    }

    /// Crawl every listing page of one window
    #[instrument(skip(self, window), fields(window = %window))]
    pub async fn crawl_window(
        &self,
        window: &DateWindow,
        scrape_date: NaiveDate,
    ) -> Result<WindowReport, CrawlError> {
        let mut report = WindowReport::default();
        // Page 1 goes through NextPage too, so a zero ceiling fetches nothing
        let mut state = CrawlState::NextPage(1);

        loop {
            state = match state {
                CrawlState::FetchPage(page) => {
                    let url = window.listing_url(&self.config.listing_url_template, page);
                    debug!(page, "Fetching listing page {}", url);

                    let html = self.fetcher.fetch(&url).await?;
                    report.pages += 1;
                    self.pacer.pause().await;

                    let listing = parse_listing_page(&html, &url, &self.config.selectors)?;
                    info!(page, items = listing.items.len(), "Listing page fetched");
                    CrawlState::ProcessItems { page, listing }
                }
                CrawlState::ProcessItems { page, listing } => {
                    for item in &listing.items {
                        match self.process_item(item, scrape_date).await? {
                            Some(outcome) => report.record(outcome),
                            None => report.skipped += 1,
                        }
                    }

                    if listing.has_next_page {
                        CrawlState::NextPage(page + 1)
                    } else {
                        CrawlState::Done
                    }
                }
                CrawlState::NextPage(page) => {
                    if page > self.config.max_pages {
                        warn!(
                            max_pages = self.config.max_pages,
                            "Page ceiling reached, stopping window"
                        );
                        CrawlState::Done
                    } else {
                        CrawlState::FetchPage(page)
                    }
                }
                CrawlState::Done => break,
            };
        }

        info!(
            pages = report.pages,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "Window complete"
        );
        Ok(report)
    }

    /// Fetch, parse, normalize and store one listed application
    ///
    /// Returns `None` when the item lacks an address or an application number.
    async fn process_item(
        &self,
        item: &ListingItem,
        scrape_date: NaiveDate,
    ) -> Result<Option<Outcome>, CrawlError> {
        let address = match normalize_with(&item.address, &self.gazetteer, &self.config.normalizer) {
            Normalized::Unrecognized(address) => {
                if !address.is_empty() {
                    warn!("Suburb not recognized in address: {}", address);
                }
                address
            }
            Normalized::HundredName(address) => {
                debug!("Address ends with a hundred name: {}", address);
                address
            }
            matched => matched.into_address(),
        };

        if address.is_empty() {
            debug!("Skipping {}: no address", item.detail_url);
            return Ok(None);
        }

        let html = self.fetcher.fetch(&item.detail_url).await?;
        self.pacer.pause().await;
        let detail = parse_detail_page(&html)?;

        let Some(application_number) = detail.application_number else {
            debug!("Skipping {}: no application number", item.detail_url);
            return Ok(None);
        };

        let application = DevelopmentApplication {
            information_url: information_url(
                &self.config.information_url_template,
                &application_number,
            ),
            application_number,
            address,
            description: detail.description,
            comment_url: self.config.comment_url.clone(),
            scrape_date,
            received_date: detail.received_date,
            on_notice_from: None,
            on_notice_to: None,
        };

        let outcome = self.store.reconcile(&application).await?;
        debug!(?outcome, "Stored {}", application.application_number);
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    use crate::store::StoreConfig;

    const LISTING: &str = "http://register.test/list";

    /// Serves canned pages by URL prefix and records every request
    struct MockFetcher {
        routes: Vec<(String, String)>,
        requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new(routes: Vec<(&str, String)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(prefix, body)| (prefix.to_string(), body))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn listing_requests(&self) -> usize {
            self.requests()
                .iter()
                .filter(|url| url.starts_with(LISTING))
                .count()
        }
    }

    impl PageFetcher for &MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.routes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| CrawlError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn listing(rows: &[(&str, &str)], next: bool) -> String {
        let rows: String = rows
            .iter()
            .map(|(id, address)| {
                format!(
                    r#"<tr><td><a href="/da/{id}">{id}</a></td><td>{address}</td></tr>"#
                )
            })
            .collect();
        let next = if next {
            r#"<a class="next" href="?page=next">Next</a>"#
        } else {
            ""
        };
        format!("<html><body><table><tbody>{rows}</tbody></table>{next}</body></html>")
    }

    fn detail(number: &str, received: &str, description: &str) -> String {
        format!(
            "<table>
               <tr><th>DA Number</th><td>{number}</td></tr>
               <tr><th>Date Application Received</th><td>{received}</td></tr>
               <tr><th>Development Details</th><td>{description}</td></tr>
             </table>"
        )
    }

    fn gazetteer() -> Arc<Gazetteer> {
        Arc::new(
            Gazetteer::parse(
                "EDITHBURGH,SA 5583\nMARION BAY,SA 5575\n",
                "MELVILLE\nCLINTON\n",
            )
            .unwrap(),
        )
    }

    fn config(max_pages: u32) -> CrawlerConfig {
        CrawlerConfig::builder()
            .listing_url_template(format!("{LISTING}?page={{page}}&from={{from}}&to={{to}}"))
            .information_url_template("http://register.test/application/{application_number}")
            .comment_url("mailto:admin@register.test")
            .max_pages(max_pages)
            .delay_ms(0, 0)
            .epoch(date(2024, 1, 1))
            .build()
    }

    fn paced_config(delay_ms: u64) -> CrawlerConfig {
        CrawlerConfig {
            min_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            ..config(100)
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    async fn setup_store() -> (Database, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let db = Database::new_from_path(&db_path, StoreConfig::default())
            .await
            .unwrap();
        (db, temp_dir)
    }

    fn window() -> DateWindow {
        DateWindow::new(date(2024, 4, 1), date(2024, 5, 1))
    }

    #[tokio::test]
    async fn test_single_page_window() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![
            (
                LISTING,
                listing(
                    &[
                        ("1", "106 Sultana Point Road EDITHBURGH (Hd Melville)"),
                        ("2", "7 The Esplanade . MARION BAY"),
                    ],
                    false,
                ),
            ),
            (
                "http://register.test/da/1",
                detail("542/2024/1", "12/04/2024", "Dwelling"),
            ),
            (
                "http://register.test/da/2",
                detail("542/2024/2", "garbage", "Shed"),
            ),
        ]);

        let controller = CrawlController::new(&fetcher, store.clone(), gazetteer(), config(100));
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(
            report,
            WindowReport {
                pages: 1,
                inserted: 2,
                ..WindowReport::default()
            }
        );
        assert_eq!(fetcher.listing_requests(), 1);
        assert_eq!(
            fetcher.requests()[0],
            "http://register.test/list?page=1&from=01%2F04%2F2024&to=01%2F05%2F2024"
        );

        let first = store.get_application("542/2024/1").await.unwrap().unwrap();
        assert_eq!(first.address, "106 Sultana Point Road, EDITHBURGH, SA 5583");
        assert_eq!(first.description, "Dwelling");
        assert_eq!(first.received_date, Some(date(2024, 4, 12)));
        assert_eq!(first.scrape_date, date(2024, 5, 1));
        assert_eq!(
            first.information_url,
            "http://register.test/application/542%2F2024%2F1"
        );
        assert_eq!(first.comment_url, "mailto:admin@register.test");

        let second = store.get_application("542/2024/2").await.unwrap().unwrap();
        assert_eq!(second.address, "7 The Esplanade, MARION BAY, SA 5575");
        assert_eq!(second.received_date, None);
    }

    #[tokio::test]
    async fn test_page_ceiling() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], true))]);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(3));
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(fetcher.listing_requests(), 3);
        assert!(fetcher.requests()[2].contains("page=3"));
    }

    #[tokio::test]
    async fn test_zero_page_ceiling_fetches_nothing() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], true))]);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(0));
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(report, WindowReport::default());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_every_fetch() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![
            (
                LISTING,
                listing(
                    &[
                        ("1", "4 Weaver Street EDITHBURGH"),
                        ("2", "7 The Esplanade MARION BAY"),
                    ],
                    false,
                ),
            ),
            (
                "http://register.test/da/1",
                detail("542/2024/1", "12/04/2024", "Dwelling"),
            ),
            (
                "http://register.test/da/2",
                detail("542/2024/2", "13/04/2024", "Shed"),
            ),
        ]);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), paced_config(1000));
        let start = tokio::time::Instant::now();
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(fetcher.requests().len(), 3);
        // One listing page plus two detail pages
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_empty_window() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], false))]);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(100));
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(
            report,
            WindowReport {
                pages: 1,
                ..WindowReport::default()
            }
        );
    }

    #[tokio::test]
    async fn test_items_missing_fields_are_skipped() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![
            (
                LISTING,
                listing(&[("1", "4 Weaver Street EDITHBURGH"), ("2", "")], false),
            ),
            ("http://register.test/da/1", "<p>Application withdrawn</p>".to_string()),
        ]);

        let controller = CrawlController::new(&fetcher, store.clone(), gazetteer(), config(100));
        let report = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.stored(), 0);
        assert_eq!(store.count_applications().await.unwrap(), 0);
        // No detail request for the row without an address
        assert!(!fetcher.requests().iter().any(|url| url == "http://register.test/da/2"));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_window() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(
            LISTING,
            listing(&[("1", "4 Weaver Street EDITHBURGH")], false),
        )]);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(100));
        let result = controller.crawl_window(&window(), date(2024, 5, 1)).await;

        assert!(matches!(result, Err(CrawlError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_revisit_migrates_legacy_url_only() {
        let (store, _temp_dir) = setup_store().await;
        let legacy = DevelopmentApplication {
            application_number: "542/2020/9".to_string(),
            address: "1 First Street, EDITHBURGH, SA 5583".to_string(),
            description: "Original description".to_string(),
            information_url: "http://register.test/entry/542-2020-9".to_string(),
            comment_url: "mailto:old@register.test".to_string(),
            scrape_date: date(2020, 3, 1),
            received_date: Some(date(2020, 2, 20)),
            on_notice_from: None,
            on_notice_to: None,
        };
        store.reconcile(&legacy).await.unwrap();

        let fetcher = MockFetcher::new(vec![
            (LISTING, listing(&[("9", "2 Second Street MARION BAY")], false)),
            (
                "http://register.test/da/9",
                detail("542/2020/9", "01/01/2021", "New description"),
            ),
        ]);

        let controller = CrawlController::new(&fetcher, store.clone(), gazetteer(), config(100));
        let first = controller.crawl_window(&window(), date(2024, 5, 1)).await.unwrap();
        let second = controller.crawl_window(&window(), date(2024, 5, 2)).await.unwrap();

        assert_eq!(first.updated, 1);
        assert_eq!(second.unchanged, 1);

        let stored = store.get_application("542/2020/9").await.unwrap().unwrap();
        assert_eq!(
            stored,
            DevelopmentApplication {
                information_url: "http://register.test/application/542%2F2020%2F9".to_string(),
                ..legacy
            }
        );
    }

    #[tokio::test]
    async fn test_run_crawls_recent_and_one_historical_window() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], false))]);
        let mut rng = StdRng::seed_from_u64(3);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(100));
        let report = controller.run(date(2024, 5, 15), &mut rng).await.unwrap();

        assert_eq!(report.windows.len(), 2);
        assert_eq!(report.windows[0].0, DateWindow::recent(date(2024, 5, 15)));

        let historical = report.windows[1].0;
        assert!(historical.from >= date(2024, 1, 1));
        assert!(historical.to <= date(2024, 5, 15));
        assert_eq!(fetcher.listing_requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pauses_between_windows() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], false))]);
        let mut rng = StdRng::seed_from_u64(3);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), paced_config(1000));
        let start = tokio::time::Instant::now();
        let report = controller.run(date(2024, 5, 15), &mut rng).await.unwrap();

        assert_eq!(report.windows.len(), 2);
        assert_eq!(fetcher.listing_requests(), 2);
        // A pause after each listing page and one between the windows
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_run_without_historical_window() {
        let (store, _temp_dir) = setup_store().await;
        let fetcher = MockFetcher::new(vec![(LISTING, listing(&[], false))]);
        let mut rng = StdRng::seed_from_u64(3);

        let controller = CrawlController::new(&fetcher, store, gazetteer(), config(100));
        let report = controller.run(date(2024, 1, 15), &mut rng).await.unwrap();

        assert_eq!(report.windows.len(), 1);
    }
}
