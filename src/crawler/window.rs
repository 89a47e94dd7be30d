//! One-month date windows and the URLs built from them
//!
//! Every run crawls the most recent month and one complete historical month
//! chosen uniformly at random between the epoch and today. There is no
//! coverage record, so the archive is covered probabilistically over many
//! runs.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;
use serde::Serialize;
use url::form_urlencoded::byte_serialize;

/// A date range scoping one listing crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// `[today - 1 month, today]`
    pub fn recent(today: NaiveDate) -> Self {
        let from = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        Self::new(from, today)
    }

    /// Number of complete one-month windows between `epoch` and `today`
    pub fn historical_count(epoch: NaiveDate, today: NaiveDate) -> u32 {
        let mut months = (today.year() - epoch.year()) * 12 + today.month() as i32
            - epoch.month() as i32;

        while months > 0
            && epoch
                .checked_add_months(Months::new(months as u32))
                .is_none_or(|end| end > today)
        {
            months -= 1;
        }

        months.max(0) as u32
    }

    /// The `index`-th one-month window after `epoch`
    pub fn historical(epoch: NaiveDate, index: u32) -> Option<Self> {
        let from = epoch.checked_add_months(Months::new(index))?;
        let to = epoch.checked_add_months(Months::new(index + 1))?;
        Some(Self::new(from, to))
    }

    /// A complete historical window chosen uniformly at random
    pub fn random_historical<R: Rng>(
        epoch: NaiveDate,
        today: NaiveDate,
        rng: &mut R,
    ) -> Option<Self> {
        let count = Self::historical_count(epoch, today);
        if count == 0 {
            return None;
        }
        Self::historical(epoch, rng.gen_range(0..count))
    }

    /// Listing URL for one page of this window
    pub fn listing_url(&self, template: &str, page: u32) -> String {
        template
            .replace("{page}", &page.to_string())
            .replace("{from}", &encode_date(self.from))
            .replace("{to}", &encode_date(self.to))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Stable information URL for an application
pub fn information_url(template: &str, application_number: &str) -> String {
    let encoded: String = byte_serialize(application_number.as_bytes()).collect();
    template.replace("{application_number}", &encoded)
}

fn encode_date(date: NaiveDate) -> String {
    let formatted = date.format("%d/%m/%Y").to_string();
    byte_serialize(formatted.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_recent_window() {
        let window = DateWindow::recent(date(2024, 5, 15));
        assert_eq!(window, DateWindow::new(date(2024, 4, 15), date(2024, 5, 15)));

        let clamped = DateWindow::recent(date(2024, 3, 31));
        assert_eq!(clamped.from, date(2024, 2, 29));
    }

    #[test]
    fn test_historical_count() {
        let epoch = date(2024, 1, 1);
        assert_eq!(DateWindow::historical_count(epoch, date(2024, 1, 20)), 0);
        assert_eq!(DateWindow::historical_count(epoch, date(2024, 2, 1)), 1);
        assert_eq!(DateWindow::historical_count(epoch, date(2024, 5, 15)), 4);
        assert_eq!(DateWindow::historical_count(epoch, date(2025, 1, 1)), 12);
        assert_eq!(DateWindow::historical_count(epoch, date(2023, 6, 1)), 0);

        let mid_month = date(2024, 1, 20);
        assert_eq!(DateWindow::historical_count(mid_month, date(2024, 3, 19)), 1);
        assert_eq!(DateWindow::historical_count(mid_month, date(2024, 3, 20)), 2);
    }

    #[test]
    fn test_random_historical_is_complete() {
        let epoch = date(2024, 1, 1);
        let today = date(2024, 5, 15);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let window = DateWindow::random_historical(epoch, today, &mut rng).unwrap();
            assert!(window.from >= epoch);
            assert!(window.to <= today);
            assert_eq!(window.from.checked_add_months(Months::new(1)), Some(window.to));
        }
    }

    #[test]
    fn test_random_historical_covers_all_windows() {
        let epoch = date(2024, 1, 1);
        let today = date(2024, 5, 15);
        let mut rng = StdRng::seed_from_u64(42);

        let seen: std::collections::HashSet<_> = (0..200)
            .filter_map(|_| DateWindow::random_historical(epoch, today, &mut rng))
            .map(|w| w.from)
            .collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_no_historical_window_before_first_month() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(DateWindow::random_historical(date(2024, 1, 1), date(2024, 1, 31), &mut rng).is_none());
    }

    #[test]
    fn test_listing_url() {
        let window = DateWindow::new(date(2024, 4, 1), date(2024, 5, 1));
        let url = window.listing_url("https://register.test/page/{page}/?from={from}&to={to}", 3);
        assert_eq!(
            url,
            "https://register.test/page/3/?from=01%2F04%2F2024&to=01%2F05%2F2024"
        );
    }

    #[test]
    fn test_information_url() {
        assert_eq!(
            information_url("https://register.test/?application={application_number}", "542/2024/12"),
            "https://register.test/?application=542%2F2024%2F12"
        );
    }
}
