use crate::debug_eprintln;
use crate::error::ListingsError;
use crate::models::{ActivationWindow, Listing, ListingFlag};
use crate::tabular::Record;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const SYMBOL_COLUMN: &str = "Stock Symbol";
pub const DATE_COLUMN: &str = "Date";
pub const COMPANY_COLUMN: &str = "Company";
pub const EXCHANGE_COLUMN: &str = "Exchange";
pub const FLAG_COLUMN: &str = "N/E";

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Apply the activation window to the parsed rows and collapse duplicates.
///
/// Rows that cannot be interpreted (blank ticker, unparseable date) are
/// skipped and counted in `skipped`; they never abort the run. Each ticker
/// survives exactly once, carrying the earliest admitted activation date;
/// ties keep the first occurrence in input order. Output is sorted by
/// activation date, then ticker.
pub fn filter_listings(
    records: &[Record],
    window: ActivationWindow,
    skipped: &mut usize,
) -> Vec<Listing> {
    let mut earliest: HashMap<String, Listing> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        // Data rows start at line 2, after the header.
        let listing = match listing_from_record(record, index + 2) {
            Ok(listing) => listing,
            Err(e) => {
                *skipped += 1;
                debug_eprintln!("Skipping {}", e);
                continue;
            }
        };

        if !window.contains(listing.activation_date) {
            continue;
        }

        match earliest.get(&listing.ticker) {
            Some(kept) if kept.activation_date <= listing.activation_date => {}
            _ => {
                earliest.insert(listing.ticker.clone(), listing);
            }
        }
    }

    let mut listings: Vec<Listing> = earliest.into_values().collect();
    listings.sort_by(|a, b| {
        (a.activation_date, a.ticker.as_str()).cmp(&(b.activation_date, b.ticker.as_str()))
    });
    listings
}

fn listing_from_record(record: &Record, line: usize) -> Result<Listing, ListingsError> {
    let ticker = record
        .get(SYMBOL_COLUMN)
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    if ticker.is_empty() {
        return Err(ListingsError::RowParse {
            line,
            detail: "missing stock symbol".to_string(),
        });
    }

    let raw_date = record.get(DATE_COLUMN).unwrap_or_default().trim();
    let activation_date =
        NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| ListingsError::RowParse {
            line,
            detail: format!("invalid activation date '{}'", raw_date),
        })?;

    Ok(Listing {
        ticker,
        activation_date,
        flag: ListingFlag::from_code(record.get(FLAG_COLUMN).unwrap_or_default()),
        company: record.get(COMPANY_COLUMN).unwrap_or_default().trim().to_string(),
        exchange: record.get(EXCHANGE_COLUMN).unwrap_or_default().trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(ticker: &str, raw_date: &str, exchange: &str) -> Record {
        Record::from_pairs(&[
            (SYMBOL_COLUMN, ticker),
            (DATE_COLUMN, raw_date),
            (COMPANY_COLUMN, "Test Co"),
            (EXCHANGE_COLUMN, exchange),
            (FLAG_COLUMN, "N"),
        ])
    }

    fn window_from(today: NaiveDate) -> ActivationWindow {
        ActivationWindow::from_lookback(today, 2)
    }

    #[test]
    fn includes_today_and_future_dates() {
        let today = date(2024, 10, 15);
        let records = vec![row("AAA", "10/15/2024", "NYSE"), row("BBB", "12/31/2030", "NYSE")];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn lookback_boundary_is_inclusive() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("EDGE", "10/13/2024", "NYSE"),
            row("GONE", "10/12/2024", "NYSE"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].ticker, "EDGE");
    }

    #[test]
    fn dedup_keeps_the_earliest_admitted_date() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("AAA", "10/14/2024", "NASDAQ"),
            row("AAA", "10/13/2024", "NYSE"),
            row("AAA", "10/15/2024", "ARCA"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].activation_date, date(2024, 10, 13));
        assert_eq!(listings[0].exchange, "NYSE");
    }

    #[test]
    fn date_ties_keep_the_first_occurrence() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("AAA", "10/14/2024", "NYSE"),
            row("AAA", "10/14/2024", "NASDAQ"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].exchange, "NYSE");
    }

    #[test]
    fn scenario_dedup_and_window_combined() {
        // AAA appears on two exchanges inside the window, BBB activated
        // before the window opened.
        let today = date(2024, 10, 15);
        let records = vec![
            row("AAA", "10/13/2024", "NYSE"),
            row("AAA", "10/14/2024", "NASDAQ"),
            row("BBB", "10/10/2024", "NYSE"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].ticker, "AAA");
        assert_eq!(listings[0].activation_date, date(2024, 10, 13));
        assert_eq!(skipped, 0);
    }

    #[test]
    fn output_is_sorted_by_date_then_ticker() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("ZZZ", "10/14/2024", "NYSE"),
            row("AAA", "10/15/2024", "NYSE"),
            row("MMM", "10/14/2024", "NYSE"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        let order: Vec<&str> = listings.iter().map(|l| l.ticker.as_str()).collect();
        assert_eq!(order, vec!["MMM", "ZZZ", "AAA"]);
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("AAA", "10/15/2024", "NYSE"),
            row("BAD", "2024-10-15", "NYSE"),
            row("", "10/15/2024", "NYSE"),
            row("NOD", "", "NYSE"),
        ];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].ticker, "AAA");
        assert_eq!(skipped, 3);
    }

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        let today = date(2024, 10, 15);
        let records = vec![row(" aaa ", "10/15/2024", "NYSE")];
        let mut skipped = 0;
        let listings = filter_listings(&records, window_from(today), &mut skipped);
        assert_eq!(listings[0].ticker, "AAA");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let mut skipped = 0;
        let listings = filter_listings(&[], window_from(date(2024, 10, 15)), &mut skipped);
        assert!(listings.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn filtering_is_idempotent() {
        let today = date(2024, 10, 15);
        let records = vec![
            row("AAA", "10/13/2024", "NYSE"),
            row("AAA", "10/14/2024", "NASDAQ"),
            row("BBB", "10/16/2024", "NYSE"),
        ];
        let mut first_skipped = 0;
        let mut second_skipped = 0;
        let first = filter_listings(&records, window_from(today), &mut first_skipped);
        let second = filter_listings(&records, window_from(today), &mut second_skipped);
        assert_eq!(first, second);
        assert_eq!(first_skipped, second_skipped);
    }
}
