use crate::config::{self, PortalConfig};
use crate::debug_println;
use crate::error::{ListingsError, Result};
use crate::feed;
use crate::fetcher::{join_url, DocumentFetcher, BASE_URL, ENTRY_PAGE};
use crate::filter;
use crate::models::{ActivationWindow, MismatchWarning, RunReport, YearChoice};
use crate::tabular;
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

/// Fixed report_type source value; the portal serves equity and index
/// reports from the same endpoint.
const REPORT_TYPE: &str = "options";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub entry_url: String,
    pub lookback_days: i64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            entry_url: ENTRY_PAGE.to_string(),
            lookback_days: 2,
        }
    }
}

/// Run the whole discovery-download-filter pipeline against a single `now`
/// snapshot (already in Eastern Time). Each stage completes before the next
/// starts; any failure other than a first month miss aborts the run.
pub fn run_pipeline<F: DocumentFetcher>(
    fetcher: &F,
    options: &RunOptions,
    now: DateTime<Tz>,
) -> Result<RunReport> {
    println!("Fetching entry page: {}", options.entry_url);
    let landing = fetcher.fetch(&options.entry_url)?;

    let config_url = config::resolve_config_endpoint(&landing)?;
    debug_println!("Configuration endpoint: {}", config_url);
    let config_body = fetcher.fetch(&config_url)?;
    let config = PortalConfig::from_json(&config_url, &config_body)?;

    let years_url = join_url(BASE_URL, config.years_endpoint()?);
    let reports_url = join_url(BASE_URL, config.reports_endpoint()?);

    let years_body = fetcher.fetch(&years_url)?;
    let years = feed::parse_years(&years_url, &years_body)?;
    debug_println!("Published years: {:?}", years);

    let today = now.date_naive();
    let month = feed::month_slug(today);

    let (choice, csv_url) =
        locate_with_fallback(fetcher, &config, &reports_url, &years, now.year(), &month)?;

    let mismatch_warning = feed::timestamp_year(&csv_url)
        .filter(|ts_year| *ts_year != choice.year)
        .map(|ts_year| MismatchWarning {
            ts_year,
            selected_year: choice.year,
        });
    if let Some(warning) = &mismatch_warning {
        eprintln!(
            "Warning: CSV timestamp year ({}) differs from selected year ({}).",
            warning.ts_year, warning.selected_year
        );
    }

    println!("Downloading report: {}", csv_url);
    let csv_text = fetcher.fetch(&csv_url)?;
    let records = tabular::parse_records(&csv_text)?;
    debug_println!("Parsed {} raw rows", records.len());

    let window = ActivationWindow::from_lookback(today, options.lookback_days);
    let mut skipped_rows = 0;
    let listings = filter::filter_listings(&records, window, &mut skipped_rows);

    Ok(RunReport {
        listings,
        source_url: csv_url,
        window,
        selected_year: choice.year,
        fell_back: choice.fell_back,
        mismatch_warning,
        skipped_rows,
    })
}

/// Two-phase year selection: probe the preferred year's feed for the current
/// month and drop to the most recent earlier year exactly once when the
/// month is not there yet. A second miss surfaces as-is.
fn locate_with_fallback<F: DocumentFetcher>(
    fetcher: &F,
    config: &PortalConfig,
    reports_url: &str,
    years: &[i32],
    current_year: i32,
    month: &str,
) -> Result<(YearChoice, String)> {
    let first = feed::select_year(years, current_year)?;

    match fetch_month_link(fetcher, config, reports_url, first.year, month) {
        Ok(csv_url) => Ok((first, csv_url)),
        Err(ListingsError::MonthNotPublished { .. }) if !first.fell_back => {
            let year = feed::fallback_year(years, first.year)
                .ok_or(ListingsError::NoYearsAvailable)?;
            println!(
                "No {} report for {} yet, falling back to {}",
                month, first.year, year
            );
            let csv_url = fetch_month_link(fetcher, config, reports_url, year, month)?;
            Ok((
                YearChoice {
                    year,
                    fell_back: true,
                },
                csv_url,
            ))
        }
        Err(e) => Err(e),
    }
}

fn fetch_month_link<F: DocumentFetcher>(
    fetcher: &F,
    config: &PortalConfig,
    reports_url: &str,
    year: i32,
    month: &str,
) -> Result<String> {
    let params = config.query_params(&[
        ("report_type", REPORT_TYPE.to_string()),
        ("report_year", year.to_string()),
    ])?;

    let body = fetcher.fetch_with_query(reports_url, &params)?;
    let entries = feed::parse_report_feed(reports_url, &body)?;
    feed::locate_month_link(&entries, year, month)
}
