use crate::error::{ListingsError, Result};
use crate::fetcher::{join_url, BASE_URL};
use crate::models::YearChoice;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

/// One entry of a year's report feed. The portal really does spell the
/// field "permamentUrl".
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "permamentUrl", default)]
    pub permament_url: String,
}

/// Parse the years endpoint payload: a JSON array of year strings. Entries
/// that are not valid integers are dropped; duplicates collapse. Result is
/// sorted newest first.
pub fn parse_years(url: &str, body: &str) -> Result<Vec<i32>> {
    let raw: Vec<String> =
        serde_json::from_str(body).map_err(|e| ListingsError::InvalidJson {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let mut years: Vec<i32> = raw
        .iter()
        .filter_map(|value| value.trim().parse::<i32>().ok())
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    Ok(years)
}

/// Pick the report year: the current year when published, otherwise the most
/// recent year below it (marked as a fallback). A set without either is
/// treated as empty.
pub fn select_year(years: &[i32], current_year: i32) -> Result<YearChoice> {
    if years.contains(&current_year) {
        return Ok(YearChoice {
            year: current_year,
            fell_back: false,
        });
    }

    fallback_year(years, current_year)
        .map(|year| YearChoice {
            year,
            fell_back: true,
        })
        .ok_or(ListingsError::NoYearsAvailable)
}

/// Most recent published year strictly below `limit`, if any.
pub fn fallback_year(years: &[i32], limit: i32) -> Option<i32> {
    years.iter().copied().filter(|year| *year < limit).max()
}

pub fn parse_report_feed(url: &str, body: &str) -> Result<Vec<ReportEntry>> {
    serde_json::from_str(body).map_err(|e| ListingsError::InvalidJson {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// Find the feed entry whose link names the requested month, e.g.
/// "october" matches ".../october.csv?ts=...". Case-insensitive.
pub fn locate_month_link(
    entries: &[ReportEntry],
    year: i32,
    month_slug: &str,
) -> Result<String> {
    let needle = format!("{}.csv", month_slug.to_lowercase());

    for entry in entries {
        if entry.permament_url.to_lowercase().contains(&needle) {
            return Ok(join_url(BASE_URL, &entry.permament_url));
        }
    }

    Err(ListingsError::MonthNotPublished {
        year,
        month: month_slug.to_string(),
    })
}

/// Year baked into the download link's `ts=YYYYMMDDhhmm` query parameter,
/// when present.
pub fn timestamp_year(csv_url: &str) -> Option<i32> {
    let re = Regex::new(r"[?&]ts=(\d{4})").unwrap();
    re.captures(csv_url)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Lowercased English month name, the portal's file naming scheme.
pub fn month_slug(date: NaiveDate) -> String {
    date.format("%B").to_string().to_lowercase()
}
