use chrono::{Duration, NaiveDate};

/// The N/E column of the report: whether the option series is a brand new
/// listing or an addition on an existing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFlag {
    New,
    Existing,
}

impl ListingFlag {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "N" => Some(ListingFlag::New),
            "E" => Some(ListingFlag::Existing),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ListingFlag::New => "N",
            ListingFlag::Existing => "E",
        }
    }
}

/// One row of the monthly report. The same ticker may appear on several
/// exchanges, each as its own row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub ticker: String,
    pub activation_date: NaiveDate,
    pub flag: Option<ListingFlag>,
    pub company: String,
    pub exchange: String,
}

/// Inclusive date range a listing must activate in to be reported.
/// `end = None` leaves the window open towards the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationWindow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl ActivationWindow {
    /// Window reaching from `lookback_days` before `today` into the
    /// unbounded future.
    pub fn from_lookback(today: NaiveDate, lookback_days: i64) -> Self {
        Self {
            start: today - Duration::days(lookback_days),
            end: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}

/// Outcome of the year selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearChoice {
    pub year: i32,
    pub fell_back: bool,
}

/// Raised when the downloaded CSV's embedded timestamp disagrees with the
/// year we selected. Informational only, the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MismatchWarning {
    pub ts_year: i32,
    pub selected_year: i32,
}

/// Everything a run hands to the presentation layer: the deduplicated
/// listings in display order plus the metadata describing how they were
/// obtained.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub listings: Vec<Listing>,
    pub source_url: String,
    pub window: ActivationWindow,
    pub selected_year: i32,
    pub fell_back: bool,
    pub mismatch_warning: Option<MismatchWarning>,
    pub skipped_rows: usize,
}
