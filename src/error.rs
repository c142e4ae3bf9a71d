use thiserror::Error;

/// Failure modes of a report run. Everything except `RowParse` aborts the
/// pipeline at the stage where it occurs; `MonthNotPublished` is caught once
/// by the year-fallback logic before becoming fatal.
#[derive(Error, Debug)]
pub enum ListingsError {
    #[error("could not locate the market-data configuration endpoint: {detail}")]
    ConfigNotFound { detail: String },

    #[error("no report years published by the portal")]
    NoYearsAvailable,

    #[error("no {month} report published for {year}")]
    MonthNotPublished { year: i32, month: String },

    #[error("request to {url} failed: {detail}")]
    Fetch { url: String, detail: String },

    #[error("blocked by an anti-bot challenge at {url}")]
    Challenge { url: String },

    #[error("{url} did not return the expected JSON: {detail}")]
    InvalidJson { url: String, detail: String },

    #[error("report CSV could not be read: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {line}: {detail}")]
    RowParse { line: usize, detail: String },
}

pub type Result<T> = std::result::Result<T, ListingsError>;
