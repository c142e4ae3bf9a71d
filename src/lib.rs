pub mod config;
pub mod debug;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod tabular;

pub use error::{ListingsError, Result};
pub use models::{ActivationWindow, Listing, ListingFlag, RunReport};
pub use pipeline::{run_pipeline, RunOptions};
