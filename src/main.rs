use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::America::New_York;
use clap::Parser;
use occ_listings::fetcher::{HttpFetcher, ENTRY_PAGE};
use occ_listings::pipeline::{run_pipeline, RunOptions};
use occ_listings::{debug, report};

#[derive(Parser, Debug)]
#[clap(author, version, about = "OCC new listings report fetcher")]
struct Args {
    /// Number of calendar days before today that still qualify
    #[clap(short, long, default_value = "2")]
    lookback_days: i64,

    /// Entry page to start endpoint discovery from
    #[clap(long, default_value = ENTRY_PAGE)]
    entry_url: String,

    /// Attempts per HTTP request before giving up
    #[clap(long, default_value = "3")]
    max_attempts: u32,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_verbose(args.debug);

    // One snapshot of "now" in Eastern Time drives the whole run.
    let now = Utc::now().with_timezone(&New_York);

    let fetcher = HttpFetcher::new(args.max_attempts);
    let options = RunOptions {
        entry_url: args.entry_url,
        lookback_days: args.lookback_days,
    };

    let run = run_pipeline(&fetcher, &options, now)
        .context("failed to fetch the new listings report")?;
    report::print_report(&run);

    Ok(())
}
