use crate::models::RunReport;

/// Render a finished run. Listings arrive already ordered by activation
/// date, then ticker.
pub fn print_report(report: &RunReport) {
    println!("OCC new listings sourced from: {}", report.source_url);
    println!(
        "Activation window: {} through future dates (EST)",
        report.window.start
    );
    if report.fell_back {
        println!("Note: report taken from {} (fallback year)", report.selected_year);
    }
    if report.skipped_rows > 0 {
        eprintln!(
            "Warning: skipped {} rows with missing or invalid fields",
            report.skipped_rows
        );
    }
    println!();

    if report.listings.is_empty() {
        println!("No qualifying tickers in the current window.");
        return;
    }

    for listing in &report.listings {
        let flag = match listing.flag {
            Some(flag) => format!("{}-listing", flag.code()),
            None => "listing".to_string(),
        };
        println!(
            "{:<6} {}  [{}]  {} (Exchange: {})",
            listing.ticker, listing.activation_date, flag, listing.company, listing.exchange
        );
    }
}
