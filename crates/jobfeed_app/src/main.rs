//! CLI entry point: runs the scrape-to-RSS pipeline once in the current
//! working directory and exits.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use feed_logging::{feed_error, feed_info};
use jobfeed_engine::{run_pipeline, PipelineConfig};

/// RFC 822 timestamp format used by `lastBuildDate` and `pubDate`.
const BUILD_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn main() -> ExitCode {
    logging::initialize(logging::LogDestination::Both);

    let build_date = Utc::now().format(BUILD_DATE_FORMAT).to_string();
    let config = PipelineConfig::new(PathBuf::from("."), build_date);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    match runtime.block_on(run_pipeline(&config)) {
        Ok(summary) => {
            feed_info!(
                "feed written to {} ({} items from {} pages, {} rows skipped)",
                summary.feed_path.display(),
                summary.items,
                summary.pages_fetched,
                summary.rows_skipped
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            feed_error!("run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
