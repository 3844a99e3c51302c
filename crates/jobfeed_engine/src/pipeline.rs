use std::path::PathBuf;

use feed_logging::{feed_info, feed_warn};
use jobfeed_core::dedupe_listings;
use thiserror::Error;

use crate::crawl::{crawl, CrawlError, CrawlSettings, SearchEndpoint, StopReason};
use crate::extract::SearchResultsExtractor;
use crate::feed::{build_feed_xml, FeedError, FeedOptions};
use crate::fetch::{FetchSettings, ReqwestFetcher};
use crate::persist::{atomic_write, PersistError};

/// Fixed name of the generated feed document.
pub const FEED_FILENAME: &str = "ebrd_jobs.xml";
/// First fetched page, saved next to the feed for selector debugging.
pub const DEBUG_PAGE_FILENAME: &str = "debug_page.html";

/// Everything one run needs. All fields default to the live-site values
/// except `build_date`, which the caller formats from its own clock.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: SearchEndpoint,
    pub fetch: FetchSettings,
    pub crawl: CrawlSettings,
    pub feed: FeedOptions,
    pub output_dir: PathBuf,
    pub feed_filename: String,
    pub debug_page_filename: String,
    /// Preformatted RFC 822 timestamp for `lastBuildDate` and `pubDate`.
    pub build_date: String,
}

impl PipelineConfig {
    pub fn new(output_dir: PathBuf, build_date: String) -> Self {
        Self {
            endpoint: SearchEndpoint::default(),
            fetch: FetchSettings::default(),
            crawl: CrawlSettings::default(),
            feed: FeedOptions::default(),
            output_dir,
            feed_filename: FEED_FILENAME.to_string(),
            debug_page_filename: DEBUG_PAGE_FILENAME.to_string(),
            build_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub feed_path: PathBuf,
    pub items: usize,
    pub pages_fetched: u32,
    pub rows_skipped: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Crawl(#[from] CrawlError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Runs the whole pipeline once: crawl the paginated search results,
/// deduplicate, serialize, and write the feed. Nothing touches the output
/// directory until the crawl and serialization have both succeeded, so a
/// mid-run failure leaves any previous feed intact.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary, RunError> {
    let fetcher = ReqwestFetcher::new(config.fetch.clone());
    let extractor = SearchResultsExtractor::new(config.endpoint.base.clone());

    let outcome = crawl(&fetcher, &extractor, &config.endpoint, &config.crawl).await?;
    let extracted = outcome.listings.len();
    let unique = dedupe_listings(outcome.listings);
    feed_info!(
        "crawl done: {} pages, {} listings, {} unique, stop: {:?}",
        outcome.pages_fetched,
        extracted,
        unique.len(),
        outcome.stop_reason
    );

    let xml = build_feed_xml(&unique, &config.feed, &config.build_date)?;
    let feed_path = atomic_write(&config.output_dir, &config.feed_filename, &xml)?;

    // Diagnostic dump only; a failure here never fails the run.
    if let Some(html) = &outcome.first_page_html {
        if let Err(err) = atomic_write(&config.output_dir, &config.debug_page_filename, html) {
            feed_warn!("could not save {}: {err}", config.debug_page_filename);
        }
    }

    Ok(RunSummary {
        feed_path,
        items: unique.len(),
        pages_fetched: outcome.pages_fetched,
        rows_skipped: outcome.rows_skipped,
        stop_reason: outcome.stop_reason,
    })
}
