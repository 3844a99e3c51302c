use std::time::Duration;

use feed_logging::{feed_debug, feed_info};
use jobfeed_core::JobListing;
use thiserror::Error;
use url::Url;

use crate::decode::{decode_page, DecodeError};
use crate::extract::ListingExtractor;
use crate::fetch::Fetcher;
use crate::types::FetchError;

/// The EBRD search endpoint, newest postings first.
pub const DEFAULT_SEARCH_URL: &str =
    "https://jobs.ebrd.com/search/?q=&sortColumn=referencedate&sortDirection=desc";

/// Listings per search page on the live site.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// The paginated search endpoint. `startrow` is the site's 0-based row
/// offset, so page N starts at row `N * page_size`.
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    pub base: Url,
    pub page_size: u32,
}

impl SearchEndpoint {
    pub fn new(base: Url, page_size: u32) -> Self {
        Self { base, page_size }
    }

    /// URL of one search page, with the offset parameter appended.
    pub fn page_url(&self, page_index: u32) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("startrow", &(page_index * self.page_size).to_string());
        url
    }
}

impl Default for SearchEndpoint {
    fn default() -> Self {
        let base = Url::parse(DEFAULT_SEARCH_URL).expect("default search url is valid");
        Self::new(base, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Hard ceiling on pages fetched per run, empty page or not.
    pub max_pages: u32,
    /// Unconditional pause before every request after the first.
    pub page_delay: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 10,
            page_delay: Duration::from_secs(1),
        }
    }
}

/// Why the crawl stopped issuing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page yielded zero listings; pagination is exhausted.
    EmptyPage,
    /// The page ceiling was reached with listings still coming.
    PageCeiling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// All extracted listings, concatenated in fetch order. Not yet
    /// deduplicated.
    pub listings: Vec<JobListing>,
    pub pages_fetched: u32,
    pub rows_skipped: usize,
    pub stop_reason: StopReason,
    /// Decoded HTML of the first page, kept for the diagnostic dump.
    pub first_page_html: Option<String>,
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("page decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Walks the paginated search results one page at a time: sleep (except
/// before the first page), fetch, decode, extract, append. Stops on the
/// first empty page or at the page ceiling. Any fetch or decode failure
/// aborts the whole crawl; there are no retries.
pub async fn crawl(
    fetcher: &dyn Fetcher,
    extractor: &dyn ListingExtractor,
    endpoint: &SearchEndpoint,
    settings: &CrawlSettings,
) -> Result<CrawlOutcome, CrawlError> {
    let mut outcome = CrawlOutcome {
        listings: Vec::new(),
        pages_fetched: 0,
        rows_skipped: 0,
        stop_reason: StopReason::PageCeiling,
        first_page_html: None,
    };

    for page_index in 0..settings.max_pages {
        if page_index > 0 {
            tokio::time::sleep(settings.page_delay).await;
        }

        let url = endpoint.page_url(page_index);
        feed_debug!("fetching page {page_index}: {url}");
        let fetched = fetcher.fetch(url.as_str()).await?;
        let decoded = decode_page(
            &fetched.bytes,
            fetched.metadata.content_type.as_deref(),
        )?;
        outcome.pages_fetched += 1;

        let page = extractor.extract(&decoded.html, page_index);
        if outcome.first_page_html.is_none() {
            outcome.first_page_html = Some(decoded.html);
        }
        feed_info!(
            "page {page_index}: {} listings, {} rows skipped",
            page.listings.len(),
            page.rows_skipped
        );

        outcome.rows_skipped += page.rows_skipped;
        if page.listings.is_empty() {
            outcome.stop_reason = StopReason::EmptyPage;
            break;
        }
        outcome.listings.extend(page.listings);
    }

    Ok(outcome)
}
