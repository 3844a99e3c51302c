//! Jobfeed engine: the fetch, decode, extract, serialize pipeline.
mod crawl;
mod decode;
mod extract;
mod feed;
mod fetch;
mod persist;
mod pipeline;
mod types;

pub use crawl::{
    crawl, CrawlError, CrawlOutcome, CrawlSettings, SearchEndpoint, StopReason, DEFAULT_PAGE_SIZE,
    DEFAULT_SEARCH_URL,
};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use extract::{ExtractedPage, ListingExtractor, SearchResultsExtractor};
pub use feed::{
    build_feed_xml, FeedError, FeedOptions, CHANNEL_DESCRIPTION, CHANNEL_LANGUAGE, CHANNEL_LINK,
    CHANNEL_TITLE,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use persist::{atomic_write, ensure_output_dir, PersistError};
pub use pipeline::{
    run_pipeline, PipelineConfig, RunError, RunSummary, DEBUG_PAGE_FILENAME, FEED_FILENAME,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
