//! Jobfeed core: listing records and order-preserving deduplication.
mod dedupe;
mod listing;

pub use dedupe::dedupe_listings;
pub use listing::JobListing;
