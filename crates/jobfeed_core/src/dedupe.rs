use std::collections::HashSet;

use crate::listing::JobListing;

/// Collapses the ordered concatenation of extracted listings into one record
/// per distinct `(title, link)` pair.
///
/// The first occurrence wins and output order equals first-seen order, so
/// a duplicate on a later page never displaces or reorders the record from
/// an earlier page. Keys are compared by exact string equality; nothing is
/// re-trimmed or case-folded here.
pub fn dedupe_listings(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(listings.len());
    let mut unique = Vec::with_capacity(listings.len());
    for listing in listings {
        let key = (listing.title.clone(), listing.link.clone());
        if seen.insert(key) {
            unique.push(listing);
        }
    }
    unique
}
