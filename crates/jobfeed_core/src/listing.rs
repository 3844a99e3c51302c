/// One job posting extracted from a listing-table row.
///
/// Field text is trimmed of surrounding whitespace at extraction time but
/// otherwise untouched; `posting_date` stays in whatever format the site
/// served. Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    /// Trimmed anchor text from the title cell.
    pub title: String,
    /// Absolute URL of the posting's detail page.
    pub link: String,
    /// Trimmed text of the location cell.
    pub location: String,
    /// Trimmed text of the posting-date cell, source format.
    pub posting_date: String,
    /// 0-based index of the search page the row was found on.
    pub page_index: u32,
}

impl JobListing {
    /// Identity of a listing: the exact `(title, link)` pair.
    ///
    /// Two rows with the same pair are the same posting even when location,
    /// date, or source page differ.
    pub fn dedupe_key(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }
}
