use jobfeed_core::JobListing;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Everything one page of results yielded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedPage {
    pub listings: Vec<JobListing>,
    pub rows_skipped: usize,
}

pub trait ListingExtractor: Send + Sync {
    fn extract(&self, html: &str, page_index: u32) -> ExtractedPage;
}

/// Extractor for the site's `searchResults` listing table:
/// - rows are the `tr.data-row` elements, falling back to any row that
///   contains an anchor when the marker class is missing
/// - title and link come from the row's first real anchor
/// - location and posting date come from the second and third cells
/// - rows that do not match that shape are skipped and counted, never fatal
///
/// A missing table reads as zero rows, which the crawl loop takes as the
/// end of pagination.
#[derive(Debug, Clone)]
pub struct SearchResultsExtractor {
    base: Url,
}

impl SearchResultsExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn listing_from_row(
        &self,
        row: ElementRef<'_>,
        anchor_sel: &Selector,
        cell_sel: &Selector,
        page_index: u32,
    ) -> Option<JobListing> {
        let (title, href) = title_anchor(row, anchor_sel)?;
        let link = self.resolve_link(&href)?;

        let cells: Vec<_> = row.select(cell_sel).collect();
        // Expected row shape: title cell, location cell, posting-date cell.
        if cells.len() < 3 {
            return None;
        }

        Some(JobListing {
            title,
            link: link.into(),
            location: trimmed_text(cells[1]),
            posting_date: trimmed_text(cells[2]),
            page_index,
        })
    }

    /// Absolute hrefs pass through; anything else is joined onto the site
    /// base. Unresolvable hrefs drop the row.
    fn resolve_link(&self, href: &str) -> Option<Url> {
        if let Ok(url) = Url::parse(href) {
            return Some(url);
        }
        self.base.join(href).ok()
    }
}

impl ListingExtractor for SearchResultsExtractor {
    fn extract(&self, html: &str, page_index: u32) -> ExtractedPage {
        let doc = Html::parse_document(html);
        let Some(table) = first_match(&doc, "table.searchResults") else {
            return ExtractedPage::default();
        };
        let (anchor_sel, cell_sel) = match (Selector::parse("a"), Selector::parse("td")) {
            (Ok(anchor), Ok(cell)) => (anchor, cell),
            _ => return ExtractedPage::default(),
        };

        let mut page = ExtractedPage::default();
        for row in listing_rows(table) {
            match self.listing_from_row(row, &anchor_sel, &cell_sel, page_index) {
                Some(listing) => page.listings.push(listing),
                None => page.rows_skipped += 1,
            }
        }
        page
    }
}

fn first_match<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

/// Rows carrying the `data-row` marker; when the markup omits it, any row
/// containing an anchor counts as a listing row.
fn listing_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    if let Ok(sel) = Selector::parse("tr.data-row") {
        let rows: Vec<_> = table.select(&sel).collect();
        if !rows.is_empty() {
            return rows;
        }
    }
    match (Selector::parse("tr"), Selector::parse("a")) {
        (Ok(row_sel), Ok(anchor_sel)) => table
            .select(&row_sel)
            .filter(|row| row.select(&anchor_sel).next().is_some())
            .collect(),
        _ => Vec::new(),
    }
}

/// First anchor with usable text and target. Fragment-only and script
/// pseudo-links never identify a posting.
fn title_anchor(row: ElementRef<'_>, anchor_sel: &Selector) -> Option<(String, String)> {
    row.select(anchor_sel).find_map(|anchor| {
        let href = anchor.value().attr("href")?.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.to_ascii_lowercase().starts_with("javascript:")
        {
            return None;
        }
        let title = trimmed_text(anchor);
        if title.is_empty() {
            return None;
        }
        Some((title, href.to_string()))
    })
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
