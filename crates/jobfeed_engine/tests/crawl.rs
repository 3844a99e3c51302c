use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use jobfeed_engine::{
    crawl, CrawlError, CrawlSettings, FetchError, FetchMetadata, FetchOutput, FetchSettings,
    Fetcher, ReqwestFetcher, SearchEndpoint, SearchResultsExtractor, StopReason,
    DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_URL,
};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

fn results_page(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(title, href)| {
            format!(
                "<tr class=\"data-row\">\
                 <td><a href=\"{href}\">{title}</a></td>\
                 <td>London, GB</td><td>01/01/2026</td>\
                 </tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table class=\"searchResults\"><tbody>{rows}</tbody></table></body></html>"
    )
}

fn empty_page() -> String {
    results_page(&[])
}

fn endpoint_for(server: &MockServer) -> SearchEndpoint {
    let base = Url::parse(&format!("{}/search/?q=", server.uri())).unwrap();
    SearchEndpoint::new(base, DEFAULT_PAGE_SIZE)
}

fn fast_settings(max_pages: u32) -> CrawlSettings {
    CrawlSettings {
        max_pages,
        page_delay: Duration::from_millis(0),
    }
}

async fn run_crawl(
    server: &MockServer,
    settings: &CrawlSettings,
) -> Result<jobfeed_engine::CrawlOutcome, CrawlError> {
    let endpoint = endpoint_for(server);
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let extractor = SearchResultsExtractor::new(endpoint.base.clone());
    crawl(&fetcher, &extractor, &endpoint, settings).await
}

/// Serves canned page bodies in order and records when each fetch happened
/// on the tokio clock.
struct ScriptedFetcher {
    bodies: Mutex<VecDeque<String>>,
    fetch_times: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedFetcher {
    fn new(bodies: Vec<String>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into()),
            fetch_times: Mutex::new(Vec::new()),
        }
    }

    fn fetch_times(&self) -> Vec<tokio::time::Instant> {
        self.fetch_times.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.fetch_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        let body = self
            .bodies
            .lock()
            .unwrap()
            .pop_front()
            .expect("a scripted page for every request");
        let bytes = body.into_bytes();
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: Some("text/html; charset=utf-8".to_string()),
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

#[test]
fn page_url_appends_the_startrow_offset() {
    init_logging();
    let endpoint = SearchEndpoint::default();
    assert!(endpoint.base.as_str().starts_with(DEFAULT_SEARCH_URL));

    let page0 = endpoint.page_url(0);
    let page3 = endpoint.page_url(3);
    assert!(page0.query().unwrap().ends_with("startrow=0"));
    assert!(page3.query().unwrap().ends_with("startrow=75"));
    // The base query survives untouched in front of the offset.
    assert!(page3.query().unwrap().contains("sortColumn=referencedate"));
}

#[test]
fn default_crawl_policy_is_ten_pages_with_a_one_second_pause() {
    init_logging();
    let settings = CrawlSettings::default();
    assert_eq!(settings.max_pages, 10);
    assert_eq!(settings.page_delay, Duration::from_secs(1));

    let endpoint = SearchEndpoint::default();
    assert_eq!(endpoint.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(endpoint.base.as_str(), DEFAULT_SEARCH_URL);
}

#[tokio::test(start_paused = true)]
async fn pause_runs_before_every_request_after_the_first() {
    init_logging();
    let fetcher = ScriptedFetcher::new(vec![
        results_page(&[("Engineer A", "/job/1")]),
        results_page(&[("Engineer B", "/job/2")]),
        empty_page(),
    ]);
    let endpoint = SearchEndpoint::default();
    let extractor = SearchResultsExtractor::new(endpoint.base.clone());
    let settings = CrawlSettings {
        max_pages: 10,
        page_delay: Duration::from_secs(1),
    };

    let start = tokio::time::Instant::now();
    let outcome = crawl(&fetcher, &extractor, &endpoint, &settings)
        .await
        .expect("crawl ok");

    assert_eq!(outcome.pages_fetched, 3);
    let times = fetcher.fetch_times();
    assert_eq!(times.len(), 3);
    // The first request goes out immediately; every later one waits out
    // the full pause first.
    assert_eq!(times[0].duration_since(start), Duration::ZERO);
    assert_eq!(times[1].duration_since(start), Duration::from_secs(1));
    assert_eq!(times[2].duration_since(start), Duration::from_secs(2));
}

#[tokio::test]
async fn stops_after_the_first_empty_page() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("startrow", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            results_page(&[("Engineer A", "/job/1"), ("Engineer B", "/job/2")]),
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("startrow", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(empty_page(), "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_crawl(&server, &fast_settings(10)).await.expect("crawl ok");

    assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.listings.len(), 2);
    assert_eq!(outcome.listings[0].title, "Engineer A");
    assert_eq!(outcome.listings[0].page_index, 0);
    // No request for startrow=50 was ever issued; the mock expectations
    // above verify the exact request count on drop.
}

#[tokio::test]
async fn missing_table_also_ends_pagination() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><p>Nothing here.</p></body></html>".to_string(),
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_crawl(&server, &fast_settings(10)).await.expect("crawl ok");

    assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
    assert_eq!(outcome.pages_fetched, 1);
    assert!(outcome.listings.is_empty());
}

#[tokio::test]
async fn page_ceiling_caps_the_crawl_even_with_more_data() {
    init_logging();
    let server = MockServer::start().await;
    // Every page is non-empty; only the ceiling can stop this crawl.
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            results_page(&[("Engineer A", "/job/1")]),
            "text/html",
        ))
        .expect(10)
        .mount(&server)
        .await;

    // Default page ceiling, an 11th page never gets requested.
    let settings = CrawlSettings {
        page_delay: Duration::from_millis(0),
        ..CrawlSettings::default()
    };
    let outcome = run_crawl(&server, &settings).await.expect("crawl ok");

    assert_eq!(outcome.stop_reason, StopReason::PageCeiling);
    assert_eq!(outcome.pages_fetched, 10);
    assert_eq!(outcome.listings.len(), 10);
    let pages: Vec<_> = outcome.listings.iter().map(|l| l.page_index).collect();
    assert_eq!(pages, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn undecodable_page_aborts_the_crawl() {
    init_logging();
    let server = MockServer::start().await;
    // The header pins UTF-8 but the body byte 0xff can never appear in it.
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<html>abc\xff</html>".to_vec(), "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = run_crawl(&server, &fast_settings(10))
        .await
        .expect_err("undecodable body must abort");
    assert!(matches!(err, CrawlError::Decode(_)));
}

#[tokio::test]
async fn fetch_failure_aborts_the_whole_crawl() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            results_page(&[("Engineer A", "/job/1")]),
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "25"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = run_crawl(&server, &fast_settings(10))
        .await
        .expect_err("server error must abort");
    assert!(matches!(err, CrawlError::Fetch(_)));
}

#[tokio::test]
async fn first_page_html_is_kept_for_the_debug_dump() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            results_page(&[("Engineer A", "/job/1")]),
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(empty_page(), "text/html"))
        .mount(&server)
        .await;

    let outcome = run_crawl(&server, &fast_settings(10)).await.expect("crawl ok");

    let html = outcome.first_page_html.expect("first page html kept");
    assert!(html.contains("Engineer A"));
}

#[tokio::test]
async fn skipped_rows_are_counted_across_pages() {
    init_logging();
    let page_with_bad_row = "<html><body><table class=\"searchResults\"><tbody>\
         <tr class=\"data-row\"><td><a href=\"/job/1\">Engineer A</a></td>\
         <td>London, GB</td><td>01/01/2026</td></tr>\
         <tr class=\"data-row\"><td>No anchor here</td><td>Paris, FR</td><td>02/01/2026</td></tr>\
         </tbody></table></body></html>";

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(page_with_bad_row.to_string(), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startrow", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(empty_page(), "text/html"))
        .mount(&server)
        .await;

    let outcome = run_crawl(&server, &fast_settings(10)).await.expect("crawl ok");

    assert_eq!(outcome.rows_skipped, 1);
    assert_eq!(outcome.listings.len(), 1);
}
