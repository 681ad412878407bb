//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the classifieds site and run
//! complete harvests against it, checking the CSV files they produce.

use listing_harvester::catalog::{load_categories, write_cache, Category};
use listing_harvester::config::{Config, EnrichmentFailurePolicy};
use listing_harvester::crawler::{run_harvest, Coordinator, Fetcher, HarvestEvent, HarvestRequest};
use listing_harvester::output::{HarvestOutcome, BASE_COLUMNS, EXTENDED_COLUMNS};
use listing_harvester::{FetchError, HarvestError};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const CATEGORY_PATH: &str = "/uk/elektronika/";

/// Matches requests for the first page of a category (no `page` parameter)
struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "page")
    }
}

fn card(id: u32) -> String {
    format!(
        r#"<div data-testid="l-card">
            <a class="css-1tqlkj0" href="/d/uk/obyavlenie/item-{id}.html"><img src="/img/{id}.jpg"/></a>
            <a href="/d/uk/obyavlenie/item-{id}.html"><h4 class="css-1g61gc2">Listing {id}</h4></a>
            <p data-testid="ad-price">{id}00 грн.</p>
            <p data-testid="location-date">Київ - Сьогодні</p>
        </div>"#
    )
}

fn listing_page(ids: &[u32]) -> String {
    let cards: String = ids.iter().map(|id| card(*id)).collect();
    format!("<html><body><div data-testid=\"listing-grid\">{cards}</div></body></html>")
}

fn detail_page(id: u32) -> String {
    format!(
        r#"<html><body>
            <img data-testid="ad-photo" src="https://cdn.example.com/{id}/a.jpg"/>
            <img data-testid="ad-photo" src="https://cdn.example.com/{id}/b.jpg"/>
            <div data-testid="ad-parameters-container"><p>Приватна особа</p><p>Стан: Вживане</p></div>
            <div data-testid="ad_description">Опис оголошення {id}</div>
            <div data-cy="ad-footer-bar-section">
                <span class="css-w85dhy">ID: {id}000</span>
                <span data-testid="page-view-counter">Views: 7</span>
            </div>
            <div data-testid="seller_card">
                <h4 data-testid="user-profile-user-name">Seller {id}</h4>
            </div>
        </body></html>"#
    )
}

fn listing_url(server: &MockServer, id: u32) -> String {
    format!("{}/d/uk/obyavlenie/item-{}.html", server.uri(), id)
}

async fn mount_page(server: &MockServer, page: u32, ids: &[u32]) {
    let response = ResponseTemplate::new(200).set_body_string(listing_page(ids));
    if page == 1 {
        Mock::given(method("GET"))
            .and(path(CATEGORY_PATH))
            .and(FirstPage)
            .respond_with(response)
            .mount(server)
            .await;
    } else {
        Mock::given(method("GET"))
            .and(path(CATEGORY_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

async fn mount_detail(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/d/uk/obyavlenie/item-{}.html", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(id)))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.origin = server.uri();
    config.site.categories_url = format!("{}/uk/", server.uri());
    config.site.user_agent = "HarvesterTest/1.0".to_string();
    config.harvest.enrichment_concurrency = 4;
    config.harvest.request_timeout_secs = 5;
    config.output.directory = dir.path().join("output").display().to_string();
    config.output.category_cache = dir.path().join("categories.json").display().to_string();
    config
}

fn category(href: &str) -> Category {
    Category {
        id: "cat-37".to_string(),
        title: "Електроніка".to_string(),
        href: href.to_string(),
        image: String::new(),
    }
}

fn request(config: &Config, target: usize, enrich: bool) -> HarvestRequest {
    HarvestRequest::new(category(CATEGORY_PATH), target, enrich, &config.output.directory)
}

/// Reads a CSV file as (header, rows)
fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let header = reader
        .headers()
        .expect("Missing header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("Corrupt row").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn url_column(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter().map(|row| row[1].clone()).collect()
}

#[tokio::test]
async fn test_target_reached_stops_paging() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2, 3]).await;
    mount_page(&server, 2, &[4, 5, 6]).await;
    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[7])))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 4, false);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.harvest(&request).await.expect("Harvest failed");

    assert_eq!(summary.outcome, HarvestOutcome::TargetReached);
    assert_eq!(summary.collected, 4);
    assert_eq!(summary.requested, 4);
    assert_eq!(summary.pages_fetched, 2);
    assert!(!summary.is_short());

    let (header, rows) = read_csv(&request.output_path);
    assert_eq!(header, BASE_COLUMNS.to_vec());
    assert_eq!(
        url_column(&rows),
        (1..=4).map(|id| listing_url(&server, id)).collect::<Vec<_>>()
    );
    assert_eq!(rows[0][0], "Listing 1");
    assert_eq!(rows[0][2], "100 грн.");
    assert_eq!(rows[0][3], "Київ - Сьогодні");
    assert_eq!(rows[0][4], format!("{}/img/1.jpg", server.uri()));
}

#[tokio::test]
async fn test_exhaustion_reports_true_count() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    // Page 2 overlaps page 1 by one listing
    mount_page(&server, 2, &[2, 3]).await;
    mount_page(&server, 3, &[]).await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, false);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.outcome, HarvestOutcome::Exhausted);
    assert_eq!(summary.collected, 3);
    assert_eq!(summary.requested, 10);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.pages_fetched, 3);
    assert!(summary.is_short());
    assert!(summary.to_string().contains("collected 3 of 10"));

    let (_, rows) = read_csv(&request.output_path);
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_duplicate_on_same_page_written_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 1, 2, 1]).await;
    mount_page(&server, 2, &[]).await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, false);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.collected, 2);
    assert_eq!(summary.duplicates_skipped, 2);

    let (_, rows) = read_csv(&request.output_path);
    let urls = url_column(&rows);
    assert_eq!(urls, vec![listing_url(&server, 1), listing_url(&server, 2)]);
}

#[tokio::test]
async fn test_enriched_rows_carry_every_extended_column() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    mount_page(&server, 2, &[]).await;
    mount_detail(&server, 1).await;
    // Listing 2's page only has a description
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-2.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div data-testid="ad_description">Коротко</div>"#),
        )
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 5, true);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.enrichment_failures, 0);

    let (header, rows) = read_csv(&request.output_path);
    let expected_header: Vec<&str> = BASE_COLUMNS.iter().chain(EXTENDED_COLUMNS.iter()).copied().collect();
    assert_eq!(header, expected_header);
    assert!(rows.iter().all(|row| row.len() == 15));

    let first = &rows[0];
    assert_eq!(first[5], "Опис оголошення 1");
    assert_eq!(first[6], "Приватна особа");
    assert_eq!(first[7], r#"{"Стан":"Вживане"}"#);
    assert_eq!(
        first[8],
        "https://cdn.example.com/1/a.jpg;https://cdn.example.com/1/b.jpg"
    );
    assert_eq!(first[9], "1000");
    assert_eq!(first[10], "7");
    assert_eq!(first[11], "Seller 1");
    assert_eq!(first[12], "");

    let second = &rows[1];
    assert_eq!(second[5], "Коротко");
    assert!(second[6..].iter().all(String::is_empty));
}

#[tokio::test]
async fn test_base_mode_never_fetches_details() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1]).await;
    mount_page(&server, 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(1)))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 5, false);
    run_harvest(config, request.clone()).await.expect("Harvest failed");

    let (header, rows) = read_csv(&request.output_path);
    assert_eq!(header.len(), 5);
    assert_eq!(rows[0].len(), 5);
}

#[tokio::test]
async fn test_failed_detail_page_drops_only_that_listing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2, 3]).await;
    mount_page(&server, 2, &[4]).await;
    mount_page(&server, 3, &[]).await;
    mount_detail(&server, 1).await;
    mount_detail(&server, 3).await;
    mount_detail(&server, 4).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, true);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.collected, 3);
    assert_eq!(summary.enrichment_failures, 1);
    assert_eq!(summary.enrichment_fallbacks, 0);
    assert_eq!(summary.outcome, HarvestOutcome::Exhausted);

    let (_, rows) = read_csv(&request.output_path);
    assert_eq!(
        url_column(&rows),
        vec![
            listing_url(&server, 1),
            listing_url(&server, 3),
            listing_url(&server, 4)
        ]
    );
    assert!(rows.iter().all(|row| !row[5].is_empty()));
}

#[tokio::test]
async fn test_failed_detail_page_kept_with_base_fields() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    mount_page(&server, 2, &[]).await;
    mount_detail(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-2.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = test_config(&server, &dir);
    config.harvest.on_enrichment_failure = EnrichmentFailurePolicy::KeepBase;
    let request = request(&config, 10, true);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.collected, 2);
    assert_eq!(summary.enrichment_failures, 1);
    assert_eq!(summary.enrichment_fallbacks, 1);

    let (_, rows) = read_csv(&request.output_path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "Listing 2");
    assert_eq!(rows[1].len(), 15);
    assert!(rows[1][5..].iter().all(String::is_empty));
}

#[tokio::test]
async fn test_detail_page_without_sections_still_emits_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    mount_page(&server, 2, &[]).await;
    mount_detail(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-2.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><h1>Listing</h1></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, true);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.collected, 2);
    assert_eq!(summary.enrichment_failures, 0);

    let (header, rows) = read_csv(&request.output_path);
    assert_eq!(header.len(), 15);
    assert_eq!(url_column(&rows), vec![listing_url(&server, 1), listing_url(&server, 2)]);
    assert_eq!(rows[1][0], "Listing 2");
    assert_eq!(rows[1].len(), 15);
    assert!(rows[1][5..].iter().all(String::is_empty));
}

#[tokio::test]
async fn test_enrichment_failure_refills_from_same_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2, 3, 4]).await;
    mount_detail(&server, 1).await;
    mount_detail(&server, 3).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-4.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(4)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[5])))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 2, true);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.outcome, HarvestOutcome::TargetReached);
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.pages_fetched, 1);

    let (_, rows) = read_csv(&request.output_path);
    assert_eq!(
        url_column(&rows),
        vec![listing_url(&server, 1), listing_url(&server, 3)]
    );
}

#[tokio::test]
async fn test_page_of_seen_listings_counts_as_stale() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    mount_page(&server, 2, &[2, 1]).await;
    mount_page(&server, 3, &[]).await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, false);
    let summary = run_harvest(config, request.clone()).await.expect("Harvest failed");

    assert_eq!(summary.outcome, HarvestOutcome::Exhausted);
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.duplicates_skipped, 2);
    assert_eq!(summary.stale_pages, 1);

    let (_, rows) = read_csv(&request.output_path);
    assert_eq!(url_column(&rows), vec![listing_url(&server, 1), listing_url(&server, 2)]);
}

#[tokio::test]
async fn test_progress_events_track_accepted_listings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2, 3]).await;

    let config = test_config(&server, &dir);
    let request = request(&config, 2, false);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let coordinator = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_events(event_tx);

    let summary = coordinator.harvest(&request).await.expect("Harvest failed");
    assert_eq!(summary.collected, 2);
    drop(coordinator);

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            HarvestEvent::Started {
                category: "Електроніка".to_string(),
                target: 2
            },
            HarvestEvent::PageFetched {
                page: 1,
                candidates: 3
            },
            HarvestEvent::ListingAccepted { accepted: 1 },
            HarvestEvent::ListingAccepted { accepted: 2 },
            HarvestEvent::Finished { collected: 2 },
        ]
    );
}

#[tokio::test]
async fn test_failed_detail_page_reported_as_event() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1]).await;
    mount_page(&server, 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/d/uk/obyavlenie/item-1.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 5, true);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let coordinator = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_events(event_tx);

    let summary = coordinator.harvest(&request).await.expect("Harvest failed");
    assert_eq!(summary.collected, 0);
    assert_eq!(summary.enrichment_failures, 1);
    drop(coordinator);

    let mut failed = Vec::new();
    while let Some(event) = event_rx.recv().await {
        if let HarvestEvent::EnrichmentFailed { url, .. } = event {
            failed.push(url);
        }
    }
    assert_eq!(failed, vec![listing_url(&server, 1)]);
}

#[tokio::test]
async fn test_page_failure_aborts_and_keeps_written_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[1, 2]).await;
    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, false);
    let result = run_harvest(config, request.clone()).await;

    match result {
        Err(HarvestError::PageFetch { url, source }) => {
            assert!(url.ends_with("/uk/elektronika/?page=2"), "unexpected url {}", url);
            assert!(matches!(source, FetchError::Status { status: 502, .. }));
        }
        other => panic!("Expected page fetch failure, got {:?}", other),
    }

    let (header, rows) = read_csv(&request.output_path);
    assert_eq!(header, BASE_COLUMNS.to_vec());
    assert_eq!(
        url_column(&rows),
        vec![listing_url(&server, 1), listing_url(&server, 2)]
    );
}

#[tokio::test]
async fn test_unrecognised_listing_page_is_not_exhaustion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div data-testid="l-card"><h4>No link</h4></div>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = request(&config, 10, false);
    let result = run_harvest(config, request).await;

    assert!(matches!(result, Err(HarvestError::PageExtract { .. })));
}

#[tokio::test]
async fn test_pagination_keeps_existing_query() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("currency", "UAH"))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("currency", "UAH"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let request = HarvestRequest::new(
        category("/uk/elektronika/?currency=UAH"),
        5,
        false,
        &config.output.directory,
    );
    let summary = run_harvest(config, request).await.expect("Harvest failed");
    assert_eq!(summary.collected, 1);
    assert_eq!(summary.pages_fetched, 2);
}

#[tokio::test]
async fn test_category_cache_hit_makes_no_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/uk/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let cache_path = Path::new(&config.output.category_cache);
    write_cache(cache_path, &[category(CATEGORY_PATH)]).unwrap();

    let fetcher = Fetcher::from_config(&config.site, &config.harvest).unwrap();
    let categories = load_categories(cache_path, &fetcher, &config.site)
        .await
        .expect("Failed to load categories");

    assert_eq!(categories, vec![category(CATEGORY_PATH)]);
}

#[tokio::test]
async fn test_category_discovery_populates_cache_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/uk/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div data-testid="home-categories-menu-row">
                <a href="/uk/elektronika/" data-testid="cat-37">
                    <img src="https://cdn.example.com/e.png"/>
                    <p class="css-1h1uzh8">Електроніка</p>
                </a>
            </div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let cache_path = Path::new(&config.output.category_cache);
    let fetcher = Fetcher::from_config(&config.site, &config.harvest).unwrap();

    let discovered = load_categories(cache_path, &fetcher, &config.site)
        .await
        .expect("Discovery failed");
    assert!(cache_path.exists());

    let cached = load_categories(cache_path, &fetcher, &config.site)
        .await
        .expect("Cache read failed");

    assert_eq!(discovered, cached);
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, "cat-37");
    assert_eq!(cached[0].title, "Електроніка");
}
