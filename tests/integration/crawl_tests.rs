//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for both the listing site and the
//! detail gateway, and run the full crawl cycle end-to-end against a
//! temporary database.

use nhatot_harvest::config::{
    Config, CrawlConfig, MappingEntry, OutputConfig, SourceConfig,
};
use nhatot_harvest::crawler::Coordinator;
use rusqlite::Connection;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(source_path: &str, column: &str) -> MappingEntry {
    MappingEntry {
        path: source_path.into(),
        column: column.into(),
    }
}

/// Builds a test configuration pointed at a mock server
fn test_config(server_uri: &str, cities: Vec<String>, db_path: &str) -> Config {
    Config {
        source: SourceConfig {
            base_url: None,
            base_url_template: Some(format!("{}/mua-ban-bat-dong-san-{{city}}", server_uri)),
            cities,
            gateway_base: format!("{}/v1/public/ad-listing/", server_uri),
            user_agent: "TestHarvester/0.3".into(),
        },
        crawl: CrawlConfig {
            start_page: 1,
            max_pages: 5,
            request_delay_ms: 1, // effectively no pacing in tests
        },
        output: OutputConfig {
            database_path: db_path.into(),
            csv_path: None,
        },
        mapping: vec![
            entry("ad.list_id", "list_id"),
            entry("ad.price", "price"),
            entry("ad.subject", "subject"),
            entry("ad.list_time", "unix_timestamp"),
        ],
    }
}

/// HTML listing page with one ad link per id
fn listing_html(ids: &[u64]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<a href="/mua-ban-can-ho-{}.htm">Ad {}</a>"#, id, id))
        .collect();
    format!("<html><body>{}</body></html>", links)
}

/// Mounts a listing page for (city, page) returning the given ad ids
async fn mount_listing_page(server: &MockServer, city: &str, page: u32, ids: &[u64]) {
    Mock::given(method("GET"))
        .and(path(format!("/mua-ban-bat-dong-san-{}", city)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(ids)))
        .mount(server)
        .await;
}

/// Mounts a detail document for one ad id
async fn mount_detail(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/public/ad-listing/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn detail_doc(list_id: u64, price: f64, subject: &str, list_time: i64) -> serde_json::Value {
    serde_json::json!({
        "ad": {
            "list_id": list_id,
            "price": price,
            "subject": subject,
            "list_time": list_time,
        }
    })
}

#[tokio::test]
async fn test_full_crawl_persists_normalized_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ads.db");

    mount_listing_page(&server, "ha-noi", 1, &[111, 222]).await;
    mount_listing_page(&server, "ha-noi", 2, &[]).await;

    // 1_700_000_000_000 is millisecond-scale; normalization folds it to seconds
    mount_detail(&server, 111, detail_doc(111, 1.5e9, "nha mat pho", 1_700_000_000)).await;
    mount_detail(&server, 222, detail_doc(222, 2.5e9, "can ho", 1_700_000_000_000)).await;

    let config = test_config(
        &server.uri(),
        vec!["ha-noi".into()],
        db_path.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(config).expect("failed to create coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.cities_processed, 1);
    assert_eq!(report.total_saved, 2);

    let conn = Connection::open(&db_path).unwrap();
    let (price, subject, timestamp, post_date): (f64, String, String, String) = conn
        .query_row(
            "SELECT price, subject, timestamp, post_date FROM ads WHERE id = 111",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(price, 1.5e9);
    assert_eq!(subject, "nha mat pho");
    assert_eq!(timestamp, "2023-11-15 05:13:20");
    assert_eq!(post_date, "2023-11-15");

    // Millisecond-scale epoch normalizes to the same instant
    let ts_222: String = conn
        .query_row("SELECT timestamp FROM ads WHERE id = 222", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(ts_222, "2023-11-15 05:13:20");
}

#[tokio::test]
async fn test_empty_page_stops_city_without_touching_later_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ads.db");

    // ha-noi: page 1 and 2 have ads, page 3 is empty, page 4 must never be hit
    mount_listing_page(&server, "ha-noi", 1, &[11]).await;
    mount_listing_page(&server, "ha-noi", 2, &[22]).await;
    mount_listing_page(&server, "ha-noi", 3, &[]).await;
    Mock::given(method("GET"))
        .and(path("/mua-ban-bat-dong-san-ha-noi"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[44])))
        .expect(0)
        .mount(&server)
        .await;

    // da-nang is unaffected by ha-noi stopping early
    mount_listing_page(&server, "da-nang", 1, &[33]).await;
    mount_listing_page(&server, "da-nang", 2, &[]).await;

    for id in [11u64, 22, 33] {
        mount_detail(&server, id, detail_doc(id, 1.0e9, "nha", 1_700_000_000)).await;
    }

    let config = test_config(
        &server.uri(),
        vec!["ha-noi".into(), "da-nang".into()],
        db_path.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(config).expect("failed to create coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    assert_eq!(report.cities_processed, 2);
    assert_eq!(report.total_saved, 3);

    let conn = Connection::open(&db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM ads", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_rerun_fetches_no_details_for_stored_ads() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ads.db");

    mount_listing_page(&server, "ha-noi", 1, &[500, 501]).await;
    mount_listing_page(&server, "ha-noi", 2, &[]).await;

    // Each detail document may be fetched exactly once across both runs
    for id in [500u64, 501] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/public/ad-listing/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(detail_doc(id, 1.0e9, "nha", 1_700_000_000)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = test_config(
        &server.uri(),
        vec!["ha-noi".into()],
        db_path.to_str().unwrap(),
    );

    let first = Coordinator::new(config.clone()).expect("failed to create coordinator");
    let report = first.run().await.expect("first crawl failed");
    assert_eq!(report.total_saved, 2);

    let second = Coordinator::new(config).expect("failed to create coordinator");
    let report = second.run().await.expect("second crawl failed");
    assert_eq!(report.total_saved, 0);

    // Mock expectations (one detail fetch per id) verified on server drop
}

#[tokio::test]
async fn test_detail_failure_skips_item_but_continues() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ads.db");

    mount_listing_page(&server, "ha-noi", 1, &[600, 601]).await;
    mount_listing_page(&server, "ha-noi", 2, &[]).await;

    Mock::given(method("GET"))
        .and(path("/v1/public/ad-listing/600"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_detail(&server, 601, detail_doc(601, 3.0e9, "nha", 1_700_000_000)).await;

    let config = test_config(
        &server.uri(),
        vec!["ha-noi".into()],
        db_path.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(config).expect("failed to create coordinator");
    let report = coordinator.run().await.expect("crawl failed");

    // The failed item is skipped; the crawl itself completes
    assert_eq!(report.total_saved, 1);

    let conn = Connection::open(&db_path).unwrap();
    let ids: Vec<i64> = conn
        .prepare("SELECT id FROM ads ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids, vec![601]);
}

#[tokio::test]
async fn test_canonical_id_from_document_wins_over_requested_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ads.db");

    mount_listing_page(&server, "ha-noi", 1, &[99]).await;
    mount_listing_page(&server, "ha-noi", 2, &[]).await;
    // Gateway answers the request for 99 with a document whose own id is 42
    mount_detail(&server, 99, detail_doc(42, 1.5e9, "nha", 1_700_000_000)).await;

    let config = test_config(
        &server.uri(),
        vec!["ha-noi".into()],
        db_path.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(config).expect("failed to create coordinator");
    let report = coordinator.run().await.expect("crawl failed");
    assert_eq!(report.total_saved, 1);

    let conn = Connection::open(&db_path).unwrap();
    let (id, list_id): (i64, i64) = conn
        .query_row("SELECT id, list_id FROM ads", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(list_id, 42);
}
