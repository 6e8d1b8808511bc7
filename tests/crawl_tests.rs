//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! crawl cycle end-to-end, asserting on the run result and on what ended up
//! in storage.

use kumo::config::{Config, CrawlerConfig, OutputConfig, ServerConfig, StorageConfig};
use kumo::crawler::Crawler;
use kumo::storage::{PageStore, SqliteStore, UpsertOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for the given seeds
fn create_test_config(seeds: Vec<String>, max_pages: usize) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            delay_seconds: 0.0,
            max_pages,
            max_depth: None,
            request_timeout_seconds: 5,
            user_agent: "kumo-test/0.1".to_string(),
        },
        storage: StorageConfig {
            enabled: false,
            database_path: String::new(),
        },
        server: ServerConfig::default(),
        output: OutputConfig::default(),
    }
}

/// Mounts a 200 text/html response at the given path
async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_discovers_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title>
            <meta name="description" content="The home page"></head><body>
            <p>Welcome</p>
            <a href="{base}/page1">Page 1</a>
            <a href="{base}/page2">Page 2</a>
            </body></html>"#
        ),
    )
    .await;
    mount_html(
        &server,
        "/page1",
        "<html><head><title>Page 1</title></head><body>Content 1</body></html>".to_string(),
    )
    .await;
    mount_html(
        &server,
        "/page2",
        "<html><head><title>Page 2</title></head><body>Content 2</body></html>".to_string(),
    )
    .await;

    let config = create_test_config(vec![format!("{base}/")], 10);
    let store = SqliteStore::open_in_memory().unwrap();
    let mut crawler = Crawler::with_store(config, Some(store)).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_fetched, 3);
    assert_eq!(result.pages_failed, 0);
    assert_eq!(result.pages_unsaved, 0);

    // Seed page comes first (breadth-first from the seed)
    assert_eq!(result.pages[0].title, "Home");
    assert_eq!(result.pages[0].description, "The home page");
    assert!(result.pages[0].text.contains("Welcome"));
    assert_eq!(result.pages[0].status_code, 200);
}

#[tokio::test]
async fn test_page_budget_bounds_cycle() {
    // A links B and C, B links back to A (cycle) and on to D; budget 3.
    // Breadth-first order visits A, B, C; D is never fetched.
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/a",
        format!(
            r#"<html><body><a href="{base}/b">B</a><a href="{base}/c">C</a></body></html>"#
        ),
    )
    .await;
    mount_html(
        &server,
        "/b",
        format!(
            r#"<html><body><a href="{base}/a">A</a><a href="{base}/d">D</a></body></html>"#
        ),
    )
    .await;
    mount_html(&server, "/c", "<html><body>C</body></html>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{base}/a")], 3);
    let mut crawler = Crawler::with_store(config, None).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_fetched, 3);
    let urls: Vec<&str> = result.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{base}/a").as_str(),
            format!("{base}/b").as_str(),
            format!("{base}/c").as_str(),
        ]
    );

    // The revisit of A from B was deduplicated
    assert!(result.duplicate_links_skipped >= 1);
}

#[tokio::test]
async fn test_connection_error_seed_terminates_cleanly() {
    // Port 1 refuses connections
    let config = create_test_config(vec!["http://127.0.0.1:1/".to_string()], 5);
    let store = SqliteStore::open_in_memory().unwrap();
    let mut crawler = Crawler::with_store(config, Some(store)).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_failed, 1);
    assert_eq!(result.pages_fetched, 0);
    assert_eq!(result.pages.len(), 1);

    let page = &result.pages[0];
    assert_eq!(page.status_code, 0);
    assert!(page.title.is_empty());
    assert!(page.text.is_empty());
    assert!(page.html.is_empty());
}

#[tokio::test]
async fn test_recrawl_updates_instead_of_duplicating() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        "<html><head><title>Original</title></head><body>v1</body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("recrawl.db");

    let config = create_test_config(vec![format!("{base}/")], 5);

    // First run
    let store = SqliteStore::open(&db_path).unwrap();
    let mut crawler = Crawler::with_store(config.clone(), Some(store)).unwrap();
    crawler.run().await.unwrap();

    let store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(store.count_pages().unwrap(), 1);
    let first = store
        .get_page_by_url(&format!("{base}/"))
        .unwrap()
        .unwrap();
    assert_eq!(first.title, "Original");
    drop(store);

    // Page content changes between runs
    server.reset().await;
    mount_html(
        &server,
        "/",
        "<html><head><title>Changed</title></head><body>v2</body></html>".to_string(),
    )
    .await;

    std::thread::sleep(std::time::Duration::from_millis(5));

    // Second run against the same database
    let store = SqliteStore::open(&db_path).unwrap();
    let mut crawler = Crawler::with_store(config, Some(store)).unwrap();
    crawler.run().await.unwrap();

    let store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(store.count_pages().unwrap(), 1);

    let second = store
        .get_page_by_url(&format!("{base}/"))
        .unwrap()
        .unwrap();
    assert_eq!(second.title, "Changed");
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
async fn test_non_html_recorded_without_extraction() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/report.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 128])
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{base}/report.bin")], 5);
    let store = SqliteStore::open_in_memory().unwrap();
    let mut crawler = Crawler::with_store(config, Some(store)).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_fetched, 1);
    let page = &result.pages[0];
    assert_eq!(page.status_code, 200);
    assert_eq!(page.content_length, 128);
    assert!(page.title.is_empty());
    assert!(page.text.is_empty());
    assert!(page.html.is_empty());
}

#[tokio::test]
async fn test_http_error_status_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{base}/gone")], 5);
    let store = SqliteStore::open_in_memory().unwrap();
    let mut crawler = Crawler::with_store(config, Some(store)).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_failed, 1);
    assert_eq!(result.pages[0].status_code, 404);
}

#[tokio::test]
async fn test_max_depth_limits_discovery() {
    // / -> /level1 -> /level2; max-depth 1 stops before level2
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(r#"<html><body><a href="{base}/level1">L1</a></body></html>"#),
    )
    .await;
    mount_html(
        &server,
        "/level1",
        format!(r#"<html><body><a href="{base}/level2">L2</a></body></html>"#),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{base}/")], 10);
    config.crawler.max_depth = Some(1);

    let mut crawler = Crawler::with_store(config, None).unwrap();
    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_fetched, 2);
}

#[tokio::test]
async fn test_one_bad_page_does_not_abort_the_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><body>
            <a href="{base}/broken">Broken</a>
            <a href="{base}/fine">Fine</a>
            </body></html>"#
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(&server, "/fine", "<html><body>ok</body></html>".to_string()).await;

    let config = create_test_config(vec![format!("{base}/")], 10);
    let mut crawler = Crawler::with_store(config, None).unwrap();

    let result = crawler.run().await.unwrap();

    assert_eq!(result.pages_fetched, 2);
    assert_eq!(result.pages_failed, 1);
}

#[tokio::test]
async fn test_idempotent_double_crawl_row_count() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(r#"<html><body><a href="{base}/other">Other</a></body></html>"#),
    )
    .await;
    mount_html(&server, "/other", "<html><body>x</body></html>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("idempotent.db");
    let config = create_test_config(vec![format!("{base}/")], 10);

    for _ in 0..2 {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut crawler = Crawler::with_store(config.clone(), Some(store)).unwrap();
        crawler.run().await.unwrap();
    }

    let mut store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(store.count_pages().unwrap(), 2);

    // A third upsert of the same URL still reports Updated, never Inserted
    let page = kumo::storage::CrawledPage {
        url: format!("{base}/"),
        title: String::new(),
        description: String::new(),
        text: String::new(),
        html: String::new(),
        status_code: 200,
        content_length: 0,
    };
    assert_eq!(store.upsert_page(&page).unwrap(), UpsertOutcome::Updated);
}
