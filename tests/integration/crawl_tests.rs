//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the fetcher and the full crawl cycle end-to-end against a file-backed
//! SQLite archive.

use article_archiver::config::{Config, CrawlTarget, CrawlerConfig, StorageSettings};
use article_archiver::crawler::{
    crawl, load_target, register_target, Coordinator, CrawlMode, CrawlSettings, FetchErrorKind,
    Fetcher, HttpFetcher,
};
use article_archiver::storage::{
    open_storage, RunStatus, SqliteStorage, Storage, StorageError, TargetRecord,
};
use article_archiver::{ArchiverError, ConfigError};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestArchiver/1.0";

/// Creates a target whose listing page lives on the mock server
fn create_test_target(base_url: &str) -> CrawlTarget {
    CrawlTarget {
        domain: "news.example.com".to_string(),
        url: format!("{}/latest", base_url),
        block: "ul.articles".to_string(),
        article_link: "a.headline".to_string(),
        title: "h1".to_string(),
        body: "div.story".to_string(),
        article_updated_at: "time".to_string(),
        remove_class: ".advert".to_string(),
    }
}

fn test_settings(batch_limit: usize) -> CrawlSettings {
    CrawlSettings {
        batch_limit,
        request_delay: Duration::ZERO, // No pauses in tests
        config_hash: "integration".to_string(),
    }
}

fn listing_html(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a class="headline" href="{}">Read</a></li>"#, href))
        .collect();
    format!(
        r#"<html><head><title>Latest</title></head><body>
        <nav><a class="headline" href="/about">About</a></nav>
        <ul class="articles">{}</ul>
        </body></html>"#,
        items
    )
}

fn article_html(title: &str, body: &str, updated: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{}</h1>
        <time>{}</time>
        <div class="story">{}<aside class="advert">Subscribe now</aside></div>
        </body></html>"#,
        title, updated, body
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn open_file_storage(dir: &tempfile::TempDir) -> SqliteStorage {
    SqliteStorage::open(&dir.path().join("archive.db"), Duration::from_secs(5))
        .expect("Failed to open storage")
}

#[tokio::test]
async fn test_fetcher_parses_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Hello</h1></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(USER_AGENT).unwrap();
    let document = fetcher
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .expect("Fetch should succeed");

    let h1 = scraper::Selector::parse("h1").unwrap();
    let text: String = document.select(&h1).flat_map(|e| e.text()).collect();
    assert_eq!(text, "Hello");
}

#[tokio::test]
async fn test_fetcher_rejects_error_statuses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(USER_AGENT).unwrap();

    let url = format!("{}/missing", mock_server.uri());
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Status(404));
    assert_eq!(err.url, url);

    let err = fetcher
        .fetch(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Status(500));
}

#[tokio::test]
async fn test_fetcher_times_out_slow_responses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(8)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(USER_AGENT).unwrap();
    let started = std::time::Instant::now();
    let err = fetcher
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test]
async fn test_fetcher_reports_refused_connections() {
    // Grab a free port, then release it so nothing is listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetcher = HttpFetcher::new(USER_AGENT).unwrap();
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();

    assert!(
        matches!(err.kind, FetchErrorKind::Connect(_)),
        "unexpected error kind: {:?}",
        err.kind
    );
}

#[tokio::test]
async fn test_full_crawl_archives_articles() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/latest",
        listing_html(&[
            "/articles/1",
            "/articles/1#comments",
            &format!("{}/articles/2", base_url),
            "mailto:desk@example.com",
        ]),
    )
    .await;
    mount_page(
        &mock_server,
        "/articles/1",
        article_html("First\nstory", "Para one.\nPara two.", "2024-03-01"),
    )
    .await;
    mount_page(
        &mock_server,
        "/articles/2",
        article_html("Second story", "Only paragraph.", "2024-03-02"),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = open_file_storage(&dir);
    let target = create_test_target(&base_url);
    let target_id = storage.upsert_target(&target).unwrap();

    let fetcher = HttpFetcher::new(USER_AGENT).unwrap();
    let mut coordinator = Coordinator::new(
        TargetRecord { id: target_id, target },
        test_settings(5),
        fetcher,
        storage,
    )
    .unwrap();

    let report = coordinator.run(CrawlMode::Full).await.unwrap();

    // The nav link is outside the block and never counted
    assert_eq!(report.links_found, 4);
    assert_eq!(report.fragments_skipped, 1);
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.link_errors, 1);
    assert_eq!(report.articles_archived, 2);
    assert_eq!(report.items_failed, 0);

    let storage = coordinator.into_storage();
    assert_eq!(storage.count_frontier(target_id).unwrap(), 0);
    assert_eq!(storage.count_articles(target_id).unwrap(), 2);

    let first = storage
        .get_archived(target_id, &format!("{}/articles/1", base_url))
        .unwrap()
        .expect("First article should be archived");
    assert_eq!(first.title, "Firststory");
    assert_eq!(first.body, "Para one.\nPara two.");
    assert_eq!(first.article_updated_at, "2024-03-01");

    let run = storage.recent_runs(target_id, 1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "integration");
    assert_eq!(run.counters.articles_archived, 2);
}

#[tokio::test]
async fn test_second_run_skips_known_articles() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/latest", listing_html(&["/articles/1"])).await;
    Mock::given(method("GET"))
        .and(path("/articles/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html(
            "Story",
            "Text",
            "today",
        )))
        .expect(1) // Fetched once across both runs
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = create_test_target(&base_url);

    for expected_new in [1, 0] {
        let mut storage = open_file_storage(&dir);
        let target_id = storage.upsert_target(&target).unwrap();
        let mut coordinator = Coordinator::new(
            TargetRecord {
                id: target_id,
                target: target.clone(),
            },
            test_settings(5),
            HttpFetcher::new(USER_AGENT).unwrap(),
            storage,
        )
        .unwrap();

        let report = coordinator.run(CrawlMode::Full).await.unwrap();
        assert_eq!(report.links_enqueued, expected_new);
        assert_eq!(report.links_known, 1 - expected_new);
    }

    let storage = open_file_storage(&dir);
    let record = storage
        .get_target_by_domain("news.example.com")
        .unwrap()
        .unwrap();
    assert_eq!(storage.count_articles(record.id).unwrap(), 1);
    assert_eq!(storage.recent_runs(record.id, 10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_article_stays_queued() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/latest",
        listing_html(&["/articles/1", "/articles/2", "/articles/3"]),
    )
    .await;
    mount_page(&mock_server, "/articles/1", article_html("One", "1", "d1")).await;
    Mock::given(method("GET"))
        .and(path("/articles/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/articles/3", article_html("Three", "3", "d3")).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = open_file_storage(&dir);
    let target = create_test_target(&base_url);
    let target_id = storage.upsert_target(&target).unwrap();

    let mut coordinator = Coordinator::new(
        TargetRecord { id: target_id, target },
        test_settings(5),
        HttpFetcher::new(USER_AGENT).unwrap(),
        storage,
    )
    .unwrap();
    let report = coordinator.run(CrawlMode::Full).await.unwrap();

    assert_eq!(report.articles_archived, 2);
    assert_eq!(report.items_failed, 1);

    let storage = coordinator.storage();
    let failed_url = format!("{}/articles/2", base_url);
    assert!(storage.frontier_contains(target_id, &failed_url).unwrap());
    assert!(!storage.is_archived(target_id, &failed_url).unwrap());
    assert_eq!(storage.count_articles(target_id).unwrap(), 2);
}

#[tokio::test]
async fn test_listing_failure_fails_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = open_file_storage(&dir);
    let target = create_test_target(&mock_server.uri());
    let target_id = storage.upsert_target(&target).unwrap();

    let mut coordinator = Coordinator::new(
        TargetRecord { id: target_id, target },
        test_settings(5),
        HttpFetcher::new(USER_AGENT).unwrap(),
        storage,
    )
    .unwrap();
    let result = coordinator.run(CrawlMode::Full).await;

    match result {
        Err(ArchiverError::Fetch(e)) => assert_eq!(e.kind, FetchErrorKind::Status(502)),
        other => panic!("expected fetch error, got {:?}", other),
    }

    let storage = coordinator.storage();
    let run = storage.recent_runs(target_id, 1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/latest",
        listing_html(&["/articles/a", "/articles/b"]),
    )
    .await;
    mount_page(&mock_server, "/articles/a", article_html("A", "Alpha", "t1")).await;
    mount_page(&mock_server, "/articles/b", article_html("B", "Beta", "t2")).await;

    let dir = tempfile::tempdir().unwrap();
    let storage_settings = StorageSettings {
        database_path: dir.path().join("crawl.db"),
        busy_timeout: Duration::from_secs(5),
    };
    let config = Config {
        crawler: CrawlerConfig {
            batch_limit: 1,
            request_delay_ms: 0,
            user_agent: USER_AGENT.to_string(),
        },
        target: Some(create_test_target(&base_url)),
    };

    let mut storage = open_storage(&storage_settings).unwrap();
    let target = register_target(&mut storage, &config).unwrap();
    let report = crawl(&config.crawler, "hash-1", target, storage, CrawlMode::Full)
        .await
        .unwrap();
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.articles_archived, 1);

    // A later run picks the stored target up by domain and drains the queue
    let storage = open_storage(&storage_settings).unwrap();
    let record = load_target(&storage, "news.example.com").unwrap();
    let target_id = record.id;
    assert_eq!(storage.count_articles(target_id).unwrap(), 1);
    assert_eq!(storage.count_frontier(target_id).unwrap(), 1);

    // Oldest queued entry goes first
    assert!(storage
        .is_archived(target_id, &format!("{}/articles/a", base_url))
        .unwrap());

    let report = crawl(&config.crawler, "hash-1", record, storage, CrawlMode::ExtractOnly)
        .await
        .unwrap();
    assert_eq!(report.links_found, 0);
    assert_eq!(report.articles_archived, 1);

    let storage = open_storage(&storage_settings).unwrap();
    assert_eq!(storage.count_articles(target_id).unwrap(), 2);
    assert_eq!(storage.count_frontier(target_id).unwrap(), 0);
}

#[tokio::test]
async fn test_target_resolution_errors() {
    let dir = tempfile::tempdir().unwrap();
    let storage_settings = StorageSettings {
        database_path: dir.path().join("crawl.db"),
        busy_timeout: Duration::from_secs(5),
    };
    let config = Config {
        crawler: CrawlerConfig::default(),
        target: None,
    };

    let mut storage = open_storage(&storage_settings).unwrap();
    assert!(matches!(
        register_target(&mut storage, &config),
        Err(ArchiverError::Config(ConfigError::MissingTarget(_)))
    ));
    assert!(matches!(
        load_target(&storage, "news.example.com"),
        Err(ArchiverError::Storage(StorageError::TargetNotFound(_)))
    ));
}
