//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and run the full
//! preload, crawl, deduplicate and persist cycle end-to-end.

use forum_sweep::config::{Config, CrawlerConfig};
use forum_sweep::crawler::{CrawlIssue, Coordinator, RunOutcome, RunReport};
use forum_sweep::storage::{
    share, PostRecord, SharedStorage, SqliteStorage, Storage, StorageError, StorageResult,
};
use forum_sweep::ForumError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/board/lists/";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: format!("{}{}?id=ohmygirl&page=", server.uri(), LISTING_PATH),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            channel_capacity: 4,
            ..CrawlerConfig::default()
        },
        ..Config::default()
    }
}

/// One listing row in the forum's markup, with a reply counter after the title
fn row(id: u64, title: &str, writer: &str) -> String {
    format!(
        r#"<tr class="us-post" data-no="{id}" data-type="icon_pic">
            <td class="gall_num">{id}</td>
            <td class="gall_tit"><a>{title}</a><a class="reply_numbox"><span class="reply_num">[2]</span></a></td>
            <td class="gall_writer"><span><em>{writer}</em></span></td>
            <td class="gall_date" title="2025-03-01 12:{minute:02}:00">12:{minute:02}</td>
        </tr>"#,
        id = id,
        title = title,
        writer = writer,
        minute = id % 60,
    )
}

fn listing(rows: &[String]) -> String {
    format!(
        "<html><body><table class=\"gall_list\"><tbody>{}</tbody></table></body></html>",
        rows.concat()
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=UTF-8"),
        )
        .mount(server)
        .await;
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::Skipped => panic!("Expected a completed run"),
    }
}

fn stored_ids(storage: &SharedStorage) -> Vec<u64> {
    storage
        .lock()
        .unwrap()
        .query_page(1000, 1)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

/// Storage that can read but never commits
struct ReadOnlyStorage;

impl Storage for ReadOnlyStorage {
    fn load_all(&self) -> StorageResult<HashMap<u64, PostRecord>> {
        Ok(HashMap::new())
    }

    fn insert_new(&mut self, _posts: &[PostRecord]) -> StorageResult<usize> {
        Err(StorageError::Database("database is locked".to_string()))
    }

    fn query_page(&self, _limit: u32, _page: u32) -> StorageResult<Vec<PostRecord>> {
        Ok(Vec::new())
    }

    fn count_posts(&self) -> StorageResult<u64> {
        Ok(0)
    }
}

/// Storage that cannot even be read
struct UnreadableStorage;

impl Storage for UnreadableStorage {
    fn load_all(&self) -> StorageResult<HashMap<u64, PostRecord>> {
        Err(StorageError::Database("no such table: posts".to_string()))
    }

    fn insert_new(&mut self, _posts: &[PostRecord]) -> StorageResult<usize> {
        Err(StorageError::Database("no such table: posts".to_string()))
    }

    fn query_page(&self, _limit: u32, _page: u32) -> StorageResult<Vec<PostRecord>> {
        Err(StorageError::Database("no such table: posts".to_string()))
    }

    fn count_posts(&self) -> StorageResult<u64> {
        Err(StorageError::Database("no such table: posts".to_string()))
    }
}

#[tokio::test]
async fn test_full_crawl_persists_new_posts() {
    let mock_server = MockServer::start().await;

    // Post 28 slides from page 1 to page 2 between the two requests
    mount_page(
        &mock_server,
        1,
        listing(&[row(30, "Hello", "alice"), row(29, "Fan art", "bob"), row(28, "Schedule", "carol")]),
    )
    .await;
    mount_page(
        &mock_server,
        2,
        listing(&[row(28, "Schedule", "carol"), row(27, "Old news", "dave")]),
    )
    .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("posts.db");

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new(&db_path).expect("Failed to open database"));
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();

    let report = completed(coordinator.run_crawl(2).await.unwrap());

    assert_eq!(report.pages, 2);
    assert_eq!(report.known_before, 0);
    assert_eq!(report.candidates, 5);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.new_posts, 4);
    assert_eq!(report.inserted, 4);
    assert!(report.issues.is_empty(), "issues: {:?}", report.issues);
    assert!(!coordinator.is_running());

    assert_eq!(stored_ids(&storage), vec![30, 29, 28, 27]);

    let newest = storage.lock().unwrap().query_page(1, 1).unwrap();
    assert_eq!(
        newest[0],
        PostRecord {
            id: 30,
            title: "Hello".to_string(),
            author: "alice".to_string(),
            published_at: "2025-03-01 12:30:00".to_string(),
            category: "icon_pic".to_string(),
        }
    );

    // Posts survive reopening the database
    drop(coordinator);
    drop(storage);
    let reopened = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(reopened.count_posts().unwrap(), 4);
}

#[tokio::test]
async fn test_second_run_finds_nothing_new() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, listing(&[row(5, "a", "x"), row(4, "b", "y")])).await;

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new_in_memory().unwrap());
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();

    let first = completed(coordinator.run_crawl(1).await.unwrap());
    assert_eq!(first.new_posts, 2);

    let second = completed(coordinator.run_crawl(1).await.unwrap());
    assert_eq!(second.known_before, 2);
    assert_eq!(second.candidates, 2);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.new_posts, 0);
    assert_eq!(second.inserted, 0);

    assert_eq!(stored_ids(&storage), vec![5, 4]);
}

#[tokio::test]
async fn test_stored_posts_are_never_overwritten() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        listing(&[row(100, "Edited title", "someone else"), row(101, "Brand new", "x")]),
    )
    .await;

    let mut sqlite = SqliteStorage::new_in_memory().unwrap();
    let original = PostRecord {
        id: 100,
        title: "Original title".to_string(),
        author: "author".to_string(),
        published_at: "2025-01-01 00:00:00".to_string(),
        category: "icon_txt".to_string(),
    };
    sqlite.insert_new(&[original.clone()]).unwrap();
    let storage = share(sqlite);

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();
    let report = completed(coordinator.run_crawl(1).await.unwrap());

    assert_eq!(report.new_posts, 1);
    assert_eq!(report.duplicates, 1);

    let stored = storage.lock().unwrap().query_page(10, 1).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, 101);
    assert_eq!(stored[1], original);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, listing(&[row(12, "one", "x")])).await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 3, listing(&[row(10, "three", "z")])).await;

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new_in_memory().unwrap());
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();

    let report = completed(coordinator.run_crawl(3).await.unwrap());

    assert_eq!(report.failed_pages(), vec![2]);
    assert_eq!(report.issues.len(), 1);
    assert!(matches!(report.issues[0], CrawlIssue::Fetch { page: 2, .. }));
    assert_eq!(report.new_posts, 2);
    assert_eq!(stored_ids(&storage), vec![12, 10]);
}

#[tokio::test]
async fn test_malformed_row_is_reported_and_skipped() {
    let mock_server = MockServer::start().await;
    let broken = r#"<tr class="us-post" data-no="notice" data-type="icon_notice">
        <td class="gall_tit"><a>Pinned notice</a></td></tr>"#
        .to_string();
    mount_page(
        &mock_server,
        1,
        listing(&[broken, row(44, "fine", "x")]),
    )
    .await;

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new_in_memory().unwrap());
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();

    let report = completed(coordinator.run_crawl(1).await.unwrap());

    assert_eq!(report.issues.len(), 1);
    assert!(matches!(report.issues[0], CrawlIssue::Record { page: 1, .. }));
    assert_eq!(report.new_posts, 1);
    assert_eq!(stored_ids(&storage), vec![44]);
}

#[tokio::test]
async fn test_oversized_id_does_not_block_other_posts() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        listing(&[row(1, "kept", "x"), row(9_223_372_036_854_775_808, "huge", "y")]),
    )
    .await;

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new_in_memory().unwrap());
    let coordinator = Coordinator::new(&config, Arc::clone(&storage)).unwrap();

    let report = completed(coordinator.run_crawl(1).await.unwrap());

    assert_eq!(report.issues.len(), 1);
    assert!(matches!(report.issues[0], CrawlIssue::Record { page: 1, .. }));
    assert_eq!(report.new_posts, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(stored_ids(&storage), vec![1]);

    // The same listing on the next run is still harmless
    let again = completed(coordinator.run_crawl(1).await.unwrap());
    assert_eq!(again.new_posts, 0);
    assert_eq!(again.issues.len(), 1);
}

#[tokio::test]
async fn test_preload_failure_aborts_before_fetching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[row(1, "a", "b")])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config, share(UnreadableStorage)).unwrap();

    let result = coordinator.run_crawl(3).await;

    assert!(matches!(result, Err(ForumError::Preload { .. })));
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_persist_failure_reports_pending_posts() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        listing(&[row(3, "a", "x"), row(2, "b", "x"), row(1, "c", "x")]),
    )
    .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config, share(ReadOnlyStorage)).unwrap();

    match coordinator.run_crawl(1).await {
        Err(ForumError::Persist { pending, .. }) => assert_eq!(pending, 3),
        other => panic!("Expected a persist failure, got {:?}", other),
    }

    // The guard is released even though the run failed
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_overlapping_run_is_skipped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&[row(7, "slow", "x")]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let storage = share(SqliteStorage::new_in_memory().unwrap());
    let coordinator = Arc::new(Coordinator::new(&config, Arc::clone(&storage)).unwrap());

    let first = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run_crawl(2).await })
    };

    for _ in 0..200 {
        if coordinator.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(coordinator.is_running());

    let second = coordinator.run_crawl(2).await.unwrap();
    assert!(matches!(second, RunOutcome::Skipped));
    assert_eq!(second.new_posts(), 0);

    let report = completed(first.await.unwrap().unwrap());
    assert_eq!(report.candidates, 2);
    assert_eq!(report.new_posts, 1);
    assert_eq!(stored_ids(&storage), vec![7]);

    // Once the first run is over a new one may start
    let third = completed(coordinator.run_crawl(1).await.unwrap());
    assert_eq!(third.new_posts, 0);
}

#[tokio::test]
async fn test_zero_pages_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let coordinator =
        Coordinator::new(&config, share(SqliteStorage::new_in_memory().unwrap())).unwrap();

    let result = coordinator.run_crawl(0).await;
    assert!(matches!(result, Err(ForumError::InvalidPageCount(0))));
}
