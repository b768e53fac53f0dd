//! Integration tests for URL submission and retrieval.

use std::sync::Arc;

use forum_link_ledger::db::{count_forum_urls, count_other_urls, insert_forum_url, Database};
use forum_link_ledger::forum::ForumThread;
use forum_link_ledger::ingest::{IngestError, IngestService};
use tempfile::TempDir;
use url::Url;

const THREAD_PAGE_TWO: &str = "https://forum.example.com/threads/cool-topic.1234/page-2#post-99";

async fn setup() -> (IngestService, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create database");
    let service = IngestService::new(db.clone())
        .await
        .expect("Failed to create service");
    (service, db, temp_dir)
}

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_thread_submission_example() {
    let (service, _db, _temp_dir) = setup().await;

    let added = service
        .submit(THREAD_PAGE_TWO, &urls(&["https://cdn.example.com/a.png"]))
        .await
        .unwrap();
    assert_eq!(added, 1);

    let page_two = service.retrieve(THREAD_PAGE_TWO, Some(2)).await.unwrap();
    assert_eq!(page_two, vec!["https://cdn.example.com/a.png"]);

    let page_one = service.retrieve(THREAD_PAGE_TWO, Some(1)).await.unwrap();
    assert!(page_one.is_empty());
}

#[tokio::test]
async fn test_repeat_submission_adds_nothing() {
    let (service, db, _temp_dir) = setup().await;
    let batch = urls(&["https://cdn.example.com/a.png"]);

    assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 1);
    assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 0);
    assert_eq!(count_forum_urls(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_partial_overlap_counts_only_new() {
    let (service, _db, _temp_dir) = setup().await;
    let origin = "https://forum.example.com/threads/cool-topic.1234/";

    service
        .submit(origin, &urls(&["https://a.example/1", "https://a.example/2"]))
        .await
        .unwrap();

    let added = service
        .submit(
            origin,
            &urls(&[
                "https://a.example/1",
                "https://a.example/2",
                "https://a.example/3",
                "https://a.example/4",
                "https://a.example/5",
            ]),
        )
        .await
        .unwrap();
    assert_eq!(added, 3);
}

#[tokio::test]
async fn test_duplicates_and_blanks_within_one_batch() {
    let (service, _db, _temp_dir) = setup().await;

    let added = service
        .submit(
            "https://blog.example.com/post",
            &urls(&[
                "https://a.example/b",
                " https://a.example/b ",
                "",
                "   ",
                "https://a.example/a",
            ]),
        )
        .await
        .unwrap();
    assert_eq!(added, 2);

    let stored = service
        .retrieve("https://blog.example.com/post", None)
        .await
        .unwrap();
    assert_eq!(stored, vec!["https://a.example/a", "https://a.example/b"]);
}

#[tokio::test]
async fn test_post_anchor_does_not_split_identity() {
    let (service, _db, _temp_dir) = setup().await;
    let batch = urls(&["https://cdn.example.com/a.png"]);

    let first = "https://forum.example.com/threads/cool-topic.1234/page-2#post-1";
    let second = "https://forum.example.com/threads/cool-topic.1234/page-2#post-2";

    assert_eq!(service.submit(first, &batch).await.unwrap(), 1);
    assert_eq!(service.submit(second, &batch).await.unwrap(), 0);
}

#[tokio::test]
async fn test_retrieve_all_pages() {
    let (service, _db, _temp_dir) = setup().await;

    service
        .submit(
            "https://forum.example.com/threads/cool-topic.1234/",
            &urls(&["https://a.example/1"]),
        )
        .await
        .unwrap();
    service
        .submit(
            "https://forum.example.com/threads/cool-topic.1234/page-3",
            &urls(&["https://a.example/3"]),
        )
        .await
        .unwrap();

    let all = service.retrieve(THREAD_PAGE_TWO, None).await.unwrap();
    assert_eq!(all, vec!["https://a.example/1", "https://a.example/3"]);

    let third = service.retrieve(THREAD_PAGE_TWO, Some(3)).await.unwrap();
    assert_eq!(third, vec!["https://a.example/3"]);
}

#[tokio::test]
async fn test_generic_origin() {
    let (service, db, _temp_dir) = setup().await;
    let origin = "https://news.example.com/2024/story.html";

    let added = service
        .submit(origin, &urls(&["https://a.example/1"]))
        .await
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(
        service
            .submit(origin, &urls(&["https://a.example/1"]))
            .await
            .unwrap(),
        0
    );

    assert_eq!(count_other_urls(db.pool()).await.unwrap(), 1);
    assert_eq!(count_forum_urls(db.pool()).await.unwrap(), 0);

    // page is irrelevant for generic origins
    let stored = service.retrieve(origin, Some(4)).await.unwrap();
    assert_eq!(stored, vec!["https://a.example/1"]);
}

#[tokio::test]
async fn test_generic_origin_is_normalized() {
    let (service, _db, _temp_dir) = setup().await;

    service
        .submit("HTTPS://Example.COM", &urls(&["https://a.example/1"]))
        .await
        .unwrap();

    let stored = service.retrieve("https://example.com/", None).await.unwrap();
    assert_eq!(stored, vec!["https://a.example/1"]);
}

#[tokio::test]
async fn test_invalid_origin_is_validation_error() {
    let (service, _db, _temp_dir) = setup().await;

    let err = service
        .submit("not a url", &urls(&["https://a.example/1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation { .. }));

    let err = service.retrieve("ftp://example.com/", None).await.unwrap_err();
    assert!(matches!(err, IngestError::Validation { .. }));

    let err = service.retrieve(THREAD_PAGE_TWO, Some(0)).await.unwrap_err();
    assert!(matches!(err, IngestError::Validation { .. }));
}

#[tokio::test]
async fn test_oversized_batch_is_rejected() {
    let (service, db, _temp_dir) = setup().await;
    let service = service.with_max_urls(2);

    let err = service
        .submit(
            THREAD_PAGE_TWO,
            &urls(&["https://a.example/1", "https://a.example/2", "https://a.example/3"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation { .. }));
    assert_eq!(count_forum_urls(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cache_rebuilt_on_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("restart.sqlite");
    let batch = urls(&["https://a.example/1", "https://a.example/2"]);

    {
        let db = Database::new(&db_path).await.unwrap();
        let service = IngestService::new(db.clone()).await.unwrap();
        assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 2);
        assert_eq!(
            service
                .submit("https://blog.example.com/", &batch)
                .await
                .unwrap(),
            2
        );
        db.pool().close().await;
    }

    let db = Database::new(&db_path).await.unwrap();
    let service = IngestService::new(db).await.unwrap();
    assert_eq!(service.known_pairs().await, 4);

    assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 0);
    assert_eq!(
        service
            .submit("https://blog.example.com/", &batch)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_row_missing_from_cache_is_not_counted() {
    let (service, db, _temp_dir) = setup().await;

    // Written behind the service's back, so the cache does not know about it.
    let thread = ForumThread::from_url(&Url::parse(THREAD_PAGE_TWO).unwrap()).unwrap();
    let mut conn = db.pool().acquire().await.unwrap();
    insert_forum_url(&mut conn, &thread, "https://a.example/1", "2024-01-01T00:00:00+00:00")
        .await
        .unwrap();
    drop(conn);

    let batch = urls(&["https://a.example/1", "https://a.example/2"]);
    assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 1);
    assert_eq!(service.known_pairs().await, 2);
    assert_eq!(service.submit(THREAD_PAGE_TWO, &batch).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_store_once() {
    let (service, db, _temp_dir) = setup().await;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .submit(THREAD_PAGE_TWO, &urls(&["https://a.example/shared"]))
                .await
                .unwrap()
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }

    assert_eq!(total, 1);
    assert_eq!(count_forum_urls(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_submission_leaves_storage_and_cache_unchanged() {
    let (service, db, _temp_dir) = setup().await;
    let origin = "https://blog.example.com/post";
    let batch = urls(&["https://a.example/1", "https://a.example/2"]);

    // Fails the second insert after the first has already run.
    sqlx::query(
        r"
        CREATE TRIGGER reject_url BEFORE INSERT ON other_urls
        WHEN NEW.url = 'https://a.example/2'
        BEGIN SELECT RAISE(ABORT, 'rejected'); END
        ",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = service.submit(origin, &batch).await.unwrap_err();
    assert!(matches!(err, IngestError::Storage(_)));
    assert_eq!(count_other_urls(db.pool()).await.unwrap(), 0);
    assert_eq!(service.known_pairs().await, 0);

    sqlx::query("DROP TRIGGER reject_url")
        .execute(db.pool())
        .await
        .unwrap();

    assert_eq!(service.submit(origin, &batch).await.unwrap(), 2);
    assert_eq!(count_other_urls(db.pool()).await.unwrap(), 2);
}
