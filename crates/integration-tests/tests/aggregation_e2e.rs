//! End-to-end aggregation over SQLite storage

mod common;

use common::{entry, memory_repository, pipeline, source};
use jobmatch_core::application::{cancellation_channel, CancellationToken, SourceStatus};
use jobmatch_core::domain::Fingerprint;
use jobmatch_core::port::source_adapter::mocks::{ScriptedAdapter, ScriptedPage};
use jobmatch_core::port::{FetchError, JobRepository, PostingFilter, SystemTimeProvider};
use jobmatch_infra_sqlite::{open_database, run_migrations, SqliteJobRepository};
use std::sync::Arc;

#[tokio::test]
async fn test_sources_are_merged_into_one_store() {
    let repo = memory_repository().await;
    let pipeline = pipeline(
        repo.clone(),
        vec![
            Arc::new(ScriptedAdapter::with_pages(
                "remote-api",
                vec![
                    vec![
                        entry("Backend Engineer", "Acme", "Remote", &["rust", "sql"], "2024-03-01"),
                        entry("Data Engineer", "Globex", "Berlin", &["python"], "2024-03-02"),
                    ],
                    vec![entry("SRE", "Initech", "Remote", &["kubernetes"], "2024-03-03")],
                ],
            )),
            Arc::new(ScriptedAdapter::with_pages(
                "board",
                vec![vec![
                    // Same posting as remote-api's first entry
                    entry("backend engineer", "ACME", "remote", &["aws"], "2024-03-05"),
                ]],
            )),
        ],
    );

    let summary = pipeline
        .run_aggregation_cycle(&[source("remote-api"), source("board")], CancellationToken::never())
        .await;

    assert!(summary.failed_sources().is_empty());
    assert_eq!(summary.total_fetched(), 4);
    assert_eq!(repo.count().await.unwrap(), 3);

    let merged = repo
        .find_by_fingerprint(&Fingerprint::compute("Backend Engineer", "Acme", "Remote"))
        .await
        .unwrap()
        .expect("merged posting");
    let skills: Vec<_> = merged.skills.iter().collect();
    assert_eq!(skills, vec!["aws", "rust", "sql"]);
    assert!(merged.latest_posted_at > merged.posted_at);

    let listed = repo.query(&PostingFilter::default()).await.unwrap();
    assert_eq!(listed[0].id, merged.id, "most recent posting listed first");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let repo = memory_repository().await;
    let pipeline = pipeline(
        repo.clone(),
        vec![Arc::new(ScriptedAdapter::with_pages(
            "remote-api",
            vec![vec![
                entry("Backend Engineer", "Acme", "Remote", &["rust"], "2024-03-01"),
                entry("Frontend Engineer", "Acme", "Remote", &["react"], "2024-03-01"),
            ]],
        ))],
    );
    let sources = [source("remote-api")];

    let first = pipeline.run_aggregation_cycle(&sources, CancellationToken::never()).await;
    let before = repo.query(&PostingFilter::default()).await.unwrap();
    let second = pipeline.run_aggregation_cycle(&sources, CancellationToken::never()).await;
    let after = repo.query(&PostingFilter::default()).await.unwrap();

    assert_eq!(first.total_inserted(), 2);
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_merged(), 0);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_failing_source_does_not_block_others() {
    let repo = memory_repository().await;
    let flaky = Arc::new(ScriptedAdapter::new(
        "flaky",
        vec![
            vec![ScriptedPage::Entries(vec![entry(
                "QA Engineer",
                "Hooli",
                "Lisbon",
                &["selenium"],
                "2024-03-01",
            )])],
            vec![ScriptedPage::Fail(FetchError::Http {
                status: 503,
                message: "unavailable".to_string(),
            })],
        ],
    ));
    let down = Arc::new(ScriptedAdapter::unreachable("down"));
    let pipeline = pipeline(
        repo.clone(),
        vec![
            down.clone(),
            flaky.clone(),
            Arc::new(ScriptedAdapter::with_pages(
                "healthy",
                vec![vec![entry("PM", "Umbrella", "Remote", &[], "2024-03-01")]],
            )),
        ],
    );

    let summary = pipeline
        .run_aggregation_cycle(
            &[source("down"), source("flaky"), source("healthy")],
            CancellationToken::never(),
        )
        .await;

    assert!(matches!(
        summary.source("down").unwrap().status,
        SourceStatus::Failed { .. }
    ));
    assert_eq!(down.call_count(), 5);
    assert!(matches!(
        summary.source("flaky").unwrap().status,
        SourceStatus::Partial { .. }
    ));
    assert_eq!(summary.source("healthy").unwrap().status, SourceStatus::Completed);
    // Page one of the flaky source is kept
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_cancelled_cycle_stores_nothing_new() {
    let repo = memory_repository().await;
    let adapter = Arc::new(ScriptedAdapter::with_pages(
        "remote-api",
        vec![vec![entry("Backend Engineer", "Acme", "Remote", &[], "2024-03-01")]],
    ));
    let pipeline = pipeline(repo.clone(), vec![adapter.clone()]);

    let (handle, token) = cancellation_channel();
    handle.cancel();
    let summary = pipeline.run_aggregation_cycle(&[source("remote-api")], token).await;

    assert!(summary.cancelled);
    assert_eq!(adapter.call_count(), 0);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_postings_survive_reopen() {
    let path = std::env::temp_dir()
        .join(format!("jobmatch-e2e-{}", uuid::Uuid::new_v4()))
        .join("jobmatch.db");

    {
        let pool = open_database(&path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqliteJobRepository::new(pool.clone(), Arc::new(SystemTimeProvider)));
        let pipeline = pipeline(
            repo,
            vec![Arc::new(ScriptedAdapter::with_pages(
                "remote-api",
                vec![vec![entry("Backend Engineer", "Acme", "Remote", &["rust"], "2024-03-01")]],
            ))],
        );
        pipeline
            .run_aggregation_cycle(&[source("remote-api")], CancellationToken::never())
            .await;
        pool.close().await;
    }

    let pool = open_database(&path).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = SqliteJobRepository::new(pool, Arc::new(SystemTimeProvider));

    let postings = repo.query(&PostingFilter::default()).await.unwrap();
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].title(), "Backend Engineer");
    assert!(postings[0].skills.contains("rust"));

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
