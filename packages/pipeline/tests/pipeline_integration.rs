//! Integration tests for the full scrape pipeline.
//!
//! These tests drive the whole loop against in-memory stores and a
//! scripted source:
//! 1. Fetch active configs
//! 2. Extract pages under rate limiting and the worker pool
//! 3. Canonicalize and deduplicate per tenant
//! 4. Classify terminal outcomes and touch last_run

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use pipeline::testing::MockSource;
use pipeline::{
    ConfigOutcome, ExtractError, JobStatus, MemoryStore, Pipeline, PipelineConfig, RawRecord,
    SearchConfig,
};

fn fast_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_source_spacing(Duration::from_millis(1))
        .with_fetch_timeout(Duration::from_secs(1))
        .with_storage_timeout(Duration::from_secs(1))
}

fn build_pipeline(
    store: Arc<MemoryStore>,
    source: MockSource,
    config: PipelineConfig,
) -> Pipeline<MemoryStore, MemoryStore> {
    Pipeline::with_config(store.clone(), store, Arc::new(source), config)
}

fn record(n: u32) -> RawRecord {
    RawRecord::new(
        format!("Engineer {n}"),
        "Acme",
        "Berlin",
        format!("https://example.com/jobs/{n}"),
        "mock",
    )
}

#[tokio::test]
async fn test_second_run_inserts_nothing_new() {
    let store = Arc::new(MemoryStore::new());
    store.add_config(SearchConfig::new(Uuid::new_v4(), "rust", "Berlin"));

    let source = MockSource::new("mock").with_page("rust", 1, vec![record(1), record(2)]);
    let pipeline = build_pipeline(store.clone(), source, fast_config());

    let first = pipeline.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(first.total_inserted(), 2);
    assert_eq!(store.job_count(), 2);

    let second = pipeline.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_duplicate(), 2);
    assert!(second.is_success());
    assert_eq!(store.job_count(), 2);
}

#[tokio::test]
async fn test_rescrape_preserves_tenant_status() {
    let store = Arc::new(MemoryStore::new());
    let owner = Uuid::new_v4();
    store.add_config(SearchConfig::new(owner, "rust", "Berlin"));

    let source = MockSource::new("mock").with_page("rust", 1, vec![record(1)]);
    let pipeline = build_pipeline(store.clone(), source, fast_config());

    pipeline.run(&CancellationToken::new()).await.unwrap();

    // Tenant marks the job applied between runs
    let mut job = store.jobs_for_owner(owner).remove(0);
    job.status = JobStatus::Applied;
    store.put_job(job);

    pipeline.run(&CancellationToken::new()).await.unwrap();

    let jobs = store.jobs_for_owner(owner);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Applied);
}

#[tokio::test]
async fn test_identical_searches_stay_per_tenant() {
    let store = Arc::new(MemoryStore::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    store.add_config(SearchConfig::new(alice, "rust", "Berlin"));
    store.add_config(SearchConfig::new(bob, "rust", "Berlin"));

    let source = MockSource::new("mock").with_page("rust", 1, vec![record(1)]);
    let pipeline = build_pipeline(store.clone(), source, fast_config());

    let report = pipeline.run(&CancellationToken::new()).await.unwrap();

    // Same posting, but each tenant gets their own row
    assert_eq!(report.total_inserted(), 2);
    assert_eq!(store.jobs_for_owner(alice).len(), 1);
    assert_eq!(store.jobs_for_owner(bob).len(), 1);
    assert_ne!(
        store.jobs_for_owner(alice)[0].id,
        store.jobs_for_owner(bob)[0].id
    );
}

#[tokio::test]
async fn test_sibling_configs_survive_one_blocked_config() {
    let store = Arc::new(MemoryStore::new());
    store.add_config(SearchConfig::new(Uuid::new_v4(), "rust", "Berlin").with_max_pages(3));
    store.add_config(SearchConfig::new(Uuid::new_v4(), "go", "Berlin"));

    let source = MockSource::new("mock")
        .with_page("rust", 1, vec![record(1), record(2)])
        .with_failure("rust", 2, ExtractError::Network("connection reset".into()))
        .with_page("go", 1, vec![record(3)]);

    let pipeline = build_pipeline(store.clone(), source, fast_config());
    let report = pipeline.run(&CancellationToken::new()).await.unwrap();

    // The failing config keeps its page-1 inserts
    assert_eq!(report.count(ConfigOutcome::PartiallySucceeded), 1);
    assert_eq!(report.count(ConfigOutcome::Succeeded), 1);
    assert_eq!(store.job_count(), 3);
}

#[tokio::test]
async fn test_worker_pool_bounds_concurrent_fetches() {
    let store = Arc::new(MemoryStore::new());
    for n in 0..5 {
        store.add_config(SearchConfig::new(Uuid::new_v4(), format!("kw-{n}"), "Berlin"));
    }

    let source = MockSource::new("mock").with_fetch_delay(Duration::from_millis(50));
    let handle = source.clone();

    let pipeline = build_pipeline(
        store,
        source,
        fast_config().with_max_concurrency(2),
    );
    pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(handle.pages_fetched(), 5);
    assert!(handle.max_concurrent_fetches() <= 2);
    // Five waiting configs against two permits saturates the pool
    assert_eq!(handle.max_concurrent_fetches(), 2);
}

#[tokio::test]
async fn test_cancellation_reports_what_each_config_had() {
    let store = Arc::new(MemoryStore::new());
    store.add_config(SearchConfig::new(Uuid::new_v4(), "rust", "Berlin").with_max_pages(5));

    let source = MockSource::new("mock")
        .with_page("rust", 1, vec![record(1)])
        .with_page("rust", 2, vec![record(2)])
        .with_page("rust", 3, vec![record(3)])
        .with_page("rust", 4, vec![record(4)])
        .with_page("rust", 5, vec![record(5)])
        .with_fetch_delay(Duration::from_millis(30));

    let pipeline = build_pipeline(store.clone(), source, fast_config());
    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();

    let run = tokio::spawn(async move { pipeline.run(&run_cancel).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let report = run.await.unwrap().unwrap();

    // Cancellation is not a fault; the config reports what it got
    let outcome = &report.outcomes[0];
    assert!(outcome.error.is_none());
    assert!(outcome.records_inserted < 5);
    assert_eq!(store.job_count(), outcome.records_inserted);
}

#[tokio::test]
async fn test_last_run_recorded_for_failed_configs() {
    let store = Arc::new(MemoryStore::new());
    let config = SearchConfig::new(Uuid::new_v4(), "rust", "Berlin");
    let config_id = config.id;
    store.add_config(config);

    let source =
        MockSource::new("mock").with_failure("rust", 1, ExtractError::Blocked("HTTP 403".into()));

    let pipeline = build_pipeline(store.clone(), source, fast_config());
    let report = pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.outcomes[0].outcome, ConfigOutcome::Failed);
    assert!(store.config(config_id).unwrap().last_run_at.is_some());
}
