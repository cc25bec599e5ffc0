//! Shared fixtures: SQLite-backed pipeline over scripted sources

#![allow(dead_code)]

use jobmatch_core::application::AggregationPipeline;
use jobmatch_core::domain::{AdapterKind, SourceConfig};
use jobmatch_core::port::source_adapter::mocks::StaticAdapterFactory;
use jobmatch_core::port::{SequentialIdProvider, SourceAdapter, SystemTimeProvider};
use jobmatch_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn memory_repository() -> Arc<SqliteJobRepository> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteJobRepository::new(pool, Arc::new(SystemTimeProvider)))
}

pub fn pipeline(
    repository: Arc<SqliteJobRepository>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
) -> AggregationPipeline {
    let factory = adapters
        .into_iter()
        .fold(StaticAdapterFactory::new(), |f, a| f.with(a));
    AggregationPipeline::new(
        repository,
        Arc::new(factory),
        Arc::new(SequentialIdProvider::new("posting")),
        Arc::new(SystemTimeProvider),
    )
}

/// API source with fast retries and a generous rate limit
pub fn source(name: &str) -> SourceConfig {
    let mut config = SourceConfig::new(name, AdapterKind::Api);
    config.connection.url = Some(format!("https://{name}.example.com/api"));
    config.rate_limit.requests = 100;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

/// Entry in the default API field layout
pub fn entry(title: &str, company: &str, location: &str, tags: &[&str], date: &str) -> Value {
    json!({
        "position": title,
        "company": company,
        "location": location,
        "tags": tags,
        "date": date,
        "description": format!("{title} role at {company}")
    })
}
