// Aggregation Pipeline
//
// adapters -> rate limiter -> normalizer -> deduplicator -> repository upsert,
// one task per source with bounded parallelism. Per-source failures (bad
// config, unreachable source, even a panic) end up in the run summary and
// never abort the cycle.

mod source_run;
pub mod summary;

pub use summary::{RunSummary, SourceReport, SourceStatus};

use super::cancellation::CancellationToken;
use super::constants::DEFAULT_MAX_CONCURRENCY;
use super::rate_limiter::TokenBucket;
use crate::domain::{RateLimitConfig, SourceConfig};
use crate::port::{AdapterFactory, EnrichmentService, IdProvider, JobRepository, TimeProvider};
use futures::FutureExt;
use source_run::SourceRun;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub struct AggregationPipeline {
    repository: Arc<dyn JobRepository>,
    adapters: Arc<dyn AdapterFactory>,
    enrichment: Option<Arc<dyn EnrichmentService>>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    max_concurrency: usize,
    /// Buckets survive across cycles so back-to-back runs respect source limits
    limiters: Mutex<HashMap<String, (RateLimitConfig, Arc<TokenBucket>)>>,
}

impl AggregationPipeline {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        adapters: Arc<dyn AdapterFactory>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            repository,
            adapters,
            enrichment: None,
            id_provider,
            time_provider,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_enrichment(mut self, enrichment: Arc<dyn EnrichmentService>) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Bucket for a source, rebuilt when its rate-limit settings change
    fn limiter_for(&self, config: &SourceConfig) -> Arc<TokenBucket> {
        let mut limiters = match self.limiters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match limiters.get(&config.name) {
            Some((settings, bucket)) if *settings == config.rate_limit => Arc::clone(bucket),
            _ => {
                let bucket = Arc::new(TokenBucket::from_config(&config.rate_limit));
                limiters.insert(
                    config.name.clone(),
                    (config.rate_limit.clone(), Arc::clone(&bucket)),
                );
                bucket
            }
        }
    }

    /// Prepare a source for execution, or report why it cannot run
    fn prepare(&self, config: &SourceConfig, cancel: &CancellationToken) -> Result<SourceRun, SourceReport> {
        let report = || SourceReport::new(&config.name);

        if !config.enabled {
            return Err(report().with_status(SourceStatus::Disabled));
        }
        if let Err(err) = config.validate() {
            warn!(source = %config.name, error = %err, "Invalid source configuration");
            return Err(report().with_status(SourceStatus::Failed {
                reason: err.to_string(),
            }));
        }
        let adapter = self.adapters.build(config).map_err(|err| {
            warn!(source = %config.name, error = %err, "Adapter construction failed");
            report().with_status(SourceStatus::Failed {
                reason: err.to_string(),
            })
        })?;

        Ok(SourceRun {
            config: config.clone(),
            adapter,
            limiter: self.limiter_for(config),
            repository: Arc::clone(&self.repository),
            enrichment: self.enrichment.clone(),
            id_provider: Arc::clone(&self.id_provider),
            cancel: cancel.clone(),
        })
    }

    /// Single entry point for the scheduler trigger.
    ///
    /// Never returns an error: every per-source problem is recorded in the
    /// summary. Sources are reported in configuration order.
    pub async fn run_aggregation_cycle(
        &self,
        sources: &[SourceConfig],
        cancel: CancellationToken,
    ) -> RunSummary {
        let run_id = self.id_provider.generate_id();
        let started_at = self.time_provider.now_millis();
        info!(run_id = %run_id, sources = sources.len(), "Aggregation cycle started");

        let mut reports: Vec<Option<SourceReport>> = vec![None; sources.len()];
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, config) in sources.iter().enumerate() {
            let run = match self.prepare(config, &cancel) {
                Ok(run) => run,
                Err(report) => {
                    reports[index] = Some(report);
                    continue;
                }
            };

            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let name = config.name.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, SourceReport::new(&name).with_status(SourceStatus::Cancelled));
                };
                if cancel.is_cancelled() {
                    return (index, SourceReport::new(&name).with_status(SourceStatus::Cancelled));
                }

                match AssertUnwindSafe(run.execute()).catch_unwind().await {
                    Ok(report) => (index, report),
                    Err(payload) => {
                        let message = panic_message(payload);
                        error!(source = %name, panic_msg = %message, "Source task panicked");
                        let report = SourceReport::new(&name).with_status(SourceStatus::Failed {
                            reason: format!("panicked: {message}"),
                        });
                        (index, report)
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                // Only reachable if the runtime aborts the task on shutdown
                Err(err) => error!(error = %err, "Source task did not complete"),
            }
        }

        let sources: Vec<SourceReport> = reports
            .into_iter()
            .zip(sources)
            .map(|(report, config)| {
                report.unwrap_or_else(|| {
                    SourceReport::new(&config.name).with_status(SourceStatus::Failed {
                        reason: "task aborted".to_string(),
                    })
                })
            })
            .collect();

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: self.time_provider.now_millis(),
            cancelled: cancel.is_cancelled(),
            sources,
        };

        info!(
            run_id = %summary.run_id,
            fetched = summary.total_fetched(),
            inserted = summary.total_inserted(),
            merged = summary.total_merged(),
            dropped = summary.total_dropped(),
            failed_sources = summary.failed_sources().len(),
            cancelled = summary.cancelled,
            "Aggregation cycle finished"
        );
        summary
    }
}

/// Extract a readable message from a panic payload
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
