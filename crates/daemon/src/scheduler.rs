// Cycle Scheduler
//
// Runs the aggregation pipeline immediately and then on a fixed interval
// until the cancellation token fires.

use jobmatch_core::application::{AggregationPipeline, CancellationToken, RunSummary};
use jobmatch_core::domain::SourceConfig;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Returns the number of cycles that ran
pub async fn run_periodic(
    pipeline: &AggregationPipeline,
    sources: &[SourceConfig],
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    // A slow cycle pushes the next one back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => break,
        }

        let summary = pipeline.run_aggregation_cycle(sources, cancel.clone()).await;
        log_summary(&summary);
        cycles += 1;

        if cancel.is_cancelled() {
            break;
        }
    }

    info!(cycles, "Scheduler stopped");
    cycles
}

fn log_summary(summary: &RunSummary) {
    for report in summary.sources.iter().filter(|r| r.status.is_failure()) {
        warn!(
            run_id = %summary.run_id,
            source = %report.source,
            status = ?report.status,
            "Source did not complete"
        );
    }
    info!(
        run_id = %summary.run_id,
        duration_ms = summary.duration_ms(),
        fetched = summary.total_fetched(),
        inserted = summary.total_inserted(),
        merged = summary.total_merged(),
        dropped = summary.total_dropped(),
        cancelled = summary.cancelled,
        "Cycle summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::application::cancellation_channel;
    use jobmatch_core::domain::AdapterKind;
    use jobmatch_core::port::job_repository::mocks::InMemoryJobRepository;
    use jobmatch_core::port::source_adapter::mocks::StaticAdapterFactory;
    use jobmatch_core::port::{FixedTimeProvider, SequentialIdProvider};
    use std::sync::Arc;

    fn pipeline() -> AggregationPipeline {
        AggregationPipeline::new(
            Arc::new(InMemoryJobRepository::new()),
            Arc::new(StaticAdapterFactory::new()),
            Arc::new(SequentialIdProvider::new("run")),
            Arc::new(FixedTimeProvider::new(0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_on_interval() {
        let pipeline = Arc::new(pipeline());
        let (handle, token) = cancellation_channel();

        let task = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let mut source = SourceConfig::new("feed", AdapterKind::Rss);
                source.enabled = false;
                run_periodic(&pipeline, &[source], Duration::from_secs(60), token).await
            })
        };

        // t=0 and t=60 fire; t=120 has not been reached
        tokio::time::sleep(Duration::from_secs(90)).await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_tick_runs_nothing() {
        let pipeline = pipeline();
        let (handle, token) = cancellation_channel();
        handle.cancel();

        // Both select branches are ready; either way the loop stops after at most one cycle
        let cycles = run_periodic(&pipeline, &[], Duration::from_secs(60), token).await;
        assert!(cycles <= 1);
    }
}
