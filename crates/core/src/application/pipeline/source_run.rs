// One source's trip through fetch -> normalize -> dedup -> upsert

use super::summary::{SourceReport, SourceStatus};
use crate::application::cancellation::CancellationToken;
use crate::application::constants::{DEFAULT_MAX_PAGES, ENRICHMENT_TIMEOUT};
use crate::application::dedup::{Absorbed, Deduplicator};
use crate::application::fetch::{FetchEvent, SourceFetcher};
use crate::application::normalizer::{apply_enrichment, Normalizer};
use crate::application::rate_limiter::TokenBucket;
use crate::application::retry::RetryPolicy;
use crate::domain::{JobPosting, SourceConfig};
use crate::port::{EnrichmentService, IdProvider, JobRepository, SourceAdapter, UpsertAction};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub(super) struct SourceRun {
    pub config: SourceConfig,
    pub adapter: Arc<dyn SourceAdapter>,
    pub limiter: Arc<TokenBucket>,
    pub repository: Arc<dyn JobRepository>,
    pub enrichment: Option<Arc<dyn EnrichmentService>>,
    pub id_provider: Arc<dyn IdProvider>,
    pub cancel: CancellationToken,
}

impl SourceRun {
    pub async fn execute(self) -> SourceReport {
        let source = self.config.name.clone();
        let mut report = SourceReport::new(&source);

        let fetcher = SourceFetcher::new(
            Arc::clone(&self.adapter),
            Arc::clone(&self.limiter),
            RetryPolicy::from_config(&self.config.retry, &source),
            Duration::from_millis(self.config.rate_limit.acquire_timeout_ms),
            self.config.connection.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            self.cancel.clone(),
        );
        let normalizer = Normalizer::new(&self.config, Arc::clone(&self.id_provider));
        let mut dedup = Deduplicator::new();
        let limit = self.config.query.limit;

        let mut events = Box::pin(fetcher.into_stream(self.config.query.clone(), None));

        while let Some(event) = events.next().await {
            match event {
                FetchEvent::Entry(raw) => {
                    report.fetched += 1;

                    let posting = match normalizer.normalize(&raw) {
                        Ok(posting) => posting,
                        Err(err) => {
                            report.dropped_malformed += 1;
                            warn!(source = %source, reason = %err, "Dropping record");
                            continue;
                        }
                    };

                    if !self.matches_query(&posting) {
                        report.filtered += 1;
                        continue;
                    }

                    let posting = self.enrich(posting, &mut report).await;

                    match dedup.absorb(posting) {
                        Absorbed::New(posting) | Absorbed::Merged(posting) => {
                            self.store(&posting, &mut report).await;
                        }
                        Absorbed::Duplicate => report.duplicates += 1,
                    }

                    if limit.is_some_and(|limit| dedup.len() >= limit) {
                        debug!(source = %source, limit = ?limit, "Query limit reached");
                        break;
                    }
                }
                FetchEvent::Malformed { .. } => report.dropped_malformed += 1,
                FetchEvent::PageFailed(failure) => report.record_page_failure(&failure),
                FetchEvent::Throttled(_) => report.status = SourceStatus::Throttled,
                FetchEvent::Cancelled => report.status = SourceStatus::Cancelled,
            }
        }

        info!(
            source = %source,
            status = report.status.as_str(),
            fetched = report.fetched,
            inserted = report.inserted,
            merged = report.merged,
            unchanged = report.unchanged,
            duplicates = report.duplicates,
            dropped = report.dropped_malformed,
            "Source run finished"
        );
        report
    }

    fn matches_query(&self, posting: &JobPosting) -> bool {
        let query = &self.config.query;
        if !query.has_keywords() {
            return true;
        }
        let skills = posting.skills.to_vec().join(" ");
        let haystack = format!("{} {} {}", posting.title(), posting.description, skills);
        query.matches_keywords(&haystack)
    }

    async fn enrich(&self, posting: JobPosting, report: &mut SourceReport) -> JobPosting {
        let Some(enrichment) = &self.enrichment else {
            return posting;
        };

        let text = format!("{}\n{}", posting.title(), posting.description);
        match tokio::time::timeout(ENRICHMENT_TIMEOUT, enrichment.enrich(&text)).await {
            Ok(Ok(partial)) => apply_enrichment(posting, partial),
            Ok(Err(err)) => {
                report.enrichment_failures += 1;
                debug!(source = %self.config.name, error = %err, "Enrichment failed, keeping source data");
                posting
            }
            Err(_) => {
                report.enrichment_failures += 1;
                debug!(source = %self.config.name, "Enrichment timed out, keeping source data");
                posting
            }
        }
    }

    async fn store(&self, posting: &JobPosting, report: &mut SourceReport) {
        match self.repository.upsert(posting).await {
            Ok(outcome) => match outcome.action {
                UpsertAction::Inserted => report.inserted += 1,
                UpsertAction::Merged => report.merged += 1,
                UpsertAction::Unchanged => report.unchanged += 1,
            },
            Err(err) => {
                report.storage_errors += 1;
                warn!(
                    source = %self.config.name,
                    fingerprint = %posting.fingerprint().short(),
                    error = %err,
                    "Upsert failed"
                );
            }
        }
    }
}
