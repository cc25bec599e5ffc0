// Run Summary (returned to the scheduler trigger instead of raw errors)

use crate::application::fetch::PageFailure;
use serde::Serialize;

/// How one source's run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Every page was read
    Completed,
    /// Some pages were stored before retries ran out
    Partial { reason: String },
    /// Rate-limit wait exceeded; skipped for this cycle
    Throttled,
    /// Nothing could be read (bad config, unreachable source, panic)
    Failed { reason: String },
    /// Cancellation observed; work done before it is kept
    Cancelled,
    /// Source disabled in configuration
    Disabled,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Completed => "completed",
            SourceStatus::Partial { .. } => "partial",
            SourceStatus::Throttled => "throttled",
            SourceStatus::Failed { .. } => "failed",
            SourceStatus::Cancelled => "cancelled",
            SourceStatus::Disabled => "disabled",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceStatus::Failed { .. } | SourceStatus::Partial { .. })
    }
}

/// Per-source counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub status: SourceStatus,
    /// Entries parsed from fetched pages
    pub fetched: u64,
    /// Entries dropped by the adapter or normalizer
    pub dropped_malformed: u64,
    /// Entries not matching the source's keyword query
    pub filtered: u64,
    /// Repeats within this source's own fetch
    pub duplicates: u64,
    pub inserted: u64,
    pub merged: u64,
    pub unchanged: u64,
    pub storage_errors: u64,
    pub enrichment_failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_failure: Option<String>,
}

impl SourceReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: SourceStatus::Completed,
            fetched: 0,
            dropped_malformed: 0,
            filtered: 0,
            duplicates: 0,
            inserted: 0,
            merged: 0,
            unchanged: 0,
            storage_errors: 0,
            enrichment_failures: 0,
            page_failure: None,
        }
    }

    pub fn with_status(mut self, status: SourceStatus) -> Self {
        self.status = status;
        self
    }

    /// Postings written or confirmed in storage
    pub fn stored(&self) -> u64 {
        self.inserted + self.merged + self.unchanged
    }

    pub(crate) fn record_page_failure(&mut self, failure: &PageFailure) {
        let reason = format!(
            "page {} failed after {} attempt(s): {}",
            failure.page, failure.attempts, failure.error
        );
        self.status = if self.fetched > 0 {
            SourceStatus::Partial {
                reason: reason.clone(),
            }
        } else {
            SourceStatus::Failed {
                reason: reason.clone(),
            }
        };
        self.page_failure = Some(reason);
    }
}

/// Aggregate result of one aggregation cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub cancelled: bool,
    /// In configuration order
    pub sources: Vec<SourceReport>,
}

impl RunSummary {
    pub fn total_fetched(&self) -> u64 {
        self.sources.iter().map(|s| s.fetched).sum()
    }

    pub fn total_inserted(&self) -> u64 {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn total_merged(&self) -> u64 {
        self.sources.iter().map(|s| s.merged).sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.sources.iter().map(|s| s.dropped_malformed).sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.status.is_failure())
            .map(|s| s.source.as_str())
            .collect()
    }

    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == name)
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }
}
