// Enrichment Service Port (optional collaborator)
// The normalizer works without it; every failure falls back to the un-enriched posting

use crate::domain::{ExperienceLevel, SalaryRange};
use async_trait::async_trait;
use thiserror::Error;

/// Fields an enrichment service may contribute.
///
/// `None` / empty means "no opinion"; present values only fill gaps and
/// never overwrite what the source mapping already produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialJobPosting {
    pub skills: Vec<String>,
    pub salary: Option<SalaryRange>,
    pub experience_level: Option<ExperienceLevel>,
    pub remote: Option<bool>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("Enrichment unavailable: {0}")]
    Unavailable(String),

    #[error("Enrichment rejected input: {0}")]
    Rejected(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(&self, raw_text: &str) -> Result<PartialJobPosting, EnrichmentError>;
}

/// No-op fallback: contributes nothing
pub struct NoopEnrichment;

#[async_trait]
impl EnrichmentService for NoopEnrichment {
    async fn enrich(&self, _raw_text: &str) -> Result<PartialJobPosting, EnrichmentError> {
        Ok(PartialJobPosting::default())
    }
}
