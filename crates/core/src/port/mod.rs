// Port Layer - Interfaces for external dependencies

pub mod enrichment;
pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod source_adapter;
pub mod time_provider;

// Re-exports
pub use enrichment::{EnrichmentError, EnrichmentService, NoopEnrichment, PartialJobPosting};
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use job_repository::{JobRepository, PostingFilter, UpsertAction, UpsertOutcome};
pub use source_adapter::{AdapterBuildError, AdapterFactory, FetchError, SourceAdapter};
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
