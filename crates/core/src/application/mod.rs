// Application Layer - Use Cases and Business Logic

pub mod cancellation;
pub mod constants;
pub mod dedup;
pub mod fetch;
pub mod matching;
pub mod normalizer;
pub mod pipeline;
pub mod rate_limiter;
pub mod retry;
pub mod service;
pub mod skill_gap;

// Re-exports
pub use cancellation::{cancellation_channel, CancelHandle, CancellationToken};
pub use dedup::{Absorbed, Deduplicator};
pub use matching::{MatchWeights, MatchingEngine, SkillMatchMode};
pub use normalizer::{NormalizeError, Normalizer};
pub use pipeline::{AggregationPipeline, RunSummary, SourceReport, SourceStatus};
pub use rate_limiter::{Throttled, TokenBucket};
pub use retry::{RetryDecision, RetryPolicy};
pub use service::MatchService;
pub use skill_gap::SkillGapAnalyzer;
