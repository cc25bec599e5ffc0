// Domain Layer - Pure business logic and entities

pub mod error;
pub mod match_result;
pub mod merge;
pub mod posting;
pub mod profile;
pub mod raw;
pub mod skill;
pub mod skill_catalog;
pub mod skill_gap;
pub mod source;

// Re-exports
pub use error::DomainError;
pub use match_result::{MatchResult, SubScores};
pub use merge::merge_postings;
pub use posting::{Fingerprint, JobPosting, PostingId, SalaryRange, SourceName};
pub use profile::{CandidateProfile, ExperienceLevel};
pub use raw::{Page, PageCursor, RawPosting};
pub use skill::SkillSet;
pub use skill_catalog::SkillCategory;
pub use skill_gap::{
    EffortEstimate, ImprovementPotential, LearningStep, SkillGapAnalysis, SkillGapReport,
    SkillImportance,
};
pub use source::{
    AdapterKind, ConnectionParams, FieldMapping, RateLimitConfig, RetryConfig, ScrapeSelectors,
    SourceConfig, SourceQuery,
};
