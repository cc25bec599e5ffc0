// Application constants (No magic values)
use std::time::Duration;

/// Default cap on sources fetched concurrently in one cycle
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Upper bound on pages read from one source per cycle when the source sets no limit
pub const DEFAULT_MAX_PAGES: u32 = 20;

/// Longest wait for the optional enrichment collaborator per posting
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default learning-path length
pub const DEFAULT_TOP_N_GAPS: usize = 10;

/// Match weights (must sum to 1.0)
pub const SKILLS_WEIGHT: f64 = 0.40;
pub const EXPERIENCE_WEIGHT: f64 = 0.25;
pub const LOCATION_WEIGHT: f64 = 0.20;
pub const SALARY_WEIGHT: f64 = 0.15;

/// Partial (containment) skill matches count this much of an exact match
pub const PARTIAL_SKILL_CREDIT: f64 = 0.75;

/// Experience penalty per level of ordinal distance
pub const EXPERIENCE_PENALTY_PER_LEVEL: f64 = 25.0;

/// Neutral sub-scores used when posting or profile data is absent
pub const NEUTRAL_SKILLS_SCORE: f64 = 50.0;
pub const NEUTRAL_EXPERIENCE_SCORE: f64 = 80.0;
pub const NEUTRAL_LOCATION_SCORE: f64 = 70.0;

/// Location tiers
pub const LOCATION_PARTIAL_SCORE: f64 = 75.0;
pub const LOCATION_MISMATCH_SCORE: f64 = 40.0;

/// Level gap at which a recommendation note is attached
pub const EXPERIENCE_NOTE_GAP: i16 = 2;

/// Working hours per year, for annualizing hourly salaries
pub const HOURS_PER_YEAR: i64 = 2080;
