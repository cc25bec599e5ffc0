// Match Result Domain Model

use super::posting::PostingId;
use super::profile::ExperienceLevel;
use serde::{Deserialize, Serialize};

/// Per-component sub-scores, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub skills: u8,
    pub experience: u8,
    pub location: u8,
    pub salary: u8,
}

/// Result of scoring one profile against one posting.
///
/// Created fresh on every computation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub posting_id: PostingId,
    pub score: u8,
    pub subscores: SubScores,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub detected_level: Option<ExperienceLevel>,
    pub recommendation: Option<String>,
}
