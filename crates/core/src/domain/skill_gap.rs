// Skill Gap Report Domain Model

use super::skill_catalog::{skill_category, SkillCategory};
use serde::{Deserialize, Serialize};

/// A missing skill and how often target postings require it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillImportance {
    pub skill: String,
    /// Number of target postings requiring the skill
    pub frequency: usize,
    /// Frequency normalized to the target-set size, 0..=100
    pub importance: u8,
}

/// Rough learning effort for a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortEstimate {
    Days,
    Weeks,
    Months,
}

impl EffortEstimate {
    pub fn for_skill(skill: &str) -> Self {
        match skill_category(skill) {
            Some(SkillCategory::Language) | Some(SkillCategory::DataScience) => {
                EffortEstimate::Months
            }
            Some(SkillCategory::Tooling) => EffortEstimate::Days,
            Some(SkillCategory::Framework)
            | Some(SkillCategory::Database)
            | Some(SkillCategory::Cloud)
            | None => EffortEstimate::Weeks,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffortEstimate::Days => "days",
            EffortEstimate::Weeks => "weeks",
            EffortEstimate::Months => "months",
        }
    }
}

/// One learning-path entry (priority 1 = learn first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStep {
    pub skill: String,
    pub priority: usize,
    pub importance: u8,
    pub effort: EffortEstimate,
}

/// Average skills sub-score before and after closing the top gaps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPotential {
    pub current_average: f64,
    pub projected_average: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
    pub jobs_analyzed: usize,
    pub ranked_gaps: Vec<SkillImportance>,
    pub learning_path: Vec<LearningStep>,
    pub improvement: ImprovementPotential,
}

/// Skill gap report.
///
/// An empty target set yields `NoJobsAnalyzed`, which is distinct from an
/// `Analyzed` report whose gap list happens to be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkillGapReport {
    NoJobsAnalyzed,
    Analyzed(SkillGapAnalysis),
}

impl SkillGapReport {
    pub fn is_analyzed(&self) -> bool {
        matches!(self, SkillGapReport::Analyzed(_))
    }

    pub fn analysis(&self) -> Option<&SkillGapAnalysis> {
        match self {
            SkillGapReport::Analyzed(analysis) => Some(analysis),
            SkillGapReport::NoJobsAnalyzed => None,
        }
    }
}
