// Candidate Profile Domain Model

use super::error::{DomainError, Result};
use super::posting::SalaryRange;
use super::skill::{contains_term, SkillSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal experience level (junior < mid < senior < lead)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

/// Keywords that reveal a posting's level, checked most specific first
const LEVEL_KEYWORDS: &[(ExperienceLevel, &[&str])] = &[
    (
        ExperienceLevel::Lead,
        &["lead", "manager", "director", "head", "chief", "vp"],
    ),
    (
        ExperienceLevel::Senior,
        &["senior", "sr", "principal", "staff", "expert", "architect"],
    ),
    (
        ExperienceLevel::Junior,
        &["junior", "jr", "entry", "associate", "trainee", "graduate", "intern"],
    ),
    (
        ExperienceLevel::Mid,
        &["mid", "mid-level", "intermediate", "experienced"],
    ),
];

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
    ];

    pub fn rank(self) -> u8 {
        match self {
            ExperienceLevel::Junior => 0,
            ExperienceLevel::Mid => 1,
            ExperienceLevel::Senior => 2,
            ExperienceLevel::Lead => 3,
        }
    }

    /// Ordinal distance between two levels (0..=3)
    pub fn distance(self, other: ExperienceLevel) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
        }
    }

    /// Detect a level from a posting title (checked first) and description.
    ///
    /// The title is authoritative: "Senior Engineer" whose description mentions
    /// "work with our lead" stays senior.
    pub fn detect(title: &str, description: &str) -> Option<ExperienceLevel> {
        Self::detect_in(&title.to_lowercase()).or_else(|| Self::detect_in(&description.to_lowercase()))
    }

    fn detect_in(text: &str) -> Option<ExperienceLevel> {
        LEVEL_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| contains_term(text, k)))
            .map(|(level, _)| *level)
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = DomainError;

    /// Accepts any detection keyword, so "principal" means the same level
    /// in a profile as in a posting title
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        LEVEL_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.contains(&lowered.as_str()))
            .map(|(level, _)| *level)
            .ok_or(DomainError::InvalidExperienceLevel(lowered))
    }
}

/// Candidate profile: read-only input to matching and skill-gap analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: SkillSet,

    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,

    #[serde(default)]
    pub preferred_locations: Vec<String>,

    #[serde(default)]
    pub salary_expectation: SalaryRange,
}

impl CandidateProfile {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skills: skills.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = Some(level);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.preferred_locations.push(location.into());
        self
    }

    pub fn with_salary(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.salary_expectation.min = min;
        self.salary_expectation.max = max;
        self
    }

    /// Reject profiles the matching boundary cannot interpret
    pub fn validate(&self) -> Result<()> {
        self.salary_expectation.validate()?;

        if self.preferred_locations.iter().any(|l| l.trim().is_empty()) {
            return Err(DomainError::ValidationError(
                "preferred location must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}
