// Matching Engine
//
// Pure scoring of a candidate profile against a posting. No I/O, no shared
// state: the same inputs always produce the same MatchResult.

mod scoring;

pub use scoring::{
    experience_score, location_score, salary_score, skills_score, SkillMatch, SkillMatchMode,
};

use super::constants::{
    EXPERIENCE_NOTE_GAP, EXPERIENCE_WEIGHT, LOCATION_WEIGHT, SALARY_WEIGHT, SKILLS_WEIGHT,
};
use crate::domain::{
    CandidateProfile, DomainError, ExperienceLevel, JobPosting, MatchResult, SubScores,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tolerance when checking that weights sum to one
const WEIGHT_EPSILON: f64 = 1e-6;

/// Component weights of the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: SKILLS_WEIGHT,
            experience: EXPERIENCE_WEIGHT,
            location: LOCATION_WEIGHT,
            salary: SALARY_WEIGHT,
        }
    }
}

impl MatchWeights {
    /// Weights must be finite, non-negative and sum to 1.0
    pub fn validate(&self) -> Result<(), DomainError> {
        let parts = [self.skills, self.experience, self.location, self.salary];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DomainError::InvalidWeights(format!(
                "weights must be finite and non-negative: {parts:?}"
            )));
        }

        let total: f64 = parts.iter().sum();
        if (total - 1.0).abs() > WEIGHT_EPSILON {
            return Err(DomainError::InvalidWeights(format!(
                "weights must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    weights: MatchWeights,
    mode: SkillMatchMode,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: MatchWeights) -> Result<Self, DomainError> {
        weights.validate()?;
        Ok(Self {
            weights,
            mode: SkillMatchMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: SkillMatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    pub fn mode(&self) -> SkillMatchMode {
        self.mode
    }

    /// Score one posting. Never fails: absent data yields neutral sub-scores.
    pub fn score(&self, profile: &CandidateProfile, posting: &JobPosting) -> MatchResult {
        let skills = skills_score(&profile.skills, &posting.skills, self.mode);
        let detected_level = posting.effective_level();
        let experience = experience_score(profile.experience_level, detected_level);
        let location = location_score(&profile.preferred_locations, posting);
        let salary = salary_score(&profile.salary_expectation, &posting.salary);

        let weighted = skills.score * self.weights.skills
            + experience * self.weights.experience
            + location * self.weights.location
            + salary * self.weights.salary;

        MatchResult {
            posting_id: posting.id.clone(),
            score: to_percent(weighted),
            subscores: SubScores {
                skills: to_percent(skills.score),
                experience: to_percent(experience),
                location: to_percent(location),
                salary: to_percent(salary),
            },
            matching_skills: skills.matching,
            missing_skills: skills.missing,
            detected_level,
            recommendation: recommendation(profile.experience_level, detected_level),
        }
    }

    /// Score every posting, best first (ties broken by posting id).
    ///
    /// Rejects a profile the engine cannot interpret.
    pub fn rank(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
    ) -> Result<Vec<MatchResult>, DomainError> {
        profile.validate()?;

        let mut results: Vec<MatchResult> =
            postings.iter().map(|p| self.score(profile, p)).collect();
        results.sort_by(|a, b| match b.score.cmp(&a.score) {
            Ordering::Equal => a.posting_id.cmp(&b.posting_id),
            other => other,
        });
        Ok(results)
    }
}

/// Round and clamp a raw score into 0..=100
fn to_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn recommendation(
    profile: Option<ExperienceLevel>,
    posting: Option<ExperienceLevel>,
) -> Option<String> {
    let (profile, posting) = (profile?, posting?);
    let gap = i16::from(posting.rank()) - i16::from(profile.rank());

    if gap >= EXPERIENCE_NOTE_GAP {
        Some("Consider developing more experience before applying".to_string())
    } else if gap <= -EXPERIENCE_NOTE_GAP {
        Some("This role might be below your experience level".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalaryRange;

    fn posting(skills: &[&str]) -> JobPosting {
        JobPosting::new("job-1", "Data Engineer", "Acme", "Berlin, Germany", "api", None)
            .with_skills(skills.iter().copied())
    }

    #[test]
    fn test_partial_skill_overlap_example() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["python", "sql"]);

        let result = engine.score(&profile, &posting(&["python", "sql", "aws"]));

        assert_eq!(result.subscores.skills, 67);
        assert_eq!(result.matching_skills, vec!["python", "sql"]);
        assert_eq!(result.missing_skills, vec!["aws"]);
    }

    #[test]
    fn test_full_skill_coverage_is_case_insensitive() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["Python", "SQL", "AWS", "Go"]);

        let result = engine.score(&profile, &posting(&["python", "sql", "aws"]));

        assert_eq!(result.subscores.skills, 100);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_all_neutral_components() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::default();
        let bare = JobPosting::new("job-1", "Engineer", "Acme", "", "api", None);

        let result = engine.score(&profile, &bare);

        // skills 50, experience 80, location 100 (no preference), salary 100
        assert_eq!(
            result.subscores,
            SubScores { skills: 50, experience: 80, location: 100, salary: 100 }
        );
        // 50*0.4 + 80*0.25 + 100*0.2 + 100*0.15 = 75
        assert_eq!(result.score, 75);
    }

    #[test]
    fn test_weighted_total() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["python", "sql"])
            .with_experience(ExperienceLevel::Junior)
            .with_location("Lisbon")
            .with_salary(Some(90_000), Some(110_000));
        let job = JobPosting::new("job-1", "Senior Data Engineer", "Acme", "Berlin", "api", None)
            .with_skills(["python", "sql", "aws"])
            .with_salary(SalaryRange::new(Some(60_000), Some(72_000), None));

        let result = engine.score(&profile, &job);

        assert_eq!(result.subscores.experience, 50);
        assert_eq!(result.subscores.location, 40);
        assert_eq!(result.subscores.salary, 80);
        // 66.67*0.4 + 50*0.25 + 40*0.2 + 80*0.15 = 59.17
        assert_eq!(result.score, 59);
        assert_eq!(result.detected_level, Some(ExperienceLevel::Senior));
        assert_eq!(
            result.recommendation.as_deref(),
            Some("Consider developing more experience before applying")
        );
    }

    #[test]
    fn test_overqualified_note() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["rust"]).with_experience(ExperienceLevel::Lead);
        let job = JobPosting::new("job-1", "Junior Rust Developer", "Acme", "Remote", "api", None);

        let result = engine.score(&profile, &job);

        assert_eq!(
            result.recommendation.as_deref(),
            Some("This role might be below your experience level")
        );
    }

    #[test]
    fn test_score_is_deterministic_and_bounded() {
        let engine = MatchingEngine::new();
        let profiles = [
            CandidateProfile::default(),
            CandidateProfile::new(["rust", "java", "c++"])
                .with_experience(ExperienceLevel::Mid)
                .with_location("Remote")
                .with_salary(Some(1), None),
            CandidateProfile::new(["javascript"]).with_salary(None, Some(i64::MAX)),
        ];
        let postings = [
            posting(&[]),
            posting(&["java", "spring"]),
            JobPosting::new("job-2", "Lead", "X", "Tokyo", "rss", Some(0))
                .with_salary(SalaryRange::new(Some(i64::MAX), None, Some("JPY".into()))),
        ];

        for profile in &profiles {
            for job in &postings {
                let first = engine.score(profile, job);
                let second = engine.score(profile, job);
                assert_eq!(first, second);
                assert!(first.score <= 100);
            }
        }
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["rust"]);
        let strong = JobPosting::new("b", "Rust Dev", "Acme", "Remote", "api", None)
            .with_skills(["rust"]);
        let weak = JobPosting::new("a", "Go Dev", "Acme", "Remote", "api", None)
            .with_skills(["go"]);
        let tie = JobPosting::new("a2", "Rust Dev", "Initech", "Remote", "api", None)
            .with_skills(["rust"]);

        let ranked = engine.rank(&profile, &[weak, strong, tie]).unwrap();
        let ids: Vec<_> = ranked.iter().map(|r| r.posting_id.as_str()).collect();

        assert_eq!(ids, vec!["a2", "b", "a"]);
    }

    #[test]
    fn test_rank_rejects_invalid_profile() {
        let engine = MatchingEngine::new();
        let profile = CandidateProfile::new(["rust"]).with_salary(Some(200), Some(100));

        assert!(engine.rank(&profile, &[posting(&["rust"])]).is_err());
    }

    #[test]
    fn test_custom_weights_are_validated() {
        let lopsided = MatchWeights { skills: 0.9, experience: 0.9, location: 0.0, salary: 0.0 };
        assert!(matches!(
            MatchingEngine::with_weights(lopsided),
            Err(DomainError::InvalidWeights(_))
        ));

        let skills_only = MatchWeights { skills: 1.0, experience: 0.0, location: 0.0, salary: 0.0 };
        let engine = MatchingEngine::with_weights(skills_only).unwrap();
        let result = engine.score(&CandidateProfile::new(["aws"]), &posting(&["aws"]));
        assert_eq!(result.score, 100);
    }
}
