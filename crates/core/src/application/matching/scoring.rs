// Sub-score functions (each returns 0.0..=100.0)

use crate::application::constants::{
    EXPERIENCE_PENALTY_PER_LEVEL, LOCATION_MISMATCH_SCORE, LOCATION_PARTIAL_SCORE,
    NEUTRAL_EXPERIENCE_SCORE, NEUTRAL_LOCATION_SCORE, NEUTRAL_SKILLS_SCORE, PARTIAL_SKILL_CREDIT,
};
use crate::domain::skill::{contains_term, tokens};
use crate::domain::{ExperienceLevel, JobPosting, SalaryRange, SkillSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const FULL: f64 = 100.0;

/// How a partial (containment) skill match is detected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchMode {
    /// Containment only at token boundaries: "react" matches "react native",
    /// "java" does not match "javascript"
    #[default]
    TokenBoundary,
    /// Plain substring containment
    Substring,
}

impl SkillMatchMode {
    fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            SkillMatchMode::TokenBoundary => contains_term(haystack, needle),
            SkillMatchMode::Substring => !needle.is_empty() && haystack.contains(needle),
        }
    }
}

/// Skills sub-score with the skills that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub score: f64,
    /// Required skills matched exactly or partially
    pub matching: Vec<String>,
    /// Required skills with no match at all
    pub missing: Vec<String>,
}

/// Fraction of the posting's required skills covered by the profile.
///
/// Exact matches earn full credit, containment in either direction earns
/// `PARTIAL_SKILL_CREDIT`. A posting that lists no skills is neutral.
pub fn skills_score(profile: &SkillSet, required: &SkillSet, mode: SkillMatchMode) -> SkillMatch {
    if required.is_empty() {
        return SkillMatch {
            score: NEUTRAL_SKILLS_SCORE,
            matching: Vec::new(),
            missing: Vec::new(),
        };
    }

    let mut credit = 0.0;
    let mut matching = Vec::new();
    let mut missing = Vec::new();

    for skill in required.iter() {
        if profile.contains(skill) {
            credit += 1.0;
            matching.push(skill.to_string());
        } else if profile
            .iter()
            .any(|own| mode.contains(skill, own) || mode.contains(own, skill))
        {
            credit += PARTIAL_SKILL_CREDIT;
            matching.push(skill.to_string());
        } else {
            missing.push(skill.to_string());
        }
    }

    SkillMatch {
        score: FULL * credit / required.len() as f64,
        matching,
        missing,
    }
}

/// 100 minus a fixed penalty per level of distance; neutral when either level is unknown
pub fn experience_score(
    profile: Option<ExperienceLevel>,
    posting: Option<ExperienceLevel>,
) -> f64 {
    match (profile, posting) {
        (Some(profile), Some(posting)) => {
            let penalty = EXPERIENCE_PENALTY_PER_LEVEL * f64::from(profile.distance(posting));
            (FULL - penalty).max(0.0)
        }
        _ => NEUTRAL_EXPERIENCE_SCORE,
    }
}

/// Tiered location credit
pub fn location_score(preferred: &[String], posting: &JobPosting) -> f64 {
    if posting.remote || preferred.is_empty() {
        return FULL;
    }

    let location = posting.location().to_lowercase();
    if location.trim().is_empty() {
        return NEUTRAL_LOCATION_SCORE;
    }

    let preferred: Vec<String> = preferred.iter().map(|p| p.trim().to_lowercase()).collect();
    if preferred
        .iter()
        .any(|p| !p.is_empty() && (location.contains(p.as_str()) || p.contains(location.as_str())))
    {
        return FULL;
    }

    let posting_tokens: HashSet<String> = tokens(&location).collect();
    if preferred
        .iter()
        .any(|p| tokens(p).any(|t| posting_tokens.contains(&t)))
    {
        return LOCATION_PARTIAL_SCORE;
    }

    LOCATION_MISMATCH_SCORE
}

/// Full credit on overlap or missing data; otherwise credit shrinks with the
/// shortfall relative to the candidate's minimum
pub fn salary_score(expectation: &SalaryRange, offered: &SalaryRange) -> f64 {
    let (Some((want_lo, _)), Some((_, offer_hi))) =
        (expectation.bounds(), offered.bounds())
    else {
        return FULL;
    };

    if let (Some(a), Some(b)) = (&expectation.currency, &offered.currency) {
        if !a.eq_ignore_ascii_case(b) {
            return FULL;
        }
    }

    // Overlapping, or paying above expectation
    if offer_hi >= want_lo {
        return FULL;
    }
    let reference = want_lo as f64;
    if reference <= 0.0 {
        return FULL;
    }
    let gap = reference - offer_hi as f64;
    (FULL * (1.0 - gap / reference)).clamp(0.0, FULL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(skills: &[&str]) -> SkillSet {
        skills.iter().copied().collect()
    }

    #[test]
    fn test_partial_credit_is_below_exact() {
        let required = set(&["react native", "postgresql"]);

        let exact = skills_score(&set(&["react native", "postgresql"]), &required, SkillMatchMode::TokenBoundary);
        let partial = skills_score(&set(&["react", "postgresql"]), &required, SkillMatchMode::TokenBoundary);

        assert_eq!(exact.score, 100.0);
        assert_eq!(partial.score, 87.5);
        assert!(partial.missing.is_empty());
    }

    #[test]
    fn test_token_boundary_avoids_java_javascript() {
        let required = set(&["javascript"]);
        let profile = set(&["java"]);

        let strict = skills_score(&profile, &required, SkillMatchMode::TokenBoundary);
        let loose = skills_score(&profile, &required, SkillMatchMode::Substring);

        assert_eq!(strict.score, 0.0);
        assert_eq!(strict.missing, vec!["javascript"]);
        assert_eq!(loose.score, 75.0);
    }

    #[test]
    fn test_empty_profile_misses_everything() {
        let result = skills_score(&SkillSet::new(), &set(&["go", "k8s"]), SkillMatchMode::default());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.missing, vec!["go", "k8s"]);
    }

    #[test]
    fn test_experience_penalty() {
        use ExperienceLevel::*;
        assert_eq!(experience_score(Some(Mid), Some(Mid)), 100.0);
        assert_eq!(experience_score(Some(Junior), Some(Mid)), 75.0);
        assert_eq!(experience_score(Some(Junior), Some(Lead)), 25.0);
        assert_eq!(experience_score(None, Some(Lead)), NEUTRAL_EXPERIENCE_SCORE);
        assert_eq!(experience_score(Some(Lead), None), NEUTRAL_EXPERIENCE_SCORE);
    }

    #[test]
    fn test_location_tiers() {
        let at = |loc: &str| JobPosting::new("1", "Dev", "Acme", loc, "api", None);
        let prefs = vec!["São Paulo, Brazil".to_string()];

        assert_eq!(location_score(&prefs, &at("Lisbon").with_remote(true)), FULL);
        assert_eq!(location_score(&[], &at("Lisbon")), FULL);
        assert_eq!(location_score(&prefs, &at("são paulo")), FULL);
        assert_eq!(location_score(&prefs, &at("Rio de Janeiro, Brazil")), LOCATION_PARTIAL_SCORE);
        assert_eq!(location_score(&prefs, &at("")), NEUTRAL_LOCATION_SCORE);
        assert_eq!(location_score(&prefs, &at("Berlin")), LOCATION_MISMATCH_SCORE);
    }

    #[test]
    fn test_salary_overlap_gap_and_unknowns() {
        let range = |lo, hi| SalaryRange::new(lo, hi, None);
        let want = range(Some(100_000), Some(120_000));

        assert_eq!(salary_score(&want, &range(Some(110_000), Some(150_000))), FULL);
        assert_eq!(salary_score(&want, &range(Some(200_000), None)), FULL);
        assert_eq!(salary_score(&want, &range(Some(50_000), Some(75_000))), 75.0);
        assert_eq!(salary_score(&want, &range(Some(10_000), Some(25_000))), 25.0);
        assert_eq!(salary_score(&want, &SalaryRange::default()), FULL);
        assert_eq!(salary_score(&SalaryRange::default(), &want), FULL);
    }

    #[test]
    fn test_salary_currency_mismatch_is_not_penalized() {
        let want = SalaryRange::new(Some(100_000), None, Some("USD".into()));
        let offer = SalaryRange::new(Some(10_000), Some(12_000), Some("BRL".into()));
        assert_eq!(salary_score(&want, &offer), FULL);
    }
}
