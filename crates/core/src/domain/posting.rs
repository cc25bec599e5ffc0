// Job Posting Domain Model

use super::error::{DomainError, Result};
use super::profile::ExperienceLevel;
use super::skill::SkillSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Posting ID (UUID v4, assigned on first insert)
pub type PostingId = String;

/// Source name as configured (e.g. "remoteok", "weworkremotely")
pub type SourceName = String;

/// Separator between fingerprint fragments (ASCII unit separator, never produced by normalization)
const FINGERPRINT_SEPARATOR: &[u8] = b"\x1f";

/// Normalize a title/company/location fragment for fingerprinting.
///
/// Lower-cases, replaces every non-alphanumeric character with a space and
/// collapses runs of whitespace: `"Acme, Inc."` and `"ACME inc"` normalize
/// to the same `"acme inc"`.
pub fn normalize_fragment(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deduplication fingerprint: hex SHA-256 of normalized (title, company, location)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(title: &str, company: &str, location: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_fragment(title).as_bytes());
        hasher.update(FINGERPRINT_SEPARATOR);
        hasher.update(normalize_fragment(company).as_bytes());
        hasher.update(FINGERPRINT_SEPARATOR);
        hasher.update(normalize_fragment(location).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Salary range with nullable bounds and an optional ISO currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl SalaryRange {
    pub fn new(min: Option<i64>, max: Option<i64>, currency: Option<String>) -> Self {
        Self { min, max, currency }
    }

    /// True when neither bound is known
    pub fn is_unspecified(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Closed interval of the known bounds; a single bound becomes a point
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            (Some(v), None) | (None, Some(v)) => Some((v, v)),
            (None, None) => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if bound < 0 {
                return Err(DomainError::NegativeSalary(bound));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(DomainError::InvalidSalaryRange { min, max });
            }
        }
        Ok(())
    }
}

/// Canonical job posting.
///
/// Title, company and location are private because the fingerprint is
/// derived from them once at construction and must never drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPosting {
    pub id: PostingId,
    title: String,
    company: String,
    location: String,
    fingerprint: Fingerprint,

    pub salary: SalaryRange,
    pub description: String,
    pub skills: SkillSet,
    pub source: SourceName,

    /// Earliest known posting time (epoch ms)
    pub posted_at: Option<i64>,
    /// Most recent posting time among merged duplicates (epoch ms)
    pub latest_posted_at: Option<i64>,

    pub remote: bool,
    pub experience_level: Option<ExperienceLevel>,
    pub apply_url: Option<String>,
}

impl JobPosting {
    /// Create a posting; the fingerprint is computed here and nowhere else
    ///
    /// # Arguments
    ///
    /// * `id` - Posting ID (injected, not generated)
    /// * `posted_at` - Source posting time in epoch ms, if known
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        source: impl Into<String>,
        posted_at: Option<i64>,
    ) -> Self {
        let title = title.into().trim().to_string();
        let company = company.into().trim().to_string();
        let location = location.into().trim().to_string();
        let fingerprint = Fingerprint::compute(&title, &company, &location);

        Self {
            id: id.into(),
            title,
            company,
            location,
            fingerprint,
            salary: SalaryRange::default(),
            description: String::new(),
            skills: SkillSet::new(),
            source: source.into(),
            posted_at,
            latest_posted_at: posted_at,
            remote: false,
            experience_level: None,
            apply_url: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skills = skills.into_iter().collect();
        self
    }

    pub fn with_salary(mut self, salary: SalaryRange) -> Self {
        self.salary = salary;
        self
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = Some(level);
        self
    }

    /// Level stated by the source, or detected from title and description
    pub fn effective_level(&self) -> Option<ExperienceLevel> {
        self.experience_level
            .or_else(|| ExperienceLevel::detect(&self.title, &self.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fragment() {
        assert_eq!(normalize_fragment("  Acme, Inc. "), "acme inc");
        assert_eq!(normalize_fragment("São Paulo - BR"), "são paulo br");
        assert_eq!(normalize_fragment("---"), "");
    }

    #[test]
    fn test_fingerprint_ignores_case_and_punctuation() {
        let a = Fingerprint::compute("Senior Rust Engineer", "Acme, Inc.", "Berlin");
        let b = Fingerprint::compute("senior  rust engineer", "ACME inc", "berlin ");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_fragments_do_not_bleed() {
        // Without a separator "ab"+"c" and "a"+"bc" would collide
        let a = Fingerprint::compute("ab", "c", "x");
        let b = Fingerprint::compute("a", "bc", "x");
        assert_ne!(a, b);
    }

    #[test]
    fn test_posting_fingerprint_is_derived_from_identity_fields() {
        let posting = JobPosting::new("p1", "Data Engineer", "Globex", "Remote", "rss", Some(1000));
        assert_eq!(
            posting.fingerprint(),
            &Fingerprint::compute("Data Engineer", "Globex", "Remote")
        );
        assert_eq!(posting.latest_posted_at, Some(1000));
    }

    #[test]
    fn test_salary_range_validation() {
        assert!(SalaryRange::new(Some(10), Some(20), None).validate().is_ok());
        assert_eq!(
            SalaryRange::new(Some(30), Some(20), None).validate(),
            Err(DomainError::InvalidSalaryRange { min: 30, max: 20 })
        );
        assert_eq!(
            SalaryRange::new(Some(-5), None, None).validate(),
            Err(DomainError::NegativeSalary(-5))
        );
    }

    #[test]
    fn test_salary_bounds() {
        assert_eq!(SalaryRange::default().bounds(), None);
        assert_eq!(SalaryRange::new(Some(5), None, None).bounds(), Some((5, 5)));
        assert_eq!(SalaryRange::new(Some(5), Some(9), None).bounds(), Some((5, 9)));
    }

    #[test]
    fn test_effective_level_falls_back_to_detection() {
        let posting = JobPosting::new("p1", "Junior Analyst", "Initech", "", "api", None);
        assert_eq!(posting.effective_level(), Some(ExperienceLevel::Junior));

        let stated = posting.with_experience(ExperienceLevel::Mid);
        assert_eq!(stated.effective_level(), Some(ExperienceLevel::Mid));
    }
}
