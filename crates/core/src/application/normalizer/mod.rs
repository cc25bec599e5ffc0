// Normalizer: raw source record -> canonical JobPosting
//
// Every field is read through the source's explicit mapping table. Required
// fields (title, company) reject the record; optional fields fall back to
// empty/null.

mod salary;
pub mod values;

pub use salary::parse_salary_text;

use crate::domain::skill::contains_term;
use crate::domain::skill_catalog::extract_known_skills;
use crate::domain::{ExperienceLevel, FieldMapping, JobPosting, RawPosting, SalaryRange, SourceConfig};
use crate::port::{IdProvider, PartialJobPosting};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use values::{as_amount, as_bool, as_skill_list, as_text, as_timestamp};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Location words that mark a posting as remote
const REMOTE_MARKERS: &[&str] = &["remote", "anywhere", "worldwide", "home office"];

pub struct Normalizer {
    source_name: String,
    mapping: FieldMapping,
    extract_skills: bool,
    id_provider: Arc<dyn IdProvider>,
}

impl Normalizer {
    pub fn new(config: &SourceConfig, id_provider: Arc<dyn IdProvider>) -> Self {
        Self {
            source_name: config.name.clone(),
            mapping: config.mapping(),
            extract_skills: config.extract_skills,
            id_provider,
        }
    }

    fn field<'a>(&self, raw: &'a RawPosting, path: &Option<String>) -> Option<&'a Value> {
        path.as_deref()
            .and_then(|p| raw.get(p))
            .filter(|v| !v.is_null())
    }

    fn required(
        &self,
        raw: &RawPosting,
        path: &Option<String>,
        field: &'static str,
    ) -> Result<String, NormalizeError> {
        match self.field(raw, path) {
            None => Err(NormalizeError::MissingField { field }),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(NormalizeError::MissingField { field })
            }
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(other) => Err(NormalizeError::InvalidField {
                field,
                reason: format!("expected text, got {}", type_name(other)),
            }),
        }
    }

    fn text(&self, raw: &RawPosting, path: &Option<String>) -> Option<String> {
        self.field(raw, path).and_then(as_text)
    }

    /// Map one raw record; a new posting ID is drawn for every record
    pub fn normalize(&self, raw: &RawPosting) -> Result<JobPosting, NormalizeError> {
        let m = &self.mapping;

        let title = self.required(raw, &m.title, "title")?;
        let company = self.required(raw, &m.company, "company")?;
        let location = self.text(raw, &m.location).unwrap_or_default();
        let posted_at = self.field(raw, &m.posted_at).and_then(as_timestamp);

        let mut posting = JobPosting::new(
            self.id_provider.generate_id(),
            title,
            company,
            location,
            self.source_name.clone(),
            posted_at,
        );

        posting.description = self.text(raw, &m.description).unwrap_or_default();
        posting.apply_url = self.text(raw, &m.apply_url);

        let mut skills = self
            .field(raw, &m.skills)
            .map(as_skill_list)
            .unwrap_or_default();
        if self.extract_skills {
            let scanned = format!("{} {}", posting.title(), posting.description);
            skills.extend(extract_known_skills(&scanned).into_iter().map(String::from));
        }
        posting.skills = skills.into_iter().collect();

        posting.salary = self.salary(raw);

        posting.remote = self
            .field(raw, &m.remote)
            .and_then(as_bool)
            .unwrap_or_else(|| is_remote_location(posting.location()));

        posting.experience_level = self
            .text(raw, &m.experience_level)
            .and_then(|level| level.parse::<ExperienceLevel>().ok())
            .or_else(|| posting.effective_level());

        debug!(
            source = %self.source_name,
            fingerprint = %posting.fingerprint().short(),
            skills = posting.skills.len(),
            "Normalized posting"
        );
        Ok(posting)
    }

    /// Numeric bounds first, then free text; anything unparseable is null
    fn salary(&self, raw: &RawPosting) -> SalaryRange {
        let m = &self.mapping;
        let min = self.field(raw, &m.salary_min).and_then(as_amount);
        let max = self.field(raw, &m.salary_max).and_then(as_amount);
        let currency = self
            .text(raw, &m.currency)
            .map(|c| c.to_uppercase())
            .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()));

        if min.is_some() || max.is_some() {
            let (min, max) = match (min, max) {
                (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
                bounds => bounds,
            };
            return SalaryRange::new(min, max, currency);
        }

        self.text(raw, &m.salary_text)
            .and_then(|text| parse_salary_text(&text))
            .map(|mut parsed| {
                if parsed.currency.is_none() {
                    parsed.currency = currency;
                }
                parsed
            })
            .unwrap_or_default()
    }
}

/// Fill gaps in a normalized posting from an enrichment result.
///
/// Enrichment never overwrites data that came from the source mapping.
pub fn apply_enrichment(mut posting: JobPosting, partial: PartialJobPosting) -> JobPosting {
    for skill in &partial.skills {
        posting.skills.insert(skill);
    }
    if posting.salary.is_unspecified() {
        if let Some(salary) = partial.salary.filter(|s| s.validate().is_ok()) {
            posting.salary = salary;
        }
    }
    if posting.experience_level.is_none() {
        posting.experience_level = partial.experience_level;
    }
    posting.remote = posting.remote || partial.remote.unwrap_or(false);
    posting
}

fn is_remote_location(location: &str) -> bool {
    let lowered = location.to_lowercase();
    REMOTE_MARKERS.iter().any(|marker| contains_term(&lowered, marker))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
