// Table rows for CLI output

use chrono::DateTime;
use jobmatch_core::application::{SourceReport, SourceStatus};
use jobmatch_core::domain::{JobPosting, LearningStep, MatchResult, SkillImportance};
use tabled::Tabled;

const MAX_SKILLS_SHOWN: usize = 5;

#[derive(Tabled)]
pub struct SourceRow {
    pub source: String,
    pub status: String,
    pub fetched: u64,
    pub inserted: u64,
    pub merged: u64,
    pub dropped: u64,
    pub note: String,
}

impl From<&SourceReport> for SourceRow {
    fn from(report: &SourceReport) -> Self {
        let note = match &report.status {
            SourceStatus::Failed { reason } | SourceStatus::Partial { reason } => reason.clone(),
            _ => String::new(),
        };
        Self {
            source: report.source.clone(),
            status: report.status.as_str().to_string(),
            fetched: report.fetched,
            inserted: report.inserted,
            merged: report.merged,
            dropped: report.dropped_malformed + report.filtered,
            note,
        }
    }
}

#[derive(Tabled)]
pub struct PostingRow {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted: String,
    pub skills: String,
}

impl From<&JobPosting> for PostingRow {
    fn from(posting: &JobPosting) -> Self {
        let location = if posting.remote {
            format!("{} (remote)", posting.location()).trim().to_string()
        } else {
            posting.location().to_string()
        };
        Self {
            id: posting.id.clone(),
            title: posting.title().to_string(),
            company: posting.company().to_string(),
            location,
            posted: format_date(posting.latest_posted_at),
            skills: short_list(posting.skills.iter()),
        }
    }
}

#[derive(Tabled)]
pub struct MatchRow {
    pub score: u8,
    pub title: String,
    pub company: String,
    pub skills: u8,
    pub experience: u8,
    pub location: u8,
    pub salary: u8,
    pub missing: String,
}

impl MatchRow {
    pub fn new(result: &MatchResult, posting: Option<&JobPosting>) -> Self {
        Self {
            score: result.score,
            title: posting.map_or_else(|| result.posting_id.clone(), |p| p.title().to_string()),
            company: posting.map(|p| p.company().to_string()).unwrap_or_default(),
            skills: result.subscores.skills,
            experience: result.subscores.experience,
            location: result.subscores.location,
            salary: result.subscores.salary,
            missing: short_list(result.missing_skills.iter().map(String::as_str)),
        }
    }
}

#[derive(Tabled)]
pub struct GapRow {
    pub skill: String,
    pub jobs: usize,
    pub importance: String,
}

impl From<&SkillImportance> for GapRow {
    fn from(gap: &SkillImportance) -> Self {
        Self {
            skill: gap.skill.clone(),
            jobs: gap.frequency,
            importance: format!("{}%", gap.importance),
        }
    }
}

#[derive(Tabled)]
pub struct StepRow {
    pub priority: usize,
    pub skill: String,
    pub importance: String,
    pub effort: String,
}

impl From<&LearningStep> for StepRow {
    fn from(step: &LearningStep) -> Self {
        Self {
            priority: step.priority,
            skill: step.skill.clone(),
            importance: format!("{}%", step.importance),
            effort: step.effort.as_str().to_string(),
        }
    }
}

/// Epoch ms as `YYYY-MM-DD`, `-` when unknown
pub fn format_date(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn short_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    if items.len() > MAX_SKILLS_SHOWN {
        format!(
            "{} +{}",
            items[..MAX_SKILLS_SHOWN].join(", "),
            items.len() - MAX_SKILLS_SHOWN
        )
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(1_704_067_200_000)), "2024-01-01");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_long_skill_lists_are_shortened() {
        let skills = ["a", "b", "c", "d", "e", "f", "g"];
        assert_eq!(short_list(skills.into_iter()), "a, b, c, d, e +2");
        assert_eq!(short_list(["go"].into_iter()), "go");
    }

    #[test]
    fn test_source_row_shows_failure_reason() {
        let report = SourceReport::new("feed").with_status(SourceStatus::Failed {
            reason: "HTTP 503".to_string(),
        });
        let row = SourceRow::from(&report);
        assert_eq!(row.status, "failed");
        assert_eq!(row.note, "HTTP 503");
    }
}
