// Skill Gap Analyzer
//
// Ranks the skills a profile lacks across a set of target postings and
// projects how much closing the top gaps would lift the skills sub-score.

use super::constants::DEFAULT_TOP_N_GAPS;
use super::matching::{skills_score, SkillMatchMode};
use crate::domain::{
    CandidateProfile, DomainError, EffortEstimate, ImprovementPotential, JobPosting, LearningStep,
    SkillGapAnalysis, SkillGapReport, SkillImportance, SkillSet,
};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SkillGapAnalyzer {
    top_n: usize,
    mode: SkillMatchMode,
}

impl Default for SkillGapAnalyzer {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N_GAPS,
            mode: SkillMatchMode::default(),
        }
    }
}

impl SkillGapAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound on the learning path (at least 1)
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    /// Must agree with the matching engine so projected scores are comparable
    pub fn with_mode(mut self, mode: SkillMatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn analyze(
        &self,
        profile: &CandidateProfile,
        targets: &[JobPosting],
    ) -> Result<SkillGapReport, DomainError> {
        profile.validate()?;

        if targets.is_empty() {
            return Ok(SkillGapReport::NoJobsAnalyzed);
        }

        let ranked_gaps = self.rank_gaps(&profile.skills, targets);

        let learning_path: Vec<LearningStep> = ranked_gaps
            .iter()
            .take(self.top_n)
            .enumerate()
            .map(|(index, gap)| LearningStep {
                skill: gap.skill.clone(),
                priority: index + 1,
                importance: gap.importance,
                effort: EffortEstimate::for_skill(&gap.skill),
            })
            .collect();

        let mut projected_skills = profile.skills.clone();
        for step in &learning_path {
            projected_skills.insert(&step.skill);
        }

        let current_average = self.average_skills_score(&profile.skills, targets);
        let projected_average = self.average_skills_score(&projected_skills, targets);
        let improvement = ImprovementPotential {
            current_average: round2(current_average),
            projected_average: round2(projected_average),
            delta: round2(projected_average - current_average),
        };

        debug!(
            jobs = targets.len(),
            gaps = ranked_gaps.len(),
            delta = improvement.delta,
            "Skill gap analysis complete"
        );

        Ok(SkillGapReport::Analyzed(SkillGapAnalysis {
            jobs_analyzed: targets.len(),
            ranked_gaps,
            learning_path,
            improvement,
        }))
    }

    /// Missing skills by descending importance; ties keep first-seen order
    fn rank_gaps(&self, owned: &SkillSet, targets: &[JobPosting]) -> Vec<SkillImportance> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for posting in targets {
            let missing = skills_score(owned, &posting.skills, self.mode).missing;
            for skill in missing {
                let count = counts.entry(skill.clone()).or_insert(0);
                if *count == 0 {
                    order.push(skill);
                }
                *count += 1;
            }
        }

        let total = targets.len() as f64;
        let mut ranked: Vec<SkillImportance> = order
            .into_iter()
            .map(|skill| {
                let frequency = counts.get(&skill).copied().unwrap_or(0);
                let importance = (frequency as f64 / total * 100.0).round().clamp(0.0, 100.0) as u8;
                SkillImportance {
                    skill,
                    frequency,
                    importance,
                }
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        ranked
    }

    fn average_skills_score(&self, skills: &SkillSet, targets: &[JobPosting]) -> f64 {
        let sum: f64 = targets
            .iter()
            .map(|p| skills_score(skills, &p.skills, self.mode).score)
            .sum();
        sum / targets.len() as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
