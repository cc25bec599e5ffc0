// Match Service - consumer-facing matching and skill-gap use cases

use super::matching::MatchingEngine;
use super::skill_gap::SkillGapAnalyzer;
use crate::domain::{CandidateProfile, JobPosting, MatchResult, SkillGapReport};
use crate::error::{AppError, Result};
use crate::port::{JobRepository, PostingFilter};
use std::sync::Arc;
use tracing::info;

pub struct MatchService {
    repository: Arc<dyn JobRepository>,
    engine: MatchingEngine,
    analyzer: SkillGapAnalyzer,
}

impl MatchService {
    pub fn new(repository: Arc<dyn JobRepository>) -> Self {
        Self {
            repository,
            engine: MatchingEngine::new(),
            analyzer: SkillGapAnalyzer::new(),
        }
    }

    pub fn with_engine(mut self, engine: MatchingEngine) -> Self {
        self.analyzer = self.analyzer.with_mode(engine.mode());
        self.engine = engine;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.analyzer = self.analyzer.with_top_n(top_n);
        self
    }

    /// Score every posting selected by `filter`, best match first
    pub async fn compute_matches(
        &self,
        profile: &CandidateProfile,
        filter: &PostingFilter,
    ) -> Result<Vec<MatchResult>> {
        profile
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let postings = self.repository.query(filter).await?;
        let results = self
            .engine
            .rank(profile, &postings)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        info!(
            candidates = postings.len(),
            best = results.first().map(|r| r.score),
            "Matches computed"
        );
        Ok(results)
    }

    /// Skill gaps against an explicit posting set
    pub fn analyze_skill_gaps(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
    ) -> Result<SkillGapReport> {
        self.analyzer
            .analyze(profile, postings)
            .map_err(|e| AppError::InvalidInput(e.to_string()))
    }

    /// Skill gaps against the stored postings selected by `filter`
    pub async fn analyze_skill_gaps_for(
        &self,
        profile: &CandidateProfile,
        filter: &PostingFilter,
    ) -> Result<SkillGapReport> {
        profile
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let postings = self.repository.query(filter).await?;
        self.analyze_skill_gaps(profile, &postings)
    }
}
