// SQLite JobRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use jobmatch_core::domain::merge::merge_postings;
use jobmatch_core::domain::{ExperienceLevel, Fingerprint, JobPosting, PostingId, SalaryRange, SkillSet};
use jobmatch_core::error::Result;
use jobmatch_core::port::{
    JobRepository, PostingFilter, TimeProvider, UpsertAction, UpsertOutcome,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct SqliteJobRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    /// Serializes read-merge-write so concurrent sources never race on one fingerprint
    write_lock: Mutex<()>,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.lock().await;
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let existing = sqlx::query_as::<_, PostingRow>("SELECT * FROM postings WHERE fingerprint = ?")
            .bind(posting.fingerprint().as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let outcome = match existing {
            None => {
                let skills = serde_json::to_string(&posting.skills)?;
                sqlx::query(
                    r#"
                    INSERT INTO postings (
                        id, fingerprint, title, company, location, description, skills,
                        salary_min, salary_max, salary_currency, source,
                        posted_at, latest_posted_at, remote, experience_level, apply_url,
                        created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&posting.id)
                .bind(posting.fingerprint().as_str())
                .bind(posting.title())
                .bind(posting.company())
                .bind(posting.location())
                .bind(&posting.description)
                .bind(skills)
                .bind(posting.salary.min)
                .bind(posting.salary.max)
                .bind(&posting.salary.currency)
                .bind(&posting.source)
                .bind(posting.posted_at)
                .bind(posting.latest_posted_at)
                .bind(posting.remote)
                .bind(posting.experience_level.map(ExperienceLevel::as_str))
                .bind(&posting.apply_url)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

                UpsertOutcome {
                    id: posting.id.clone(),
                    action: UpsertAction::Inserted,
                }
            }
            Some(row) => {
                let stored = row.into_posting()?;
                let merged = merge_postings(&stored, posting);

                if merged == stored {
                    UpsertOutcome {
                        id: stored.id,
                        action: UpsertAction::Unchanged,
                    }
                } else {
                    let skills = serde_json::to_string(&merged.skills)?;
                    sqlx::query(
                        r#"
                        UPDATE postings
                        SET title = ?, company = ?, location = ?, description = ?, skills = ?,
                            salary_min = ?, salary_max = ?, salary_currency = ?, source = ?,
                            posted_at = ?, latest_posted_at = ?, remote = ?,
                            experience_level = ?, apply_url = ?, updated_at = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(merged.title())
                    .bind(merged.company())
                    .bind(merged.location())
                    .bind(&merged.description)
                    .bind(skills)
                    .bind(merged.salary.min)
                    .bind(merged.salary.max)
                    .bind(&merged.salary.currency)
                    .bind(&merged.source)
                    .bind(merged.posted_at)
                    .bind(merged.latest_posted_at)
                    .bind(merged.remote)
                    .bind(merged.experience_level.map(ExperienceLevel::as_str))
                    .bind(&merged.apply_url)
                    .bind(now)
                    .bind(&merged.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    UpsertOutcome {
                        id: merged.id,
                        action: UpsertAction::Merged,
                    }
                }
            }
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(
            id = %outcome.id,
            fingerprint = %posting.fingerprint().short(),
            action = ?outcome.action,
            "Posting upserted"
        );
        Ok(outcome)
    }

    async fn query(&self, filter: &PostingFilter) -> Result<Vec<JobPosting>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM postings WHERE 1 = 1");

        if let Some(source) = &filter.source {
            builder.push(" AND source = ").push_bind(source.clone());
        }
        if filter.remote_only {
            builder.push(" AND remote = 1");
        }
        if let Some(location) = &filter.location {
            builder
                .push(" AND location LIKE ")
                .push_bind(like_pattern(location))
                .push(" ESCAPE '\\'");
        }
        if let Some(after) = filter.posted_after {
            builder.push(" AND posted_at >= ").push_bind(after);
        }

        let keywords: Vec<String> = filter
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(like_pattern)
            .collect();
        if !keywords.is_empty() {
            builder.push(" AND (");
            for (i, pattern) in keywords.into_iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push("title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR description LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR skills LIKE ")
                    .push_bind(pattern)
                    .push(" ESCAPE '\\'");
            }
            builder.push(")");
        }

        builder.push(" ORDER BY COALESCE(latest_posted_at, 0) DESC, id ASC");
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded
        builder
            .push(" LIMIT ")
            .push_bind(filter.limit.map_or(-1, i64::from))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset.unwrap_or(0)));

        let rows: Vec<PostingRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PostingRow::into_posting).collect()
    }

    async fn find_by_id(&self, id: &PostingId) -> Result<Option<JobPosting>> {
        let row = sqlx::query_as::<_, PostingRow>("SELECT * FROM postings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostingRow::into_posting).transpose()
    }

    async fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<JobPosting>> {
        let row = sqlx::query_as::<_, PostingRow>("SELECT * FROM postings WHERE fingerprint = ?")
            .bind(fingerprint.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostingRow::into_posting).transpose()
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM postings")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

/// `%term%` with LIKE wildcards escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct PostingRow {
    id: String,
    title: String,
    company: String,
    location: String,
    description: String,
    skills: String,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: Option<String>,
    source: String,
    posted_at: Option<i64>,
    latest_posted_at: Option<i64>,
    remote: bool,
    experience_level: Option<String>,
    apply_url: Option<String>,
}

impl PostingRow {
    fn into_posting(self) -> Result<JobPosting> {
        let skills: SkillSet = serde_json::from_str(&self.skills)?;
        let experience_level = self
            .experience_level
            .as_deref()
            .map(str::parse::<ExperienceLevel>)
            .transpose()?;

        let mut posting = JobPosting::new(
            self.id,
            self.title,
            self.company,
            self.location,
            self.source,
            self.posted_at,
        )
        .with_description(self.description)
        .with_salary(SalaryRange::new(
            self.salary_min,
            self.salary_max,
            self.salary_currency,
        ));
        posting.skills = skills;
        posting.latest_posted_at = self.latest_posted_at;
        posting.remote = self.remote;
        posting.experience_level = experience_level;
        posting.apply_url = self.apply_url;
        Ok(posting)
    }
}
