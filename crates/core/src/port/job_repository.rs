// Job Repository Port (Interface)

use crate::domain::{Fingerprint, JobPosting, PostingId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What an upsert did to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Inserted,
    Merged,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: PostingId,
    pub action: UpsertAction,
}

/// Filter for listing stored postings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingFilter {
    /// Any keyword found in title, description or skills
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub remote_only: bool,
    /// Case-insensitive substring of the posting location
    #[serde(default)]
    pub location: Option<String>,
    /// Epoch ms lower bound on `posted_at`
    #[serde(default)]
    pub posted_after: Option<i64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl PostingFilter {
    /// Predicate form of the filter (pagination excluded)
    pub fn matches(&self, posting: &JobPosting) -> bool {
        if let Some(source) = &self.source {
            if &posting.source != source {
                return false;
            }
        }
        if self.remote_only && !posting.remote {
            return false;
        }
        if let Some(location) = &self.location {
            if !posting
                .location()
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(after) = self.posted_after {
            if posting.posted_at.map_or(true, |t| t < after) {
                return false;
            }
        }
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            let title = posting.title().to_lowercase();
            let description = posting.description.to_lowercase();
            let hit = keywords.iter().map(String::as_str).any(|k| {
                title.contains(k)
                    || description.contains(k)
                    || posting.skills.iter().any(|s| s.contains(k))
            });
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Repository interface for posting persistence.
///
/// `upsert` is atomic per fingerprint: concurrent writers for the same
/// fingerprint converge on a single row holding the merge of all of them.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new posting or merge it into the row with the same fingerprint
    async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome>;

    /// List postings, most recently posted first
    async fn query(&self, filter: &PostingFilter) -> Result<Vec<JobPosting>>;

    async fn find_by_id(&self, id: &PostingId) -> Result<Option<JobPosting>>;

    async fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<JobPosting>>;

    async fn count(&self) -> Result<i64>;
}

pub mod mocks {
    use super::*;
    use crate::domain::merge::merge_postings;
    use std::cmp::Reverse;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    /// In-memory repository with the same upsert semantics as the SQLite one
    #[derive(Default)]
    pub struct InMemoryJobRepository {
        rows: Mutex<BTreeMap<Fingerprint, JobPosting>>,
    }

    impl InMemoryJobRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn all(&self) -> Vec<JobPosting> {
            self.rows.lock().await.values().cloned().collect()
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome> {
            let mut rows = self.rows.lock().await;
            match rows.get(posting.fingerprint()) {
                None => {
                    rows.insert(posting.fingerprint().clone(), posting.clone());
                    Ok(UpsertOutcome {
                        id: posting.id.clone(),
                        action: UpsertAction::Inserted,
                    })
                }
                Some(existing) => {
                    let merged = merge_postings(existing, posting);
                    let id = merged.id.clone();
                    if &merged == existing {
                        return Ok(UpsertOutcome {
                            id,
                            action: UpsertAction::Unchanged,
                        });
                    }
                    rows.insert(posting.fingerprint().clone(), merged);
                    Ok(UpsertOutcome {
                        id,
                        action: UpsertAction::Merged,
                    })
                }
            }
        }

        async fn query(&self, filter: &PostingFilter) -> Result<Vec<JobPosting>> {
            let rows = self.rows.lock().await;
            let mut matched: Vec<JobPosting> =
                rows.values().filter(|p| filter.matches(p)).cloned().collect();
            matched.sort_by(|a, b| {
                Reverse(a.latest_posted_at.unwrap_or(0))
                    .cmp(&Reverse(b.latest_posted_at.unwrap_or(0)))
                    .then_with(|| a.id.cmp(&b.id))
            });

            let offset = filter.offset.unwrap_or(0) as usize;
            let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
            Ok(matched.into_iter().skip(offset).take(limit).collect())
        }

        async fn find_by_id(&self, id: &PostingId) -> Result<Option<JobPosting>> {
            let rows = self.rows.lock().await;
            Ok(rows.values().find(|p| &p.id == id).cloned())
        }

        async fn find_by_fingerprint(
            &self,
            fingerprint: &Fingerprint,
        ) -> Result<Option<JobPosting>> {
            Ok(self.rows.lock().await.get(fingerprint).cloned())
        }

        async fn count(&self) -> Result<i64> {
            Ok(self.rows.lock().await.len() as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemoryJobRepository;
    use super::*;

    fn posting(id: &str, title: &str, posted: i64) -> JobPosting {
        JobPosting::new(id, title, "Globex", "Berlin, DE", "api", Some(posted))
            .with_skills(["rust", "sql"])
    }

    #[test]
    fn test_filter_predicates() {
        let remote = posting("1", "Rust Engineer", 100).with_remote(true);

        assert!(PostingFilter::default().matches(&remote));
        assert!(PostingFilter { remote_only: true, ..Default::default() }.matches(&remote));
        assert!(PostingFilter { location: Some("berlin".into()), ..Default::default() }
            .matches(&remote));
        assert!(!PostingFilter { source: Some("rss".into()), ..Default::default() }
            .matches(&remote));
        assert!(!PostingFilter { posted_after: Some(101), ..Default::default() }
            .matches(&remote));
        assert!(PostingFilter { keywords: vec!["SQL".into()], ..Default::default() }
            .matches(&remote));
        assert!(!PostingFilter { keywords: vec!["cobol".into()], ..Default::default() }
            .matches(&remote));
        assert!(!PostingFilter { keywords: vec![" ".into(), "cobol".into()], ..Default::default() }
            .matches(&remote));
    }

    #[tokio::test]
    async fn test_in_memory_upsert_merges_by_fingerprint() {
        let repo = InMemoryJobRepository::new();

        let first = repo.upsert(&posting("a", "Rust Engineer", 100)).await.unwrap();
        assert_eq!(first.action, UpsertAction::Inserted);

        let again = repo.upsert(&posting("b", "rust engineer", 100)).await.unwrap();
        assert_eq!(again.id, "a");
        assert_eq!(again.action, UpsertAction::Unchanged);

        let newer = posting("c", "Rust Engineer", 200).with_description("updated");
        let merged = repo.upsert(&newer).await.unwrap();
        assert_eq!(merged.action, UpsertAction::Merged);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_query_orders_and_paginates() {
        let repo = InMemoryJobRepository::new();
        for (id, title, t) in [("a", "One", 100), ("b", "Two", 300), ("c", "Three", 200)] {
            repo.upsert(&posting(id, title, t)).await.unwrap();
        }

        let page = repo
            .query(&PostingFilter { limit: Some(2), offset: Some(1), ..Default::default() })
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
