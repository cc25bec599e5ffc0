// In-run Deduplicator
//
// Collapses duplicates within one source's fetch before anything reaches the
// repository. Cross-source duplicates are merged by the repository upsert
// using the same merge policy.

use crate::domain::merge::merge_postings;
use crate::domain::{Fingerprint, JobPosting};
use std::collections::HashMap;

/// Outcome of offering a posting to the deduplicator
#[derive(Debug, Clone, PartialEq)]
pub enum Absorbed {
    /// First posting with this fingerprint in the run
    New(JobPosting),
    /// Merged into an earlier posting; carries the merged result
    Merged(JobPosting),
    /// Already fully represented
    Duplicate,
}

#[derive(Default)]
pub struct Deduplicator {
    seen: HashMap<Fingerprint, JobPosting>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, posting: JobPosting) -> Absorbed {
        match self.seen.get_mut(posting.fingerprint()) {
            None => {
                self.seen
                    .insert(posting.fingerprint().clone(), posting.clone());
                Absorbed::New(posting)
            }
            Some(existing) => {
                let merged = merge_postings(existing, &posting);
                if merged == *existing {
                    Absorbed::Duplicate
                } else {
                    *existing = merged.clone();
                    Absorbed::Merged(merged)
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Deduplicated postings, in no particular order
    pub fn into_postings(self) -> Vec<JobPosting> {
        self.seen.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(id: &str, company: &str, posted: i64, skills: &[&str]) -> JobPosting {
        JobPosting::new(id, "Rust Engineer", company, "Remote", "api", Some(posted))
            .with_skills(skills.iter().copied())
    }

    #[test]
    fn test_absorb_classifies_postings() {
        let mut dedup = Deduplicator::new();

        assert!(matches!(dedup.absorb(posting("1", "Acme", 100, &["rust"])), Absorbed::New(_)));
        assert!(matches!(dedup.absorb(posting("2", "Globex", 100, &[])), Absorbed::New(_)));
        assert_eq!(dedup.absorb(posting("3", "ACME", 100, &["rust"])), Absorbed::Duplicate);

        match dedup.absorb(posting("4", "acme", 50, &["tokio"])) {
            Absorbed::Merged(merged) => {
                assert_eq!(merged.id, "1");
                assert_eq!(merged.posted_at, Some(50));
                assert_eq!(merged.skills.to_vec(), vec!["rust", "tokio"]);
            }
            other => panic!("expected merge, got {other:?}"),
        }
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_result_is_independent_of_arrival_order() {
        let batch = vec![
            posting("1", "Acme", 100, &["rust"]),
            posting("2", "Acme", 300, &["aws"]).with_description("latest"),
            posting("3", "Acme", 200, &["sql"]),
        ];

        let collect = |items: Vec<JobPosting>| {
            let mut dedup = Deduplicator::new();
            for p in items {
                dedup.absorb(p);
            }
            let mut out = dedup.into_postings();
            for p in &mut out {
                p.id.clear();
            }
            out
        };

        let forward = collect(batch.clone());
        let backward = collect(batch.into_iter().rev().collect());
        assert_eq!(forward, backward);
        assert_eq!(forward[0].description, "latest");
        assert_eq!(forward[0].posted_at, Some(100));
    }
}
