// Duplicate Merge Policy
//
// Merging two postings with the same fingerprint must converge no matter the
// order in which sources deliver them. One record "wins" the content fields by
// a total order (content_key) over every field it contributes; everything else
// is a join (union, min, max, or). Because the merged record carries exactly
// the winner's key, the operation is commutative, associative and idempotent.

use super::posting::{JobPosting, SalaryRange};
use std::cmp::Ordering;

type ContentKey<'a> = (Option<i64>, &'a str, &'a str, &'a SalaryRange, &'a str, &'a str, &'a str);

/// Total order deciding whose fields survive a merge: most recently posted
/// first, then source name, description, salary and the display casing of
/// title, company and location as deterministic tie-breaks.
fn content_key(p: &JobPosting) -> ContentKey<'_> {
    (
        p.latest_posted_at,
        p.source.as_str(),
        p.description.as_str(),
        &p.salary,
        p.title(),
        p.company(),
        p.location(),
    )
}

/// Merge `incoming` into `existing` (same fingerprint).
///
/// The result keeps the existing id; all other fields are independent of
/// argument order.
pub fn merge_postings(existing: &JobPosting, incoming: &JobPosting) -> JobPosting {
    debug_assert_eq!(existing.fingerprint(), incoming.fingerprint());

    let (winner, other) = match content_key(existing).cmp(&content_key(incoming)) {
        Ordering::Less => (incoming, existing),
        Ordering::Equal | Ordering::Greater => (existing, incoming),
    };

    let mut merged = winner.clone();
    merged.id = existing.id.clone();
    merged.skills = winner.skills.union(&other.skills);
    merged.posted_at = earliest(winner.posted_at, other.posted_at);
    merged.latest_posted_at = winner.latest_posted_at.max(other.latest_posted_at);
    merged.remote = winner.remote || other.remote;
    // Joins, so they never depend on which side won: known beats unknown,
    // the higher level and the greater url break the rest
    merged.experience_level = winner.experience_level.max(other.experience_level);
    merged.apply_url = winner.apply_url.clone().max(other.apply_url.clone());
    merged
}

fn earliest(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// True when `merge_postings(existing, incoming)` would not change `existing`
pub fn is_absorbed(existing: &JobPosting, incoming: &JobPosting) -> bool {
    merge_postings(existing, incoming) == *existing
}
