// Skill Set & Term Matching

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical form of a skill token: trimmed, lower-cased, inner whitespace collapsed.
///
/// Returns `None` for tokens that are empty after trimming.
pub fn canonical_skill(raw: &str) -> Option<String> {
    let canonical = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if canonical.is_empty() {
        None
    } else {
        Some(canonical)
    }
}

/// Case-insensitive, deduplicated skill set.
///
/// Backed by a `BTreeSet` so iteration order is canonical (sorted) and
/// independent of insertion order. Merging two sets is therefore commutative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw skill; returns true if it was not already present
    pub fn insert(&mut self, raw: &str) -> bool {
        match canonical_skill(raw) {
            Some(skill) => self.0.insert(skill),
            None => false,
        }
    }

    pub fn contains(&self, raw: &str) -> bool {
        canonical_skill(raw).is_some_and(|skill| self.0.contains(&skill))
    }

    pub fn extend_from(&mut self, other: &SkillSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn union(&self, other: &SkillSet) -> SkillSet {
        let mut merged = self.clone();
        merged.extend_from(other);
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for SkillSet {
    fn from(skills: Vec<String>) -> Self {
        skills.into_iter().collect()
    }
}

impl From<SkillSet> for Vec<String> {
    fn from(set: SkillSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Characters that continue a token (`c++`, `c#` are single tokens)
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '#'
}

/// True if `needle` occurs in `haystack` delimited by token boundaries.
///
/// Both arguments are expected lower-cased. `"java"` is found in
/// `"java developer"` and `"java/spring"` but not in `"javascript"`.
pub fn contains_term(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

/// Split text into lower-cased alphanumeric tokens
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !is_word_char(c))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_set_is_case_insensitive_and_deduplicated() {
        let set: SkillSet = ["Python", " python ", "SQL", "Machine   Learning"]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 3);
        assert!(set.contains("PYTHON"));
        assert!(set.contains("machine learning"));
        assert_eq!(set.to_vec(), vec!["machine learning", "python", "sql"]);
    }

    #[test]
    fn test_skill_set_ignores_blank_entries() {
        let mut set = SkillSet::new();
        assert!(!set.insert("   "));
        assert!(set.is_empty());
    }

    #[test]
    fn test_union_is_commutative() {
        let a: SkillSet = ["rust", "go"].into_iter().collect();
        let b: SkillSet = ["go", "aws"].into_iter().collect();
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).len(), 3);
    }

    #[test]
    fn test_contains_term_respects_token_boundaries() {
        assert!(contains_term("senior java developer", "java"));
        assert!(contains_term("java/spring", "java"));
        assert!(!contains_term("javascript", "java"));
        assert!(!contains_term("c++ engineer", "c"));
        assert!(contains_term("c++ engineer", "c++"));
        assert!(contains_term("node.js", "node"));
        assert!(!contains_term("anything", ""));
    }

    #[test]
    fn test_skill_set_serializes_as_list() {
        let set: SkillSet = ["SQL", "python"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["python","sql"]"#);

        let back: SkillSet = serde_json::from_str(r#"["Python","python"]"#).unwrap();
        assert_eq!(back.len(), 1);
    }
}
