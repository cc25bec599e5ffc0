// Known-skill catalog used for description scanning and effort estimates

use super::skill::contains_term;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Language,
    Framework,
    Database,
    Cloud,
    DataScience,
    Tooling,
}

const CATALOG: &[(&str, SkillCategory)] = &[
    ("python", SkillCategory::Language),
    ("javascript", SkillCategory::Language),
    ("typescript", SkillCategory::Language),
    ("java", SkillCategory::Language),
    ("c++", SkillCategory::Language),
    ("c#", SkillCategory::Language),
    ("go", SkillCategory::Language),
    ("golang", SkillCategory::Language),
    ("rust", SkillCategory::Language),
    ("scala", SkillCategory::Language),
    ("kotlin", SkillCategory::Language),
    ("ruby", SkillCategory::Language),
    ("php", SkillCategory::Language),
    ("r", SkillCategory::Language),
    ("react", SkillCategory::Framework),
    ("vue", SkillCategory::Framework),
    ("angular", SkillCategory::Framework),
    ("node.js", SkillCategory::Framework),
    ("django", SkillCategory::Framework),
    ("flask", SkillCategory::Framework),
    ("fastapi", SkillCategory::Framework),
    ("spring", SkillCategory::Framework),
    ("rails", SkillCategory::Framework),
    ("sql", SkillCategory::Database),
    ("postgresql", SkillCategory::Database),
    ("mysql", SkillCategory::Database),
    ("mongodb", SkillCategory::Database),
    ("redis", SkillCategory::Database),
    ("elasticsearch", SkillCategory::Database),
    ("aws", SkillCategory::Cloud),
    ("gcp", SkillCategory::Cloud),
    ("azure", SkillCategory::Cloud),
    ("docker", SkillCategory::Cloud),
    ("kubernetes", SkillCategory::Cloud),
    ("terraform", SkillCategory::Cloud),
    ("machine learning", SkillCategory::DataScience),
    ("deep learning", SkillCategory::DataScience),
    ("data science", SkillCategory::DataScience),
    ("tensorflow", SkillCategory::DataScience),
    ("pytorch", SkillCategory::DataScience),
    ("scikit-learn", SkillCategory::DataScience),
    ("pandas", SkillCategory::DataScience),
    ("numpy", SkillCategory::DataScience),
    ("spark", SkillCategory::DataScience),
    ("mlops", SkillCategory::DataScience),
    ("git", SkillCategory::Tooling),
    ("jenkins", SkillCategory::Tooling),
    ("excel", SkillCategory::Tooling),
    ("tableau", SkillCategory::Tooling),
    ("powerbi", SkillCategory::Tooling),
    ("graphql", SkillCategory::Tooling),
];

/// Skills shorter than this are only taken from explicit tag lists, never from prose
/// (a bare "r" or "go" in a sentence is too ambiguous).
const MIN_SCANNED_SKILL_LEN: usize = 3;

/// Look up the catalog category of a canonical (lower-cased) skill
pub fn skill_category(skill: &str) -> Option<SkillCategory> {
    CATALOG
        .iter()
        .find(|(name, _)| *name == skill)
        .map(|(_, category)| *category)
}

/// Scan free text for catalog skills using token-boundary matching
pub fn extract_known_skills(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    CATALOG
        .iter()
        .filter(|(name, _)| name.len() >= MIN_SCANNED_SKILL_LEN)
        .filter(|(name, _)| contains_term(&lowered, name))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_known_skills_from_description() {
        let skills = extract_known_skills(
            "We need a Senior Python dev with Django, PostgreSQL and AWS. JavaScript is a plus.",
        );
        assert!(skills.contains(&"python"));
        assert!(skills.contains(&"django"));
        assert!(skills.contains(&"postgresql"));
        assert!(skills.contains(&"aws"));
        assert!(skills.contains(&"javascript"));
        assert!(!skills.contains(&"java"));
    }

    #[test]
    fn test_short_skills_are_not_scanned() {
        let skills = extract_known_skills("Let's go build R&D tools");
        assert!(!skills.contains(&"go"));
        assert!(!skills.contains(&"r"));
    }

    #[test]
    fn test_skill_category_lookup() {
        assert_eq!(skill_category("kubernetes"), Some(SkillCategory::Cloud));
        assert_eq!(skill_category("machine learning"), Some(SkillCategory::DataScience));
        assert_eq!(skill_category("underwater basket weaving"), None);
    }
}
