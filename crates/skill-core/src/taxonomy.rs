//! Taxonomy store: category to canonical-skill reference data.
//!
//! Loaded once from JSON, YAML, or the embedded built-in file and read-only afterwards.
//! Skill names are lowercased and trimmed at load time; each skill belongs to exactly
//! one category (first occurrence wins).

use crate::config::ConfigError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Built-in taxonomy shipped with the crate.
const BUILTIN_TAXONOMY: &str = include_str!("../data/skills.json");

/// Category reported for canonical names the taxonomy does not know.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// A category and its canonical skills in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone)]
struct SkillEntry {
    name: String,
    category: usize,
}

/// Immutable skill taxonomy with derived lookup structures.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
    /// All canonical skills in insertion order.
    skills: Vec<SkillEntry>,
    /// Normalized skill -> index into `skills`.
    index: HashMap<String, usize>,
    /// Indices of skills containing whitespace, longest first.
    multiword: Vec<usize>,
    digest: String,
}

impl Taxonomy {
    /// Load the embedded built-in taxonomy.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_TAXONOMY)
    }

    /// Load a taxonomy file, picking the format from the extension.
    ///
    /// `.json` is parsed as JSON, `.yaml`/`.yml` as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let taxonomy = match extension.as_deref() {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
            }
        };

        debug!(
            path = %path.display(),
            categories = taxonomy.categories.len(),
            skills = taxonomy.len(),
            multiword = taxonomy.multiword.len(),
            digest = %taxonomy.digest,
            "loaded taxonomy"
        );
        Ok(taxonomy)
    }

    /// Parse a JSON taxonomy document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::MalformedTaxonomy(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Parse a YAML taxonomy document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::MalformedTaxonomy(format!("invalid YAML: {e}")))?;
        Self::from_value(&value)
    }

    /// Build from a parsed document: a mapping of category name to a list of strings.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::MalformedTaxonomy(
                "top level must be a mapping of category to skill list".to_string(),
            ));
        };

        let mut raw = Vec::with_capacity(map.len());
        for (category, skills) in map {
            let Value::Array(items) = skills else {
                return Err(ConfigError::MalformedTaxonomy(format!(
                    "category '{category}' must map to a list of skills"
                )));
            };
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                let Value::String(name) = item else {
                    return Err(ConfigError::MalformedTaxonomy(format!(
                        "category '{category}' contains a non-string entry: {item}"
                    )));
                };
                names.push(name.as_str());
            }
            raw.push((category.as_str(), names));
        }

        Self::from_categories(raw)
    }

    /// Build from category/skill pairs, normalizing and de-duplicating skills.
    pub fn from_categories<'a, I, S>(categories: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, S)>,
        S: IntoIterator<Item = &'a str>,
    {
        let mut built: Vec<Category> = Vec::new();
        let mut skills: Vec<SkillEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (category_name, names) in categories {
            let category_name = category_name.trim();
            if category_name.is_empty() {
                return Err(ConfigError::MalformedTaxonomy(
                    "category names cannot be empty".to_string(),
                ));
            }
            if built.iter().any(|c| c.name == category_name) {
                return Err(ConfigError::MalformedTaxonomy(format!(
                    "category '{category_name}' is defined twice"
                )));
            }

            let category_idx = built.len();
            let mut members = Vec::new();

            for name in names {
                let normalized = normalize(name);
                if normalized.is_empty() {
                    return Err(ConfigError::MalformedTaxonomy(format!(
                        "category '{category_name}' contains an empty skill name"
                    )));
                }
                if let Some(&existing) = index.get(&normalized) {
                    warn!(
                        skill = %normalized,
                        category = category_name,
                        kept_in = %built
                            .get(skills[existing].category)
                            .map_or(category_name, |c| c.name.as_str()),
                        "duplicate skill, keeping first occurrence"
                    );
                    continue;
                }
                index.insert(normalized.clone(), skills.len());
                skills.push(SkillEntry {
                    name: normalized.clone(),
                    category: category_idx,
                });
                members.push(normalized);
            }

            if members.is_empty() {
                debug!(category = category_name, "category has no skills");
            }

            built.push(Category {
                name: category_name.to_string(),
                skills: members,
            });
        }

        if skills.is_empty() {
            return Err(ConfigError::EmptyTaxonomy);
        }

        let mut multiword: Vec<usize> = skills
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name.contains(char::is_whitespace))
            .map(|(i, _)| i)
            .collect();
        // Stable sort keeps insertion order among equal lengths.
        multiword.sort_by(|&a, &b| {
            skills[b]
                .name
                .chars()
                .count()
                .cmp(&skills[a].name.chars().count())
        });

        let digest = compute_digest(&built);

        Ok(Self {
            categories: built,
            skills,
            index,
            multiword,
            digest,
        })
    }

    /// Category of a canonical skill, if the taxonomy knows it.
    pub fn category_of(&self, skill: &str) -> Option<&str> {
        self.index
            .get(&normalize(skill))
            .map(|&i| self.categories[self.skills[i].category].name.as_str())
    }

    /// Stored canonical name for an already-normalized key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.skills[i].name.as_str())
    }

    /// Whether the normalized form of `skill` is a canonical skill.
    pub fn contains(&self, skill: &str) -> bool {
        self.index.contains_key(&normalize(skill))
    }

    /// Category lookup for an already-normalized key, without allocating.
    pub(crate) fn category_of_normalized(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&i| self.categories[self.skills[i].category].name.as_str())
    }

    /// Canonical skills in taxonomy insertion order.
    pub fn skills(&self) -> impl Iterator<Item = &str> + '_ {
        self.skills.iter().map(|s| s.name.as_str())
    }

    /// Canonical skill at a position in insertion order.
    pub(crate) fn skill_at(&self, idx: usize) -> &str {
        &self.skills[idx].name
    }

    /// Categories in insertion order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Skills belonging to a category, or `None` if the category is unknown.
    pub fn skills_in(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.skills.as_slice())
    }

    /// Multi-word skills, longest first.
    pub fn multiword_skills(&self) -> impl Iterator<Item = &str> + '_ {
        self.multiword.iter().map(|&i| self.skills[i].name.as_str())
    }

    /// Number of canonical skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// SHA-256 of the normalized taxonomy, hex encoded.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Lowercase a skill or surface form, trim it and collapse inner whitespace runs.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compute_digest(categories: &[Category]) -> String {
    let mut hasher = Sha256::new();
    for category in categories {
        hasher.update(category.name.as_bytes());
        hasher.update([0u8]);
        for skill in &category.skills {
            hasher.update(skill.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([1u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Taxonomy {
        Taxonomy::from_json_str(
            r#"{
                "languages": ["Python", " JavaScript ", "java"],
                "frameworks": ["react", "React Native", "ruby on rails"],
                "ml": ["tensorflow", "machine learning"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn normalizes_skill_names() {
        let taxonomy = sample();
        assert!(taxonomy.contains("python"));
        assert!(taxonomy.contains("  JAVASCRIPT"));
        assert_eq!(taxonomy.category_of("React Native"), Some("frameworks"));
        assert_eq!(taxonomy.category_of("rust"), None);
    }

    #[test]
    fn collapses_inner_whitespace() {
        let taxonomy = Taxonomy::from_json_str(
            r#"{"frameworks": ["react  native", "ruby\ton \n rails"]}"#,
        )
        .unwrap();
        let multi: Vec<_> = taxonomy.multiword_skills().collect();
        assert_eq!(multi, vec!["ruby on rails", "react native"]);
        assert!(taxonomy.contains("React   Native"));
        assert_eq!(normalize("  Machine \t Learning "), "machine learning");
    }

    #[test]
    fn preserves_insertion_order() {
        let taxonomy = sample();
        let skills: Vec<_> = taxonomy.skills().collect();
        assert_eq!(
            skills,
            vec![
                "python",
                "javascript",
                "java",
                "react",
                "react native",
                "ruby on rails",
                "tensorflow",
                "machine learning"
            ]
        );
        let names: Vec<_> = taxonomy.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["languages", "frameworks", "ml"]);
    }

    #[test]
    fn multiword_skills_are_longest_first() {
        let taxonomy = sample();
        let multi: Vec<_> = taxonomy.multiword_skills().collect();
        assert_eq!(multi, vec!["machine learning", "ruby on rails", "react native"]);
    }

    #[test]
    fn duplicate_skills_keep_first_category() {
        let taxonomy = Taxonomy::from_json_str(
            r#"{"languages": ["python", "sql"], "databases": ["SQL", "postgresql"]}"#,
        )
        .unwrap();
        assert_eq!(taxonomy.len(), 3);
        assert_eq!(taxonomy.category_of("sql"), Some("languages"));
        assert_eq!(taxonomy.skills_in("databases").unwrap(), ["postgresql"]);
    }

    #[test]
    fn rejects_non_mapping() {
        let err = Taxonomy::from_json_str(r#"["python"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTaxonomy(_)));
    }

    #[test]
    fn rejects_non_list_category() {
        let err = Taxonomy::from_json_str(r#"{"languages": "python"}"#).unwrap_err();
        assert!(err.to_string().contains("languages"));
    }

    #[test]
    fn rejects_non_string_skill() {
        let err = Taxonomy::from_json_str(r#"{"languages": ["python", 3]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTaxonomy(_)));
    }

    #[test]
    fn rejects_blank_skill() {
        let err = Taxonomy::from_json_str(r#"{"languages": ["  "]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTaxonomy(_)));
    }

    #[test]
    fn rejects_empty_taxonomy() {
        assert!(matches!(
            Taxonomy::from_json_str("{}"),
            Err(ConfigError::EmptyTaxonomy)
        ));
        assert!(matches!(
            Taxonomy::from_json_str(r#"{"languages": []}"#),
            Err(ConfigError::EmptyTaxonomy)
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = Taxonomy::from_json_str("{not json").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn parses_yaml() {
        let taxonomy = Taxonomy::from_yaml_str(
            "languages:\n  - Python\n  - Rust\ndevops:\n  - docker\n",
        )
        .unwrap();
        assert_eq!(taxonomy.category_of("rust"), Some("languages"));
        assert_eq!(taxonomy.category_of("docker"), Some("devops"));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = sample();
        let b = sample();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        let c = Taxonomy::from_json_str(r#"{"languages": ["python"]}"#).unwrap();
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("skills.yml");
        std::fs::write(&yaml, "ml:\n  - pytorch\n").unwrap();
        assert!(Taxonomy::load(&yaml).unwrap().contains("pytorch"));

        let toml = dir.path().join("skills.toml");
        std::fs::write(&toml, "ml = [\"pytorch\"]\n").unwrap();
        assert!(matches!(
            Taxonomy::load(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn builtin_taxonomy_loads() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert!(taxonomy.contains("python"));
        assert!(taxonomy.contains("react native"));
        assert_eq!(taxonomy.category_of("tensorflow"), Some("machine_learning"));
    }
}
