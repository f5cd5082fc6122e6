//! Enrichment and ranking of extracted mentions.

use crate::extract::Mentions;
use crate::matcher::CanonicalMatcher;
use crate::taxonomy::UNKNOWN_CATEGORY;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One surface form resolved to a canonical skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSkill {
    /// Surface form as extracted.
    pub original: String,
    pub canonical: String,
    pub confidence: f64,
    /// Taxonomy category of the canonical skill, or `unknown`.
    pub category: String,
}

/// Enriched records keyed by the category they were extracted under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Enriched(BTreeMap<String, Vec<EnrichedSkill>>);

impl Enriched {
    pub fn get(&self, category: &str) -> Option<&[EnrichedSkill]> {
        self.0.get(category).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EnrichedSkill])> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All records, category by category.
    pub fn records(&self) -> impl Iterator<Item = &EnrichedSkill> + '_ {
        self.0.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shorthand for [`rank`].
    pub fn top(&self, n: usize) -> Vec<EnrichedSkill> {
        rank(self, n)
    }
}

/// Match every mention and attach its canonical category.
///
/// Records for a category follow the sorted order of its surface forms.
pub fn enrich(matcher: &CanonicalMatcher, mentions: &Mentions, threshold: f64) -> Enriched {
    let taxonomy = matcher.taxonomy();
    let mut out = BTreeMap::new();

    for (category, surfaces) in mentions.iter() {
        let records: Vec<EnrichedSkill> = surfaces
            .iter()
            .map(|surface| {
                let m = matcher.match_skill(surface, threshold);
                let canonical_category = taxonomy
                    .category_of(&m.canonical)
                    .unwrap_or(UNKNOWN_CATEGORY)
                    .to_string();
                EnrichedSkill {
                    original: surface.clone(),
                    canonical: m.canonical,
                    confidence: m.confidence,
                    category: canonical_category,
                }
            })
            .collect();
        if !records.is_empty() {
            out.insert(category.to_string(), records);
        }
    }

    Enriched(out)
}

/// Flatten, sort by confidence descending, and keep the first `top_n`.
///
/// Equal confidences are ordered by canonical name, then by original surface form,
/// so the result does not depend on input order.
pub fn rank(enriched: &Enriched, top_n: usize) -> Vec<EnrichedSkill> {
    let mut records: Vec<EnrichedSkill> = enriched.records().cloned().collect();
    records.sort_by(by_rank);
    records.truncate(top_n);
    records
}

fn by_rank(a: &EnrichedSkill, b: &EnrichedSkill) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.canonical.cmp(&b.canonical))
        .then_with(|| a.original.cmp(&b.original))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainmentPolicy;
    use crate::taxonomy::Taxonomy;
    use std::sync::Arc;

    fn matcher() -> CanonicalMatcher {
        let taxonomy = Taxonomy::from_json_str(
            r#"{
                "languages": ["python", "java", "javascript"],
                "frameworks": ["react", "react native"],
                "ml": ["tensorflow", "machine learning"]
            }"#,
        )
        .unwrap();
        CanonicalMatcher::new(Arc::new(taxonomy), ContainmentPolicy::First)
    }

    fn mentions(entries: &[(&str, &str)]) -> Mentions {
        let mut mentions = Mentions::new();
        for (category, surface) in entries {
            mentions.insert(category, surface);
        }
        mentions
    }

    fn record(canonical: &str, confidence: f64) -> EnrichedSkill {
        EnrichedSkill {
            original: canonical.to_string(),
            canonical: canonical.to_string(),
            confidence,
            category: "x".to_string(),
        }
    }

    #[test]
    fn exact_mentions_enrich_with_full_confidence() {
        let enriched = enrich(
            &matcher(),
            &mentions(&[("languages", "python"), ("frameworks", "react native")]),
            0.5,
        );
        let languages = enriched.get("languages").unwrap();
        assert_eq!(languages.len(), 1);
        assert_eq!(languages[0].canonical, "python");
        assert_eq!(languages[0].category, "languages");
        assert!((languages[0].confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(enriched.len(), 2);
    }

    #[test]
    fn unmatched_surface_gets_unknown_category() {
        let enriched = enrich(&matcher(), &mentions(&[("misc", "cobol")]), 0.5);
        let misc = enriched.get("misc").unwrap();
        assert_eq!(misc[0].canonical, "cobol");
        assert_eq!(misc[0].category, UNKNOWN_CATEGORY);
        assert!(misc[0].confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn category_follows_the_canonical_skill() {
        let enriched = enrich(&matcher(), &mentions(&[("misc", "reactjs")]), 0.5);
        let record = &enriched.get("misc").unwrap()[0];
        assert_eq!(record.original, "reactjs");
        assert_eq!(record.canonical, "react");
        assert_eq!(record.category, "frameworks");
    }

    #[test]
    fn empty_mentions_enrich_to_empty() {
        let enriched = enrich(&matcher(), &Mentions::new(), 0.5);
        assert!(enriched.is_empty());
        assert!(rank(&enriched, 10).is_empty());
    }

    #[test]
    fn rank_sorts_and_truncates() {
        let mut map = BTreeMap::new();
        map.insert(
            "a".to_string(),
            vec![record("java", 0.6), record("python", 1.0)],
        );
        map.insert("b".to_string(), vec![record("react", 0.9)]);
        let enriched = Enriched(map);

        let ranked = rank(&enriched, 2);
        let names: Vec<&str> = ranked.iter().map(|r| r.canonical.as_str()).collect();
        assert_eq!(names, vec!["python", "react"]);

        assert_eq!(rank(&enriched, 10).len(), 3);
        assert!(rank(&enriched, 0).is_empty());
        assert_eq!(enriched.top(1)[0].canonical, "python");
    }

    #[test]
    fn ties_break_by_canonical_name() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![record("rust", 1.0)]);
        map.insert("b".to_string(), vec![record("go", 1.0), record("c", 1.0)]);
        let ranked = rank(&Enriched(map), 3);
        let names: Vec<&str> = ranked.iter().map(|r| r.canonical.as_str()).collect();
        assert_eq!(names, vec!["c", "go", "rust"]);
    }

    #[test]
    fn enrichment_is_deterministic() {
        let matcher = matcher();
        let input = mentions(&[
            ("languages", "javascript"),
            ("misc", "tensor flow"),
            ("misc", "reactjs"),
        ]);
        let first = enrich(&matcher, &input, 0.5);
        let second = enrich(&matcher, &input, 0.5);
        assert_eq!(first, second);
        assert_eq!(rank(&first, 5), rank(&second, 5));
    }
}
