//! Canonical matcher: maps a surface form to a canonical skill with a confidence.
//!
//! Stages run in order and the first one that accepts wins:
//! 1. exact lookup (confidence 1.0)
//! 2. substring containment scored by gestalt similarity
//! 3. character n-gram TF-IDF cosine similarity
//!
//! When no stage accepts, the normalized surface form comes back with confidence 0.0.
//! Matching never fails.

use crate::config::ContainmentPolicy;
use crate::similarity::ratio;
use crate::taxonomy::{normalize, Taxonomy};
use crate::vectorize::NgramVectorizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Which stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    Containment,
    Vector,
    /// No stage accepted; canonical is the normalized input.
    None,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Containment => "containment",
            Self::Vector => "vector",
            Self::None => "none",
        }
    }
}

/// Result of matching one surface form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub canonical: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub stage: MatchStage,
}

impl SkillMatch {
    pub fn is_match(&self) -> bool {
        self.stage != MatchStage::None
    }
}

/// A canonical skill proposed by one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'t> {
    pub canonical: &'t str,
    pub confidence: f64,
}

/// One stage of the matching cascade.
pub trait MatchStrategy: Send + Sync + fmt::Debug {
    fn stage(&self) -> MatchStage;

    /// Propose a canonical skill for an already-normalized, non-empty query.
    fn attempt<'t>(
        &self,
        taxonomy: &'t Taxonomy,
        query: &str,
        threshold: f64,
    ) -> Option<Candidate<'t>>;
}

/// Stage 1: the query is itself a canonical skill.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn stage(&self) -> MatchStage {
        MatchStage::Exact
    }

    fn attempt<'t>(
        &self,
        taxonomy: &'t Taxonomy,
        query: &str,
        _threshold: f64,
    ) -> Option<Candidate<'t>> {
        taxonomy.get(query).map(|canonical| Candidate {
            canonical,
            confidence: 1.0,
        })
    }
}

/// Stage 2: one string contains the other; scored by gestalt ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatch {
    pub policy: ContainmentPolicy,
}

impl MatchStrategy for ContainmentMatch {
    fn stage(&self) -> MatchStage {
        MatchStage::Containment
    }

    fn attempt<'t>(
        &self,
        taxonomy: &'t Taxonomy,
        query: &str,
        threshold: f64,
    ) -> Option<Candidate<'t>> {
        let mut accepted = taxonomy
            .skills()
            .filter(|skill| skill.contains(query) || query.contains(*skill))
            .map(|canonical| Candidate {
                canonical,
                confidence: ratio(query, canonical),
            })
            .filter(|c| c.confidence >= threshold);

        match self.policy {
            ContainmentPolicy::First => accepted.next(),
            ContainmentPolicy::Best => accepted.fold(None, |best: Option<Candidate<'t>>, c| {
                match best {
                    Some(b) if b.confidence >= c.confidence => Some(b),
                    _ => Some(c),
                }
            }),
        }
    }
}

/// Stage 3: cosine similarity over character n-gram TF-IDF vectors.
///
/// The vectorizer is fitted on the taxonomy's skills in insertion order, so document
/// indices line up with `Taxonomy::skills()`.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    vectorizer: NgramVectorizer,
}

impl VectorMatch {
    pub fn fit(taxonomy: &Taxonomy) -> Self {
        Self {
            vectorizer: NgramVectorizer::fit(taxonomy.skills()),
        }
    }
}

impl MatchStrategy for VectorMatch {
    fn stage(&self) -> MatchStage {
        MatchStage::Vector
    }

    fn attempt<'t>(
        &self,
        taxonomy: &'t Taxonomy,
        query: &str,
        threshold: f64,
    ) -> Option<Candidate<'t>> {
        // A zero query vector means no shared n-grams: treated as score 0.0.
        let (idx, score) = self.vectorizer.most_similar(query)?;
        if idx >= taxonomy.len() || score <= 0.0 || score < threshold {
            return None;
        }
        Some(Candidate {
            canonical: taxonomy.skill_at(idx),
            confidence: score,
        })
    }
}

/// Runs the stage cascade against a shared taxonomy.
#[derive(Debug, Clone)]
pub struct CanonicalMatcher {
    taxonomy: Arc<Taxonomy>,
    strategies: Vec<Arc<dyn MatchStrategy>>,
}

impl CanonicalMatcher {
    /// Standard cascade: exact, containment, vector.
    pub fn new(taxonomy: Arc<Taxonomy>, policy: ContainmentPolicy) -> Self {
        let vector = VectorMatch::fit(&taxonomy);
        Self {
            taxonomy,
            strategies: vec![
                Arc::new(ExactMatch),
                Arc::new(ContainmentMatch { policy }),
                Arc::new(vector),
            ],
        }
    }

    /// Cascade with caller-supplied stages, tried in order.
    pub fn with_strategies(
        taxonomy: Arc<Taxonomy>,
        strategies: Vec<Arc<dyn MatchStrategy>>,
    ) -> Self {
        Self {
            taxonomy,
            strategies,
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Match one surface form. Never fails.
    pub fn match_skill(&self, surface_form: &str, threshold: f64) -> SkillMatch {
        let query = normalize(surface_form);
        if query.is_empty() {
            return no_match(query);
        }

        for strategy in &self.strategies {
            if let Some(candidate) = strategy.attempt(&self.taxonomy, &query, threshold) {
                trace!(
                    surface = %query,
                    canonical = candidate.canonical,
                    confidence = candidate.confidence,
                    stage = strategy.stage().as_str(),
                    "matched"
                );
                return SkillMatch {
                    canonical: candidate.canonical.to_string(),
                    confidence: candidate.confidence.clamp(0.0, 1.0),
                    stage: strategy.stage(),
                };
            }
        }

        trace!(surface = %query, "no match");
        no_match(query)
    }

    /// Match several surface forms, preserving input order.
    pub fn match_many<'s, I>(&self, surface_forms: I, threshold: f64) -> Vec<(String, SkillMatch)>
    where
        I: IntoIterator<Item = &'s str>,
    {
        surface_forms
            .into_iter()
            .map(|s| (s.to_string(), self.match_skill(s, threshold)))
            .collect()
    }
}

fn no_match(query: String) -> SkillMatch {
    SkillMatch {
        canonical: query,
        confidence: 0.0,
        stage: MatchStage::None,
    }
}
