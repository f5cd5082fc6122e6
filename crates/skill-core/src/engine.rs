//! The engine: one immutable context holding the taxonomy, tokenizer and fitted matcher.

use crate::config::{validate_threshold, ConfigError, EngineConfig};
use crate::enrich::{self, Enriched, EnrichedSkill};
use crate::extract::{MentionExtractor, Mentions};
use crate::matcher::{CanonicalMatcher, SkillMatch};
use crate::report::SkillReport;
use crate::taxonomy::Taxonomy;
use crate::tokenize::{build_tokenizer, log_tokenizer};
use std::sync::Arc;
use tracing::{debug, info};

/// Built once, then shared freely across threads; every operation takes `&self`.
#[derive(Debug)]
pub struct SkillEngine {
    taxonomy: Arc<Taxonomy>,
    extractor: MentionExtractor,
    matcher: CanonicalMatcher,
    threshold: f64,
    top_n: usize,
}

impl SkillEngine {
    /// Load the configured taxonomy (or the built-in one) and build the engine.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let taxonomy = match config.taxonomy_path {
            Some(ref path) => Taxonomy::load(path)?,
            None => Taxonomy::builtin()?,
        };
        Self::with_taxonomy(taxonomy, config)
    }

    /// Build the engine around an already-loaded taxonomy.
    pub fn with_taxonomy(taxonomy: Taxonomy, config: &EngineConfig) -> Result<Self, ConfigError> {
        let threshold = validate_threshold(config.threshold)?;
        let taxonomy = Arc::new(taxonomy);

        let tokenizer = build_tokenizer(config.tokenizer, &config.stopword_language);
        log_tokenizer(tokenizer.as_ref(), config.tokenizer);

        let extractor = MentionExtractor::new(Arc::clone(&taxonomy), tokenizer)
            .with_phrase_chunks(config.phrase_chunks);
        let matcher = CanonicalMatcher::new(Arc::clone(&taxonomy), config.containment_policy);

        info!(
            categories = taxonomy.categories().len(),
            skills = taxonomy.len(),
            digest = taxonomy.digest(),
            tokenizer = extractor.tokenizer_name(),
            "skill engine ready"
        );

        Ok(Self {
            taxonomy,
            extractor,
            matcher,
            threshold,
            top_n: config.top_n,
        })
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Configured matching threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Configured ranking size.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn extract(&self, text: &str) -> Mentions {
        self.extractor.extract(text)
    }

    /// Match one surface form at the configured threshold.
    pub fn match_skill(&self, surface_form: &str) -> SkillMatch {
        self.matcher.match_skill(surface_form, self.threshold)
    }

    pub fn match_many<'s, I>(&self, surface_forms: I) -> Vec<(String, SkillMatch)>
    where
        I: IntoIterator<Item = &'s str>,
    {
        self.matcher.match_many(surface_forms, self.threshold)
    }

    pub fn enrich(&self, mentions: &Mentions) -> Enriched {
        enrich::enrich(&self.matcher, mentions, self.threshold)
    }

    pub fn rank(&self, enriched: &Enriched) -> Vec<EnrichedSkill> {
        enrich::rank(enriched, self.top_n)
    }

    /// Extract, enrich and rank in one go.
    pub fn analyze(&self, text: &str) -> SkillReport {
        let mentions = self.extract(text);
        let enriched = self.enrich(&mentions);
        let top = self.rank(&enriched);
        debug!(
            mentions = mentions.len(),
            enriched = enriched.len(),
            top = top.len(),
            "analyzed text"
        );
        SkillReport::new(self.taxonomy.digest(), self.threshold, mentions, top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerKind;

    fn engine() -> SkillEngine {
        SkillEngine::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SkillEngine>();
    }

    #[test]
    fn builtin_taxonomy_loads() {
        let engine = engine();
        assert!(engine.taxonomy().contains("python"));
        assert!(engine.taxonomy().contains("react native"));
        assert!((engine.threshold() - 0.5).abs() < f64::EPSILON);
        assert_eq!(engine.top_n(), 20);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = EngineConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            SkillEngine::new(&config),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn analyze_finds_and_ranks_skills() {
        let report = engine().analyze("Python developer with React Native and Docker experience");
        assert!(report.mentions.contains("python"));
        assert!(report.mentions.contains("react native"));
        assert!(!report.mentions.contains("react"));
        assert!(report.top.iter().all(|r| (r.confidence - 1.0).abs() < f64::EPSILON));
        assert_eq!(report.top.len(), 3);
        assert_eq!(report.taxonomy_digest, engine().taxonomy().digest());
    }

    #[test]
    fn rank_respects_top_n() {
        let config = EngineConfig {
            top_n: 2,
            ..Default::default()
        };
        let engine = SkillEngine::new(&config).unwrap();
        let report = engine.analyze("python java rust docker kubernetes");
        assert_eq!(report.top.len(), 2);
    }

    #[test]
    fn empty_text_yields_empty_report() {
        let report = engine().analyze("   ");
        assert!(report.mentions.is_empty());
        assert!(report.top.is_empty());
    }

    #[test]
    fn default_tokenizer_keeps_short_skill_names() {
        let text = "Systems programmer: C, Go, R, Rust and Bash";
        let regex = SkillEngine::new(&EngineConfig {
            tokenizer: TokenizerKind::Regex,
            ..Default::default()
        })
        .unwrap();
        let mentions = engine().extract(text);
        assert!(mentions.contains("c"));
        assert_eq!(mentions, regex.extract(text));

        let taxonomy = Taxonomy::from_json_str(r#"{"languages": ["c", "go", "r"]}"#).unwrap();
        let custom = SkillEngine::with_taxonomy(taxonomy, &EngineConfig::default()).unwrap();
        assert_eq!(custom.extract(text).len(), 3);
    }

    #[test]
    fn regex_tokenizer_engine_works() {
        let config = EngineConfig {
            tokenizer: TokenizerKind::Regex,
            ..Default::default()
        };
        let engine = SkillEngine::new(&config).unwrap();
        assert_eq!(engine.match_skill("Golang").canonical, "golang");
        let mentions = engine.extract("We use c++ and node.js");
        assert!(mentions.contains("c++"));
        assert!(mentions.contains("node.js"));
    }
}
