pub mod config;
pub mod engine;
pub mod enrich;
pub mod extract;
pub mod matcher;
pub mod report;
pub mod similarity;
pub mod taxonomy;
pub mod tokenize;
pub mod vectorize;

pub use config::{ConfigError, ContainmentPolicy, EngineConfig, TokenizerKind};
pub use engine::SkillEngine;
pub use enrich::{enrich, rank, Enriched, EnrichedSkill};
pub use extract::{MentionExtractor, Mentions};
pub use matcher::{CanonicalMatcher, MatchStage, MatchStrategy, SkillMatch};
pub use report::SkillReport;
pub use taxonomy::Taxonomy;
