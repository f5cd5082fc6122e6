//! Mention extraction: finds taxonomy skills in free text.
//!
//! Passes, sharing one set of claimed skills:
//! 1. multi-word skills, longest first, matched on word boundaries
//! 2. single tokens, including the parts of compound tokens like `react/redux`
//! 3. phrase chunks from the tokenizer (linguistic only), longest window first
//!
//! Multi-word and phrase matches also claim their byte spans. A token or window
//! overlapping a claimed span is skipped, so `react native` never also yields `react`
//! for the same stretch of text. The phrase pass runs last and only adds skills.

use crate::taxonomy::Taxonomy;
use crate::tokenize::{Phrase, Token, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Surface forms found in one text, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mentions(BTreeMap<String, BTreeSet<String>>);

impl Mentions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a surface form under a category. Returns false if it was already there.
    pub fn insert(&mut self, category: &str, surface: &str) -> bool {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(surface.to_string())
    }

    /// Surface forms for one category.
    pub fn get(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.0.get(category)
    }

    /// Categories with at least one mention, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All surface forms, category by category.
    pub fn flatten(&self) -> Vec<&str> {
        self.0
            .values()
            .flat_map(|skills| skills.iter().map(String::as_str))
            .collect()
    }

    pub fn contains(&self, surface: &str) -> bool {
        self.0.values().any(|skills| skills.contains(surface))
    }

    /// Total number of surface forms.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for Mentions {
    fn from(map: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self(map.into_iter().filter(|(_, v)| !v.is_empty()).collect())
    }
}

/// Extracts taxonomy skills from text.
#[derive(Debug)]
pub struct MentionExtractor {
    taxonomy: Arc<Taxonomy>,
    tokenizer: Box<dyn Tokenizer>,
    phrase_chunks: bool,
}

impl MentionExtractor {
    pub fn new(taxonomy: Arc<Taxonomy>, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            taxonomy,
            tokenizer,
            phrase_chunks: true,
        }
    }

    /// Enable or disable the phrase-chunk pass.
    pub fn with_phrase_chunks(mut self, enabled: bool) -> Self {
        self.phrase_chunks = enabled;
        self
    }

    pub fn tokenizer_name(&self) -> &'static str {
        self.tokenizer.name()
    }

    /// Extract mentions from `text`. Empty or skill-free text yields empty mentions.
    pub fn extract(&self, text: &str) -> Mentions {
        let text = text.to_lowercase();
        let mut pass = Pass::new(&self.taxonomy);

        if text.trim().is_empty() {
            return pass.mentions;
        }

        for skill in self.taxonomy.multiword_skills() {
            let free: Vec<(usize, usize)> = bounded_occurrences(&text, skill)
                .filter(|&(start, end)| !pass.is_claimed(start, end))
                .collect();
            if free.is_empty() {
                continue;
            }
            pass.record(skill);
            pass.spans.extend(free);
        }

        let analysis = self.tokenizer.analyze(&text, &self.taxonomy);

        for token in &analysis.tokens {
            pass.token(token);
        }

        if self.phrase_chunks {
            for phrase in &analysis.phrases {
                pass.phrase(phrase);
            }
        }

        debug!(
            tokenizer = self.tokenizer.name(),
            categories = pass.mentions.0.len(),
            mentions = pass.mentions.len(),
            "extracted mentions"
        );
        pass.mentions
    }
}

/// State for one extraction call.
struct Pass<'t> {
    taxonomy: &'t Taxonomy,
    mentions: Mentions,
    claimed: HashSet<&'t str>,
    spans: Vec<(usize, usize)>,
}

impl<'t> Pass<'t> {
    fn new(taxonomy: &'t Taxonomy) -> Self {
        Self {
            taxonomy,
            mentions: Mentions::new(),
            claimed: HashSet::new(),
            spans: Vec::new(),
        }
    }

    fn is_claimed(&self, start: usize, end: usize) -> bool {
        self.spans.iter().any(|&(s, e)| s < end && start < e)
    }

    /// Record a canonical skill under its category unless already claimed.
    fn record(&mut self, skill: &str) -> bool {
        let taxonomy = self.taxonomy;
        let Some(canonical) = taxonomy.get(skill) else {
            return false;
        };
        if !self.claimed.insert(canonical) {
            return false;
        }
        if let Some(category) = taxonomy.category_of_normalized(canonical) {
            self.mentions.insert(category, canonical);
        }
        true
    }

    /// Try every window of the phrase, longest first, claiming matched spans.
    fn phrase(&mut self, phrase: &Phrase<'_>) {
        let tokens = &phrase.tokens;
        for len in (2..=tokens.len()).rev() {
            for window in tokens.windows(len) {
                let (start, end) = (window[0].start, window[len - 1].end);
                if self.is_claimed(start, end) {
                    continue;
                }
                let text = window.iter().map(|t| t.text).collect::<Vec<_>>().join(" ");
                if self.taxonomy.get(&text).is_some() {
                    self.record(&text);
                    self.spans.push((start, end));
                }
            }
        }
    }

    fn token(&mut self, token: &Token<'_>) {
        if self.is_claimed(token.start, token.end) {
            return;
        }
        if self.taxonomy.get(token.text).is_some() {
            self.record(token.text);
            return;
        }
        if token.is_compound() {
            for part in token.parts() {
                if self.taxonomy.get(part.text).is_some() {
                    self.record(part.text);
                }
            }
        }
    }
}

/// Occurrences of `needle` not embedded in a larger alphanumeric run.
fn bounded_occurrences<'a>(
    haystack: &'a str,
    needle: &'a str,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    haystack
        .match_indices(needle)
        .map(move |(start, _)| (start, start + needle.len()))
        .filter(move |&(start, end)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[end..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
