//! Tokenizers for the single-token and phrase-chunk extraction passes.
//!
//! `RegexTokenizer` is always available. `LinguisticTokenizer` (feature `linguistic`)
//! additionally drops stop-words and groups adjacent content words into phrases.
//! A stop-word that is itself a taxonomy skill (`c`, `r`, `go`) is kept as content.

use crate::config::TokenizerKind;
use crate::taxonomy::Taxonomy;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Word tokens: alphanumeric runs joined by `.`, `/` or `-`, with an optional
/// `++` or `#` suffix so `c++`, `c#`, `node.js` and `ci/cd` stay whole.
const TOKEN_PATTERN: &str = r"[\p{L}\p{N}]+(?:[./\-][\p{L}\p{N}]+)*(?:\+\+|#)?";

/// A token with its byte span in the analyzed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    /// Whether the token joins several parts with `.`, `/` or `-`.
    pub fn is_compound(&self) -> bool {
        self.text.contains(['.', '/', '-'])
    }

    /// Sub-tokens of a compound token, with spans relative to the full text.
    pub fn parts(&self) -> impl Iterator<Item = Token<'a>> + '_ {
        let base = self.start;
        let text = self.text;
        text.split(['.', '/', '-'])
            .scan(0usize, move |offset, part| {
                let start = *offset;
                *offset += part.len() + 1;
                Some(Token {
                    text: part,
                    start: base + start,
                    end: base + start + part.len(),
                })
            })
            .filter(|t| !t.text.is_empty())
    }

    /// Whether the span overlaps `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// A run of adjacent content tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase<'a> {
    pub tokens: Vec<Token<'a>>,
}

impl Phrase<'_> {
    /// Tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output of a tokenizer run over lowercase text.
#[derive(Debug, Clone, Default)]
pub struct Analysis<'a> {
    /// Content tokens in text order.
    pub tokens: Vec<Token<'a>>,
    /// Runs of two or more content tokens. Empty for tokenizers without chunking.
    pub phrases: Vec<Phrase<'a>>,
}

/// Splits lowercase text into tokens and optional phrases.
pub trait Tokenizer: Send + Sync + fmt::Debug {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Tokenize already-lowercased text. Tokens that are skills in `taxonomy` are
    /// never filtered out.
    fn analyze<'a>(&self, text: &'a str, taxonomy: &Taxonomy) -> Analysis<'a>;
}

/// Pure regex word splitting. Never drops a word.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    pattern: Regex,
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexTokenizer {
    pub fn new() -> Self {
        Self {
            pattern: word_pattern(),
        }
    }

    fn tokens<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        self.pattern
            .find_iter(text)
            .map(|m| Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

impl Tokenizer for RegexTokenizer {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn analyze<'a>(&self, text: &'a str, _taxonomy: &Taxonomy) -> Analysis<'a> {
        Analysis {
            tokens: self.tokens(text),
            phrases: Vec::new(),
        }
    }
}

fn word_pattern() -> Regex {
    Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex")
}

#[cfg(feature = "linguistic")]
pub use linguistic::{LinguisticTokenizer, StopwordFilter};

#[cfg(feature = "linguistic")]
mod linguistic {
    use super::{Analysis, Phrase, RegexTokenizer, Taxonomy, Token, Tokenizer};
    use std::collections::HashSet;
    use stop_words::{get, LANGUAGE};

    /// Stop-word set for one language.
    #[derive(Debug, Clone, Default)]
    pub struct StopwordFilter {
        stopwords: HashSet<String>,
    }

    impl StopwordFilter {
        /// Stop-words for the given language code, falling back to English.
        pub fn new(language: &str) -> Self {
            let lang = match language.to_lowercase().as_str() {
                "de" | "german" => LANGUAGE::German,
                "fr" | "french" => LANGUAGE::French,
                "es" | "spanish" => LANGUAGE::Spanish,
                "it" | "italian" => LANGUAGE::Italian,
                "pt" | "portuguese" => LANGUAGE::Portuguese,
                "nl" | "dutch" => LANGUAGE::Dutch,
                _ => LANGUAGE::English,
            };
            Self {
                stopwords: get(lang).iter().map(|s| s.to_string()).collect(),
            }
        }

        /// Filter built from an explicit list.
        pub fn from_list(words: &[&str]) -> Self {
            Self {
                stopwords: words.iter().map(|w| w.to_lowercase()).collect(),
            }
        }

        pub fn is_stopword(&self, word: &str) -> bool {
            self.stopwords.contains(word)
        }

        pub fn len(&self) -> usize {
            self.stopwords.len()
        }

        pub fn is_empty(&self) -> bool {
            self.stopwords.is_empty()
        }
    }

    /// Regex tokens minus stop-words, plus content-word phrases.
    ///
    /// A phrase is a run of two or more adjacent content tokens separated only by
    /// whitespace. Punctuation and stop-words end a phrase. Taxonomy skills always
    /// count as content.
    #[derive(Debug, Clone)]
    pub struct LinguisticTokenizer {
        words: RegexTokenizer,
        stopwords: StopwordFilter,
    }

    impl LinguisticTokenizer {
        pub fn new(language: &str) -> Self {
            Self::with_stopwords(StopwordFilter::new(language))
        }

        pub fn with_stopwords(stopwords: StopwordFilter) -> Self {
            Self {
                words: RegexTokenizer::new(),
                stopwords,
            }
        }

        fn is_content(&self, token: &str, taxonomy: &Taxonomy) -> bool {
            !self.stopwords.is_stopword(token) || taxonomy.get(token).is_some()
        }

        fn phrases<'a>(
            &self,
            text: &str,
            tokens: &[Token<'a>],
            taxonomy: &Taxonomy,
        ) -> Vec<Phrase<'a>> {
            let mut phrases = Vec::new();
            let mut run: Vec<Token<'a>> = Vec::new();
            let mut last_end: Option<usize> = None;

            for token in tokens {
                let adjacent = last_end
                    .is_some_and(|end| text[end..token.start].chars().all(char::is_whitespace));
                let content = self.is_content(token.text, taxonomy);

                if !(adjacent && content) {
                    flush(&mut run, &mut phrases);
                }
                if content {
                    run.push(*token);
                }
                last_end = Some(token.end);
            }
            flush(&mut run, &mut phrases);
            phrases
        }
    }

    fn flush<'a>(run: &mut Vec<Token<'a>>, phrases: &mut Vec<Phrase<'a>>) {
        if run.len() >= 2 {
            phrases.push(Phrase {
                tokens: std::mem::take(run),
            });
        }
        run.clear();
    }

    impl Tokenizer for LinguisticTokenizer {
        fn name(&self) -> &'static str {
            "linguistic"
        }

        fn analyze<'a>(&self, text: &'a str, taxonomy: &Taxonomy) -> Analysis<'a> {
            let all = self.words.tokens(text);
            let phrases = self.phrases(text, &all, taxonomy);
            let tokens = all
                .into_iter()
                .filter(|t| self.is_content(t.text, taxonomy))
                .collect();
            Analysis { tokens, phrases }
        }
    }
}

/// Build the tokenizer for a configured kind.
///
/// Asking for `linguistic` without the feature compiled in downgrades to regex.
pub fn build_tokenizer(kind: TokenizerKind, language: &str) -> Box<dyn Tokenizer> {
    match kind {
        TokenizerKind::Regex => Box::new(RegexTokenizer::new()),
        TokenizerKind::Auto | TokenizerKind::Linguistic => linguistic_or_regex(kind, language),
    }
}

#[cfg(feature = "linguistic")]
fn linguistic_or_regex(_kind: TokenizerKind, language: &str) -> Box<dyn Tokenizer> {
    Box::new(LinguisticTokenizer::new(language))
}

#[cfg(not(feature = "linguistic"))]
fn linguistic_or_regex(kind: TokenizerKind, _language: &str) -> Box<dyn Tokenizer> {
    debug!(
        requested = kind.as_str(),
        "linguistic tokenizer not compiled in, using regex"
    );
    Box::new(RegexTokenizer::new())
}

/// Log which tokenizer an extractor ended up with.
pub(crate) fn log_tokenizer(tokenizer: &dyn Tokenizer, requested: TokenizerKind) {
    debug!(
        requested = requested.as_str(),
        tokenizer = tokenizer.name(),
        "tokenizer selected"
    );
}
