//! Character n-gram TF-IDF vectors for fuzzy skill matching.
//!
//! Each whitespace-separated word is padded with one space on both sides and cut
//! into overlapping n-grams for n = 2..=4; once the padded word is no longer than n
//! it is counted whole a single time.
//! IDF is smoothed, `ln((1 + N) / (1 + df)) + 1`, and vectors are L2-normalized, so
//! cosine similarity is a sparse dot product.

use std::collections::HashMap;

const MIN_N: usize = 2;
const MAX_N: usize = 4;

/// Sparse L2-normalized vector, sorted by dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product of two sorted sparse vectors.
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (da, va) = self.entries[i];
            let (db, vb) = other.entries[j];
            match da.cmp(&db) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += va * vb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// TF-IDF model fitted once over the canonical vocabulary.
#[derive(Debug, Clone)]
pub struct NgramVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
    /// One vector per fitted document, in fit order.
    documents: Vec<SparseVector>,
}

impl NgramVectorizer {
    /// Fit vocabulary and IDF weights over `documents` and vectorize them.
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let counted: Vec<HashMap<String, usize>> =
            documents.into_iter().map(count_ngrams).collect();

        let mut vocabulary: HashMap<String, u32> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for counts in &counted {
            // Sorted so dimension ids do not depend on hash order.
            let mut grams: Vec<&String> = counts.keys().collect();
            grams.sort();
            for gram in grams {
                let next = vocabulary.len() as u32;
                let dim = *vocabulary.entry(gram.clone()).or_insert(next);
                if dim as usize == df.len() {
                    df.push(0);
                }
                df[dim as usize] += 1;
            }
        }

        let n_docs = counted.len() as f64;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n_docs) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut vectorizer = Self {
            vocabulary,
            idf,
            documents: Vec::new(),
        };
        vectorizer.documents = counted.iter().map(|c| vectorizer.weigh(c)).collect();
        vectorizer
    }

    /// Vectorize a query. N-grams outside the fitted vocabulary are ignored,
    /// so an unseen or empty query yields the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&count_ngrams(text))
    }

    /// Fitted document vectors, in fit order.
    pub fn documents(&self) -> &[SparseVector] {
        &self.documents
    }

    /// Index and cosine score of the most similar fitted document.
    ///
    /// Ties go to the earliest document. `None` for a zero query vector.
    pub fn most_similar(&self, text: &str) -> Option<(usize, f64)> {
        let query = self.transform(text);
        if query.is_zero() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, doc) in self.documents.iter().enumerate() {
            let score = query.dot(doc);
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, score)| (idx, score.clamp(0.0, 1.0)))
    }

    fn weigh(&self, counts: &HashMap<String, usize>) -> SparseVector {
        let mut entries: Vec<(u32, f64)> = counts
            .iter()
            .filter_map(|(gram, &tf)| {
                self.vocabulary
                    .get(gram)
                    .map(|&dim| (dim, tf as f64 * self.idf[dim as usize]))
            })
            .collect();

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return SparseVector::default();
        }
        for (_, w) in &mut entries {
            *w /= norm;
        }
        entries.sort_by_key(|(dim, _)| *dim);
        SparseVector { entries }
    }
}

/// Word-bounded character n-gram counts of lowercased text.
fn count_ngrams(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text.to_lowercase().split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();

        for n in MIN_N..=MAX_N {
            if padded.len() <= n {
                *counts.entry(padded.iter().collect()).or_insert(0) += 1;
                break;
            }
            for window in padded.windows(n) {
                *counts.entry(window.iter().collect()).or_insert(0) += 1;
            }
        }
    }
    counts
}
