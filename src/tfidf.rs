//! TF-IDF document vectors for clustering.
//!
//! Tokens are lower-cased runs of two or more word characters with English
//! stop words removed. The vocabulary keeps the `max_features` terms with
//! the highest corpus frequency (ties broken alphabetically) and columns are
//! ordered alphabetically. Weights use smoothed IDF,
//! `ln((1 + n) / (1 + df)) + 1`, applied to raw term counts, and every row
//! is L2-normalised.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::LazyLock,
};

use ndarray::Array2;
use regex::Regex;
use stop_words::{LANGUAGE, get};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\w\w+\b").expect("token pattern is valid")
});

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 1000;

/// A fitted document-term matrix.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Column labels, in column order.
    pub vocabulary: Vec<String>,
    /// One row per input document.
    pub matrix: Array2<f64>,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    stop_words: HashSet<String>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    /// Vectorizer with the standard English stop word list.
    pub fn new(max_features: usize) -> Self {
        Self::with_stop_words(max_features, get(LANGUAGE::English))
    }

    pub fn with_stop_words<I, S>(max_features: usize, stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_features,
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    /// Learn the vocabulary from `texts` and return their TF-IDF rows.
    ///
    /// A corpus with no usable terms yields a matrix with zero columns.
    pub fn fit_transform<S: AsRef<str>>(&self, texts: &[S]) -> TfidfMatrix {
        let docs: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|text| {
                let mut counts = HashMap::new();
                for token in self.tokenize(text.as_ref()) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut corpus_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for counts in &docs {
            for (term, count) in counts {
                *corpus_counts.entry(term.as_str()).or_insert(0) += count;
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let columns: BTreeMap<&str, usize> = {
            let mut terms: Vec<&str> = ranked.iter().map(|(t, _)| *t).collect();
            terms.sort_unstable();
            terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect()
        };

        let n_docs = docs.len() as f64;
        let mut matrix = Array2::zeros((docs.len(), columns.len()));
        for (row, counts) in docs.iter().enumerate() {
            for (term, count) in counts {
                let Some(&col) = columns.get(term.as_str()) else {
                    continue;
                };
                let df = doc_freq[term.as_str()] as f64;
                let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
                matrix[[row, col]] = *count as f64 * idf;
            }

            let mut row_view = matrix.row_mut(row);
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 0.0 {
                row_view /= norm;
            }
        }

        TfidfMatrix {
            vocabulary: columns.keys().map(|t| t.to_string()).collect(),
            matrix,
        }
    }
}
