//! TF-IDF vectorizer over word n-grams.
//!
//! Input is text that has already been through
//! [`normalize_text`](emotion_core::normalize_text). Terms are word n-grams
//! joined by a single space. Weights are raw counts times a smoothed idf,
//! then L2-normalised, so every output vector has unit length (or is zero
//! when no term is known).

use std::collections::{BTreeMap, HashMap, HashSet};

use emotion_core::tokens;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Fitting parameters for [`TfidfVectorizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorizerParams {
    pub min_n: usize,
    pub max_n: usize,
    /// Keep only the most frequent terms across the corpus.
    pub max_features: Option<usize>,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 2,
            max_features: Some(5000),
        }
    }
}

/// A fitted TF-IDF vectorizer with a fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    min_n: usize,
    max_n: usize,
    /// term → column index. Indices follow alphabetical term order.
    vocabulary: BTreeMap<String, usize>,
    /// Inverse document frequency per column.
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from normalised documents.
    pub fn fit(documents: &[String], params: VectorizerParams) -> Result<Self, ModelError> {
        check_ngram_range(params.min_n, params.max_n)?;

        // term → (corpus count, document frequency)
        let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
        for doc in documents {
            let terms = ngrams(doc, params.min_n, params.max_n);
            let unique: HashSet<&str> = terms.iter().map(|t| t.as_str()).collect();
            for term in &terms {
                stats.entry(term.clone()).or_insert((0, 0)).0 += 1;
            }
            for term in unique {
                if let Some(entry) = stats.get_mut(term) {
                    entry.1 += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize, usize)> = stats
            .into_iter()
            .map(|(term, (count, df))| (term, count, df))
            .collect();

        // Most frequent first, ties alphabetical.
        if let Some(limit) = params.max_features
            && ranked.len() > limit
        {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(limit);
        }
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (idx, (term, _, df)) in ranked.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        Ok(Self {
            min_n: params.min_n,
            max_n: params.max_n,
            vocabulary,
            idf,
        })
    }

    /// Map normalised text to a dense, L2-normalised feature vector.
    ///
    /// Out-of-vocabulary terms are ignored.
    pub fn transform(&self, normalized: &str) -> Vec<f64> {
        let mut features = vec![0.0f64; self.idf.len()];
        for term in ngrams(normalized, self.min_n, self.max_n) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                features[idx] += 1.0;
            }
        }

        for (value, idf) in features.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        normalize(&mut features);
        features
    }

    /// Check a deserialised vectorizer before use: the n-gram range is sane
    /// and every vocabulary entry points at an idf column.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_ngram_range(self.min_n, self.max_n)?;
        let columns = self.idf.len();
        if let Some((term, &index)) = self.vocabulary.iter().find(|(_, i)| **i >= columns) {
            return Err(ModelError::TermOutOfRange {
                term: term.clone(),
                index,
                columns,
            });
        }
        Ok(())
    }

    /// Number of columns in every feature vector.
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Column index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }
}

fn check_ngram_range(min_n: usize, max_n: usize) -> Result<(), ModelError> {
    if min_n == 0 || min_n > max_n {
        return Err(ModelError::InvalidNgramRange { min_n, max_n });
    }
    Ok(())
}

/// All word n-grams of `text` for n in `min_n..=max_n`, in order.
fn ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let words: Vec<&str> = tokens(text).collect();
    let mut out = Vec::new();
    for n in min_n..=max_n {
        if n > words.len() {
            break;
        }
        for window in words.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
