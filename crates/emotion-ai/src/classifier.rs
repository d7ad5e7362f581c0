//! Classifier variants.
//!
//! A classifier either produces a probability distribution over classes
//! ([`MultinomialNb`]) or only a class index ([`NearestCentroid`]). The
//! distinction is explicit in [`Classifier`] so callers never have to check
//! for a capability at runtime.

use serde::{Deserialize, Serialize};

use crate::naive_bayes::{argmax, check_rows};
use crate::{ModelError, MultinomialNb};

/// Confidence reported when a classifier has no probability output.
pub const FALLBACK_CONFIDENCE: f64 = 1.0;

/// A trained classifier over fixed-length feature vectors.
///
/// Serialised with a `kind` tag so the artifact records which variant it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// Probabilistic: exposes a full posterior.
    MultinomialNb(MultinomialNb),
    /// Deterministic: class index only.
    NearestCentroid(NearestCentroid),
}

impl Classifier {
    /// Predicted class index.
    pub fn predict(&self, features: &[f64]) -> usize {
        match self {
            Self::MultinomialNb(nb) => nb.predict(features),
            Self::NearestCentroid(nc) => nc.predict(features),
        }
    }

    /// Class probabilities, when the variant provides them.
    pub fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        match self {
            Self::MultinomialNb(nb) => Some(nb.predict_proba(features)),
            Self::NearestCentroid(_) => None,
        }
    }

    /// Class index plus confidence: the highest class probability, or
    /// [`FALLBACK_CONFIDENCE`] when probabilities are unavailable.
    pub fn classify(&self, features: &[f64]) -> (usize, f64) {
        let class = self.predict(features);
        let confidence = match self.predict_proba(features) {
            Some(probs) => probs
                .into_iter()
                .fold(0.0f64, f64::max)
                .clamp(0.0, 1.0),
            None => FALLBACK_CONFIDENCE,
        };
        (class, confidence)
    }

    /// Check the parameters of a deserialised classifier.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::MultinomialNb(nb) => nb.validate(),
            Self::NearestCentroid(nc) => check_rows(&nc.centroids),
        }
    }

    pub fn has_probabilities(&self) -> bool {
        matches!(self, Self::MultinomialNb(_))
    }

    pub fn n_classes(&self) -> usize {
        match self {
            Self::MultinomialNb(nb) => nb.n_classes(),
            Self::NearestCentroid(nc) => nc.n_classes(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::MultinomialNb(nb) => nb.n_features(),
            Self::NearestCentroid(nc) => nc.n_features(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MultinomialNb(_) => "multinomial_nb",
            Self::NearestCentroid(_) => "nearest_centroid",
        }
    }
}

/// Centroid-based classifier.
///
/// Holds one L2-normalised mean vector per class. Classifies by cosine
/// similarity to the nearest centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    /// Compute per-class centroids from feature rows and class indices.
    ///
    /// Classes with no rows get a zero centroid and are never predicted over
    /// a class that has one.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize) -> Self {
        let dim = x.first().map(|v| v.len()).unwrap_or(0);

        // Accumulate: class → (sum_vector, count).
        let mut accum: Vec<(Vec<f64>, usize)> = vec![(vec![0.0f64; dim], 0); n_classes];
        for (row, &class) in x.iter().zip(y) {
            if let Some(entry) = accum.get_mut(class) {
                for (acc, &val) in entry.0.iter_mut().zip(row) {
                    *acc += val;
                }
                entry.1 += 1;
            }
        }

        let centroids = accum
            .into_iter()
            .map(|(mut sum, count)| {
                if count > 0 {
                    for v in &mut sum {
                        *v /= count as f64;
                    }
                    normalize(&mut sum);
                }
                sum
            })
            .collect();

        Self { centroids }
    }

    /// Index of the centroid with highest cosine similarity.
    pub fn predict(&self, features: &[f64]) -> usize {
        let sims: Vec<f64> = self
            .centroids
            .iter()
            .map(|c| cosine_sim(features, c))
            .collect();
        argmax(&sims)
    }

    pub fn n_classes(&self) -> usize {
        self.centroids.len()
    }

    pub fn n_features(&self) -> usize {
        self.centroids.first().map(|c| c.len()).unwrap_or(0)
    }
}

/// Dot product; both sides are unit vectors (or zero).
fn cosine_sim(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
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
