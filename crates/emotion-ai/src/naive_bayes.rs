//! Multinomial Naive Bayes over TF-IDF features.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Multinomial Naive Bayes with additive (Lidstone) smoothing.
///
/// Stores log-space parameters only; prediction is a dot product per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    /// log P(class)
    class_log_prior: Vec<f64>,
    /// log P(feature | class), one row per class.
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    /// Fit on feature rows `x` with class indices `y` in `0..n_classes`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        alpha: f64,
    ) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::LengthMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if alpha.is_nan() || alpha <= 0.0 {
            return Err(ModelError::InvalidAlpha(alpha));
        }

        let n_features = x[0].len();
        let mut feature_count = vec![vec![0.0f64; n_features]; n_classes];
        let mut class_count = vec![0usize; n_classes];

        for (row, &class) in x.iter().zip(y) {
            if row.len() != n_features {
                return Err(ModelError::FeatureMismatch {
                    vocabulary: row.len(),
                    features: n_features,
                });
            }
            let counts = feature_count
                .get_mut(class)
                .ok_or(ModelError::UnknownClass(class))?;
            for (acc, &v) in counts.iter_mut().zip(row) {
                *acc += v;
            }
            class_count[class] += 1;
        }

        let total = x.len() as f64;
        let class_log_prior = class_count
            .iter()
            .map(|&c| (c as f64 / total).ln())
            .collect();

        let feature_log_prob = feature_count
            .into_iter()
            .map(|counts| {
                let denom = (counts.iter().sum::<f64>() + alpha * n_features as f64).ln();
                counts.into_iter().map(|c| (c + alpha).ln() - denom).collect()
            })
            .collect();

        Ok(Self {
            alpha,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Check a deserialised model: one prior per class row, all rows equally wide.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.class_log_prior.len() != self.feature_log_prob.len() {
            return Err(ModelError::PriorMismatch {
                priors: self.class_log_prior.len(),
                rows: self.feature_log_prob.len(),
            });
        }
        check_rows(&self.feature_log_prob)
    }

    pub fn n_classes(&self) -> usize {
        self.class_log_prior.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Most likely class index.
    pub fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.joint_log_likelihood(x))
    }

    /// Posterior probability per class. Sums to 1.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let jll = self.joint_log_likelihood(x);
        let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = jll.iter().map(|s| (s - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    }

    fn joint_log_likelihood(&self, x: &[f64]) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior + log_probs.iter().zip(x).map(|(lp, v)| lp * v).sum::<f64>()
            })
            .collect()
    }
}

/// Every row as wide as the first.
pub(crate) fn check_rows(rows: &[Vec<f64>]) -> Result<(), ModelError> {
    let expected = rows.first().map_or(0, Vec::len);
    match rows.iter().position(|r| r.len() != expected) {
        Some(row) => Err(ModelError::RaggedRow {
            row,
            expected,
            found: rows[row].len(),
        }),
        None => Ok(()),
    }
}

/// Index of the largest value; first wins on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
