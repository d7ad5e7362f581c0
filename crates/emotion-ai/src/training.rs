//! Fitting a model bundle from labelled text.
//!
//! Samples are cleaned with the same normaliser used at inference, then the
//! vectorizer, label encoder and classifier are fitted in turn. No resampling
//! or class balancing is applied.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use emotion_core::normalize_text;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Classifier, EmotionModel, LabelEncoder, ModelError, MultinomialNb, NearestCentroid,
    TfidfVectorizer, VectorizerParams,
};

/// One labelled training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub text: String,
    pub emotion: String,
}

/// Which classifier variant to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    #[default]
    NaiveBayes,
    NearestCentroid,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub vectorizer: VectorizerParams,
    /// Smoothing for Naive Bayes.
    pub alpha: f64,
    pub classifier: ClassifierKind,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerParams::default(),
            alpha: 0.5,
            classifier: ClassifierKind::NaiveBayes,
        }
    }
}

/// What a training run saw and how well the model fits its own data.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub samples: usize,
    pub skipped: usize,
    /// Samples per emotion, in class-index order.
    pub class_counts: Vec<(String, usize)>,
    pub vocabulary_size: usize,
    /// Fraction of training samples the fitted model labels correctly.
    pub train_accuracy: f64,
}

pub struct TrainedModel {
    pub model: EmotionModel,
    pub report: TrainingReport,
}

/// Column holding the text in a CSV dataset.
pub const TEXT_COLUMN: &str = "text";

/// Emotion score columns in a CSV dataset start here; the leading columns
/// are an id, the text and an annotation-quality flag.
pub const FIRST_EMOTION_COLUMN: usize = 3;

/// Read labelled samples from `path`.
///
/// Files ending in `.csv` are read as one-column-per-emotion score tables
/// (see [`load_csv_samples`]); anything else as JSON lines.
pub fn load_samples(path: &Path) -> Result<Vec<TrainingSample>, ModelError> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => load_csv_samples(path),
        _ => load_jsonl_samples(path),
    }
}

/// Read a JSON-lines file of `{"text": ..., "emotion": ...}`.
///
/// Blank lines are skipped.
pub fn load_jsonl_samples(path: &Path) -> Result<Vec<TrainingSample>, ModelError> {
    let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut samples = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let sample = serde_json::from_str(line).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Read a CSV with a header row, a [`TEXT_COLUMN`], and numeric emotion
/// scores from [`FIRST_EMOTION_COLUMN`] onward.
///
/// Each row is labelled with its highest-scoring emotion, the leftmost on
/// ties. Rows whose scores sum to zero carry no label and are dropped. Empty
/// score cells count as zero.
pub fn load_csv_samples(path: &Path) -> Result<Vec<TrainingSample>, ModelError> {
    let csv_err = |source: csv::Error| ModelError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let missing = |column: &str| ModelError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let text_idx = headers
        .iter()
        .position(|h| h == TEXT_COLUMN)
        .ok_or_else(|| missing(TEXT_COLUMN))?;
    let emotions: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .skip(FIRST_EMOTION_COLUMN)
        .filter(|(idx, _)| *idx != text_idx)
        .collect();
    if emotions.is_empty() {
        return Err(missing("emotion score"));
    }

    let mut samples = Vec::new();
    let mut unlabelled = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());

        let mut best: Option<(f64, &str)> = None;
        let mut total = 0.0;
        for &(idx, emotion) in &emotions {
            let raw = record.get(idx).unwrap_or_default();
            let score = if raw.is_empty() {
                0.0
            } else {
                raw.parse::<f64>().map_err(|_| ModelError::InvalidScore {
                    path: path.to_path_buf(),
                    line,
                    column: emotion.to_string(),
                    value: raw.to_string(),
                })?
            };
            total += score;
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, emotion));
            }
        }

        match best {
            Some((_, emotion)) if total > 0.0 => samples.push(TrainingSample {
                text: record.get(text_idx).unwrap_or_default().to_string(),
                emotion: emotion.to_string(),
            }),
            _ => unlabelled += 1,
        }
    }

    if unlabelled > 0 {
        debug!(unlabelled, "dropped rows with no emotion marked");
    }
    info!(
        samples = samples.len(),
        emotions = emotions.len(),
        "read CSV dataset"
    );
    Ok(samples)
}

/// Fit a complete [`EmotionModel`] from labelled samples.
///
/// Samples with a blank emotion are skipped.
pub fn train(
    samples: &[TrainingSample],
    params: &TrainingParams,
) -> Result<TrainedModel, ModelError> {
    let usable: Vec<&TrainingSample> = samples
        .iter()
        .filter(|s| !s.emotion.trim().is_empty())
        .collect();
    let skipped = samples.len() - usable.len();
    if skipped > 0 {
        warn!(skipped, "skipping samples without an emotion label");
    }
    if usable.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }

    let documents: Vec<String> = usable.iter().map(|s| normalize_text(&s.text)).collect();

    let labels = LabelEncoder::fit(usable.iter().map(|s| s.emotion.as_str()));
    let y: Vec<usize> = usable
        .iter()
        .map(|s| {
            labels
                .encode(&s.emotion)
                .ok_or_else(|| ModelError::UnknownLabel(s.emotion.clone()))
        })
        .collect::<Result<_, _>>()?;

    let vectorizer = TfidfVectorizer::fit(&documents, params.vectorizer)?;
    let x: Vec<Vec<f64>> = documents.iter().map(|d| vectorizer.transform(d)).collect();

    let classifier = match params.classifier {
        ClassifierKind::NaiveBayes => {
            Classifier::MultinomialNb(MultinomialNb::fit(&x, &y, labels.len(), params.alpha)?)
        }
        ClassifierKind::NearestCentroid => {
            Classifier::NearestCentroid(NearestCentroid::fit(&x, &y, labels.len()))
        }
    };

    let correct = x
        .iter()
        .zip(&y)
        .filter(|(row, class)| classifier.predict(row) == **class)
        .count();
    let train_accuracy = correct as f64 / x.len() as f64;

    let mut counts = vec![0usize; labels.len()];
    for &class in &y {
        counts[class] += 1;
    }
    let class_counts = labels.classes().iter().cloned().zip(counts).collect();

    let report = TrainingReport {
        samples: usable.len(),
        skipped,
        class_counts,
        vocabulary_size: vectorizer.vocabulary_size(),
        train_accuracy,
    };
    info!(
        samples = report.samples,
        classes = labels.len(),
        vocabulary = report.vocabulary_size,
        accuracy = report.train_accuracy,
        "trained emotion model"
    );

    let model = EmotionModel::new(vectorizer, classifier, labels)?;
    Ok(TrainedModel { model, report })
}
