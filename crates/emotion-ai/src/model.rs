//! The loaded model bundle: vectorizer + classifier + label encoder.
//!
//! A model directory holds three JSON artifacts:
//! `vectorizer.json`, `emotion_model.json` and `label_encoder.json`.

use std::fs;
use std::path::Path;

use emotion_core::{Prediction, normalize_text};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{Classifier, LabelEncoder, ModelError, TfidfVectorizer};

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const MODEL_FILE: &str = "emotion_model.json";
pub const LABELS_FILE: &str = "label_encoder.json";

/// Everything needed to turn text into an emotion prediction.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EmotionModel {
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
    labels: LabelEncoder,
}

impl EmotionModel {
    /// Assemble a model, checking each part and that the three agree on
    /// dimensions. Inference on an assembled model cannot index out of range.
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: Classifier,
        labels: LabelEncoder,
    ) -> Result<Self, ModelError> {
        vectorizer.validate()?;
        classifier.validate()?;
        if vectorizer.vocabulary_size() != classifier.n_features() {
            return Err(ModelError::FeatureMismatch {
                vocabulary: vectorizer.vocabulary_size(),
                features: classifier.n_features(),
            });
        }
        if labels.len() != classifier.n_classes() {
            return Err(ModelError::ClassMismatch {
                labels: labels.len(),
                classes: classifier.n_classes(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
            labels,
        })
    }

    /// Load the three artifacts from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let vectorizer: TfidfVectorizer = read_json(&model_dir.join(VECTORIZER_FILE))?;
        let classifier: Classifier = read_json(&model_dir.join(MODEL_FILE))?;
        let labels: LabelEncoder = read_json(&model_dir.join(LABELS_FILE))?;

        let model = Self::new(vectorizer, classifier, labels)?;
        info!(
            vocabulary = model.vectorizer.vocabulary_size(),
            classes = model.labels.len(),
            classifier = model.classifier.kind(),
            dir = %model_dir.display(),
            "loaded emotion model"
        );
        Ok(model)
    }

    /// Write the three artifacts into `model_dir`, creating it if needed.
    pub fn save(&self, model_dir: &Path) -> Result<(), ModelError> {
        fs::create_dir_all(model_dir).map_err(|source| ModelError::Io {
            path: model_dir.to_path_buf(),
            source,
        })?;
        write_json(&model_dir.join(VECTORIZER_FILE), &self.vectorizer)?;
        write_json(&model_dir.join(MODEL_FILE), &self.classifier)?;
        write_json(&model_dir.join(LABELS_FILE), &self.labels)?;
        info!(dir = %model_dir.display(), "saved emotion model");
        Ok(())
    }

    /// Normalize → vectorize → classify → decode.
    pub fn predict(&self, text: &str) -> Result<Prediction, ModelError> {
        let features = self.vectorizer.transform(&normalize_text(text));
        let (class, confidence) = self.classifier.classify(&features);
        let emotion = self.labels.decode(class)?;
        Ok(Prediction {
            emotion: emotion.to_string(),
            confidence,
        })
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let bytes = serde_json::to_vec(value).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}
