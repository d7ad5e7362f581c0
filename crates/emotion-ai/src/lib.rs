//! Inference layer: text → TF-IDF features → classifier → emotion label.

mod classifier;
mod error;
mod labels;
mod model;
mod naive_bayes;
pub mod training;
mod vectorizer;

pub use classifier::{Classifier, NearestCentroid};
pub use error::ModelError;
pub use labels::LabelEncoder;
pub use model::{EmotionModel, LABELS_FILE, MODEL_FILE, VECTORIZER_FILE};
pub use naive_bayes::MultinomialNb;
pub use vectorizer::{TfidfVectorizer, VectorizerParams};
