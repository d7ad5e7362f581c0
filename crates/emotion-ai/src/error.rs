use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("vectorizer produces {vocabulary} features but classifier expects {features}")]
    FeatureMismatch { vocabulary: usize, features: usize },

    #[error("label encoder has {labels} classes but classifier has {classes}")]
    ClassMismatch { labels: usize, classes: usize },

    #[error("class index {0} has no label")]
    UnknownClass(usize),

    #[error("empty vocabulary: no document contains a usable term")]
    EmptyVocabulary,

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("invalid n-gram range ({min_n}, {max_n})")]
    InvalidNgramRange { min_n: usize, max_n: usize },

    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("smoothing alpha must be positive, got {0}")]
    InvalidAlpha(f64),

    #[error("label {0:?} is not in the label encoder")]
    UnknownLabel(String),

    #[error("term {term:?} maps to column {index} but the vectorizer has {columns}")]
    TermOutOfRange {
        term: String,
        index: usize,
        columns: usize,
    },

    #[error("classifier row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("classifier has {priors} class priors but {rows} class rows")]
    PriorMismatch { priors: usize, rows: usize },

    #[error("reading {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} line {line}: {column} score {value:?} is not a number")]
    InvalidScore {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}
