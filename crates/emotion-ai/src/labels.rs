//! Emotion label encoding.
//!
//! Class indices are positions in the sorted list of distinct emotion names,
//! so the same training labels always produce the same encoding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Bidirectional mapping between emotion names and class indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build an encoder from raw labels. Duplicates collapse; order is sorted.
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Class index for a label.
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    /// Label for a class index.
    pub fn decode(&self, index: usize) -> Result<&str, ModelError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(index))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Whether `label` is one of the known classes.
    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_some()
    }
}
