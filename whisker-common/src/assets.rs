//! Bundled asset layout
//!
//! All recognition assets live under one root:
//! - `models/model.tflite`: the converted inference model
//! - `models/labels.txt`: one breed label per line, blank lines ignored
//! - `models/model_info.json`: model descriptor written at conversion time
//! - `data/breeds.json`: full breed dataset records

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolved locations of the bundled recognition assets
#[derive(Debug, Clone)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join("models").join("model.tflite")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join("models").join("labels.txt")
    }

    pub fn model_info_path(&self) -> PathBuf {
        self.root.join("models").join("model_info.json")
    }

    pub fn breed_data_path(&self) -> PathBuf {
        self.root.join("data").join("breeds.json")
    }

    /// Read and parse the label file
    pub fn load_labels(&self) -> Result<Vec<String>> {
        let path = self.labels_path();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "label file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        let labels = parse_labels(&content);
        if labels.is_empty() {
            return Err(Error::Parse(format!(
                "label file contains no labels: {}",
                path.display()
            )));
        }
        Ok(labels)
    }
}

/// Parse newline-delimited labels: one per line, trimmed, blank lines ignored.
/// Line order defines the model's output index order.
pub fn parse_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
