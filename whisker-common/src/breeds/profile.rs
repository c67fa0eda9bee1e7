//! Breed profile dataset record

use serde::{Deserialize, Serialize};

/// One breed record from the bundled dataset (`data/breeds.json`)
///
/// All descriptive fields default so sparse records load; `ml_index` links the
/// record to the model's output order (the line number in `labels.txt`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreedProfile {
    /// Stable identifier (the dataset key, e.g. `british_shorthair`)
    pub id: String,
    /// Display name (e.g. `British Shorthair`)
    pub name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub temperament: String,
    #[serde(default)]
    pub life_span: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub is_hypoallergenic: bool,
    #[serde(default)]
    pub is_rare: bool,
    /// 1 (low) to 5 (high)
    #[serde(default)]
    pub energy_level: u8,
    /// 1 (low) to 5 (high)
    #[serde(default)]
    pub social_needs: u8,
    /// 1 (low) to 5 (high)
    #[serde(default)]
    pub grooming_needs: u8,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Position in the model's output vector, when this breed is covered
    #[serde(default)]
    pub ml_index: Option<usize>,
    /// Whether the recognition pipeline may surface this breed
    #[serde(default = "default_available")]
    pub available_for_recognition: bool,
}

fn default_available() -> bool {
    true
}

impl BreedProfile {
    /// Minimal profile derived from a model label, used when the breed dataset
    /// has no matching record
    pub fn from_label(label: &str, ml_index: usize) -> Self {
        Self {
            id: slugify(label),
            name: prettify(label),
            origin: String::new(),
            description: String::new(),
            temperament: String::new(),
            life_span: String::new(),
            weight: String::new(),
            colors: Vec::new(),
            is_hypoallergenic: false,
            is_rare: false,
            energy_level: 0,
            social_needs: 0,
            grooming_needs: 0,
            image_url: None,
            ml_index: Some(ml_index),
            available_for_recognition: true,
        }
    }
}

/// Lowercased, underscore-joined form used as a stable id
fn slugify(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Display form: underscores become spaces, each word capitalized
fn prettify(label: &str) -> String {
    label
        .trim()
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
