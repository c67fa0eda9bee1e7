//! Recognition data model
//!
//! Result types produced by the orchestrator plus the model metadata types
//! consumed at initialization.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;
use whisker_common::BreedProfile;

/// Which tier of the cascade produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionTier {
    /// Genuine on-device model inference through the bridge
    Native,
    /// Deterministic image-feature fallback
    Heuristic,
}

impl RecognitionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionTier::Native => "native",
            RecognitionTier::Heuristic => "heuristic",
        }
    }
}

/// Model lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    NotInitialized,
    Initialized,
}

impl Default for ModelStatus {
    fn default() -> Self {
        ModelStatus::NotInitialized
    }
}

/// Model state owned by the orchestrator
///
/// Created at orchestrator construction, mutated only by initialization and
/// dispose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    pub status: ModelStatus,
    /// Square input dimension expected by the model
    pub input_size: u32,
    /// Number of output classes
    pub output_classes: usize,
    /// Minimum confidence for a native prediction to be considered
    pub confidence_threshold: f64,
    /// Breeds the catalog can actually resolve
    pub supported_breeds: usize,
}

/// One ranked alternative within a recognition result
///
/// `breed_id`/`breed_name` reference a catalog profile rather than owning it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionScore {
    pub breed_id: String,
    pub breed_name: String,
    /// Clamped to [0.0, 1.0]
    pub confidence: f64,
    /// 1-based; rank 1 is always the highest confidence
    pub rank: usize,
}

impl PredictionScore {
    pub fn new(breed: &BreedProfile, confidence: f64, rank: usize) -> Self {
        Self {
            breed_id: breed.id.clone(),
            breed_name: breed.name.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            rank,
        }
    }
}

/// Final output of one recognition call
///
/// Constructed only by the orchestrator; owned by the caller after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub id: Uuid,
    /// Source image reference
    pub image_path: String,
    /// Top breed (a catalog reference, not an owned profile)
    pub breed_id: String,
    pub breed_name: String,
    /// Clamped to [0.0, 1.0]
    pub confidence: f64,
    /// Ranked alternatives, rank 2 upward; never repeats the top breed
    pub alternatives: Vec<PredictionScore>,
    /// Which tier produced this result
    pub tier: RecognitionTier,
    pub timestamp: DateTime<Utc>,
    pub processing_ms: u64,
    pub model_version: String,
    /// Free-form annotations; always carries at least the `tier` key
    pub metadata: HashMap<String, String>,
}

impl RecognitionResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        image_path: &str,
        top: &BreedProfile,
        confidence: f64,
        alternatives: Vec<PredictionScore>,
        tier: RecognitionTier,
        processing_ms: u64,
        model_version: String,
    ) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("tier".to_string(), tier.as_str().to_string());
        Self {
            id,
            image_path: image_path.to_string(),
            breed_id: top.id.clone(),
            breed_name: top.name.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            alternatives,
            tier,
            timestamp: Utc::now(),
            processing_ms,
            model_version,
            metadata,
        }
    }
}

/// Model metadata bundled alongside the converted model
/// (`models/model_info.json`)
///
/// Defaults mirror the shipped bundle so a missing or malformed file still
/// yields a usable descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDescriptor {
    pub model_name: String,
    pub version: String,
    pub architecture: String,
    pub input_size: u32,
    pub num_classes: usize,
    pub breeds: Vec<String>,
    pub created_date: Option<String>,
    pub description: Option<String>,
    pub preprocessing: Preprocessing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preprocessing {
    pub normalization: String,
    pub resize: Vec<u32>,
    pub channels: u8,
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            normalization: "0-1 scale".to_string(),
            resize: vec![384, 384],
            channels: 3,
        }
    }
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self {
            model_name: "all_breeds_high_accuracy_v1".to_string(),
            version: "1.0".to_string(),
            architecture: "EfficientNetV2-B3".to_string(),
            input_size: 384,
            num_classes: 40,
            breeds: Vec::new(),
            created_date: None,
            description: None,
            preprocessing: Preprocessing::default(),
        }
    }
}

impl ModelDescriptor {
    /// Version string stamped on recognition results
    pub fn version_tag(&self) -> String {
        format!("{}-v{}", self.model_name, self.version)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model descriptor {}", path.display()))?;
        let descriptor: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid model descriptor {}", path.display()))?;
        Ok(descriptor)
    }

    /// Load the descriptor, falling back to the built-in defaults when the
    /// file is missing or malformed (initialization must not fail outright)
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!("using built-in model descriptor: {:#}", e);
                Self::default()
            }
        }
    }
}
