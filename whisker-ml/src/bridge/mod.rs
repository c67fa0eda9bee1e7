//! Native model bridge
//!
//! Seam between the orchestrator and whatever platform runtime actually
//! executes the converted model. Implementations wrap a real inference
//! runtime; [`NullModelBridge`] stands in on platforms without one.
//!
//! Bridge calls are synchronous. The orchestrator runs them on the blocking
//! pool and applies its own timeouts, so implementations are free to block.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use whisker_common::AssetLayout;

use crate::models::ModelDescriptor;

/// Everything a bridge needs to load the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub num_classes: usize,
    pub input_size: u32,
}

impl ModelSpec {
    /// Spec for the standard asset bundle layout
    pub fn for_bundle(layout: &AssetLayout, descriptor: &ModelDescriptor) -> Self {
        Self {
            model_path: layout.model_path(),
            labels_path: layout.labels_path(),
            num_classes: descriptor.num_classes,
            input_size: descriptor.input_size,
        }
    }
}

/// Successful bridge initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeInit {
    pub num_labels: usize,
    pub input_size: u32,
    /// Runtime-reported version, when the runtime knows one
    pub model_version: Option<String>,
}

/// Wire shape of a bridge initialization reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeInitResponse {
    Ready {
        num_labels: usize,
        #[serde(default)]
        model_version: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl BridgeInitResponse {
    /// Decode into [`BridgeInit`]
    ///
    /// The reply carries no input size; the orchestrator keeps the descriptor
    /// value when a bridge reports zero.
    pub fn into_result(self) -> anyhow::Result<BridgeInit> {
        match self {
            BridgeInitResponse::Ready {
                num_labels,
                model_version,
            } => Ok(BridgeInit {
                num_labels,
                input_size: 0,
                model_version,
            }),
            BridgeInitResponse::Failed { message } => Err(anyhow::anyhow!(message)),
        }
    }
}

/// One raw model output
///
/// `label` is a line from the label file and is not validated here; the
/// orchestrator drops labels the catalog cannot resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgePrediction {
    pub label: String,
    pub confidence: f64,
}

/// Pixel dimensions forwarded alongside the encoded bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Wire shape of a bridge inference reply
///
/// Decoded once at the boundary; the loosely-typed payload never leaks past
/// this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeResponse {
    Success {
        predictions: Vec<BridgePrediction>,
        /// Remote-side inference time, serialized as `processing_time`
        #[serde(default, rename = "processing_time")]
        processing_time_ms: Option<u64>,
        #[serde(default)]
        image_size: Option<ImageDimensions>,
    },
    Failure {
        message: String,
    },
}

impl BridgeResponse {
    pub fn into_result(self) -> anyhow::Result<Vec<BridgePrediction>> {
        match self {
            BridgeResponse::Success { predictions, .. } => Ok(predictions),
            BridgeResponse::Failure { message } => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Native inference runtime seam
pub trait ModelBridge: Send + Sync {
    /// Load the model described by `spec`
    fn initialize(&self, spec: &ModelSpec) -> anyhow::Result<BridgeInit>;

    /// Run inference over the original encoded image bytes
    fn infer(
        &self,
        image: &[u8],
        dimensions: ImageDimensions,
    ) -> anyhow::Result<Vec<BridgePrediction>>;
}

/// Bridge for platforms without a native model runtime
///
/// Always fails to initialize, which drops the orchestrator into
/// fallback-only mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullModelBridge;

impl NullModelBridge {
    pub fn new() -> Self {
        Self
    }
}

impl ModelBridge for NullModelBridge {
    fn initialize(&self, spec: &ModelSpec) -> anyhow::Result<BridgeInit> {
        anyhow::bail!(
            "no native model runtime available for {}",
            spec.model_path.display()
        )
    }

    fn infer(
        &self,
        _image: &[u8],
        _dimensions: ImageDimensions,
    ) -> anyhow::Result<Vec<BridgePrediction>> {
        anyhow::bail!("no native model runtime available")
    }
}
