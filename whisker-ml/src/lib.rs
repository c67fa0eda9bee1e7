//! whisker-ml library interface
//!
//! Tiered cat breed recognition: on-device model inference through a narrow
//! bridge contract, with a deterministic image-feature fallback when the
//! native model is unavailable or fails.

pub mod bridge;
pub mod error;
pub mod features; // deterministic pixel-statistics extraction
pub mod heuristic; // fallback classifier over extracted features
pub mod loader;
pub mod models;
pub mod orchestrator;

pub use crate::bridge::{
    BridgeInit, BridgeInitResponse, BridgePrediction, BridgeResponse, ImageDimensions,
    ModelBridge, ModelSpec, NullModelBridge,
};
pub use crate::error::{PipelineResult, RecognitionError};
pub use crate::models::{
    ModelDescriptor, ModelInfo, ModelStatus, PredictionScore, RecognitionResult, RecognitionTier,
};
pub use crate::orchestrator::{
    OrchestratorConfig, OrchestratorState, ReadyMode, RecognitionOrchestrator,
    RecognitionStatistics, StatsSnapshot,
};
