//! Recognition orchestrator
//!
//! Coordinates the tiered recognition cascade over one shared instance.
//!
//! # State Progression
//! Uninitialized → Initializing → Ready(NativeAvailable | FallbackOnly)
//!
//! Initialization never fails outright: any bridge problem (unsupported
//! platform, initialization error, timeout) degrades the session to
//! fallback-only mode and the orchestrator stays usable.
//!
//! # Per-call pipeline
//! decode → native tier → heuristic tier → enhancement → counters
//!
//! Internal tier failures are absorbed locally and logged; the only
//! caller-visible failures are decode errors, catalog exhaustion, and
//! cancellation.

use crate::bridge::{BridgePrediction, ImageDimensions, ModelBridge, ModelSpec};
use crate::error::{PipelineResult, RecognitionError};
use crate::features::ImageFeatureExtractor;
use crate::heuristic::HeuristicClassifier;
use crate::loader::{DecodedImage, ImageLoader};
use crate::models::{
    ModelDescriptor, ModelInfo, ModelStatus, PredictionScore, RecognitionResult, RecognitionTier,
};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use whisker_common::config::RecognitionSettings;
use whisker_common::events::{EventBus, WhiskerEvent};
use whisker_common::{AssetLayout, BreedCatalog, BreedProfile};

mod statistics;
pub use statistics::{RecognitionStatistics, StatsSnapshot};

/// Confidence multiplier applied by the enhancement pass
const ENHANCEMENT_FACTOR: f64 = 1.15;

/// Version tag stamped on fallback-tier results
const HEURISTIC_VERSION: &str = "heuristic-fallback";

/// Orchestrator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Uninitialized,
    Initializing,
    Ready(ReadyMode),
}

/// Which tiers a ready orchestrator can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyMode {
    /// Bridge initialized; the native tier is attempted first
    NativeAvailable,
    /// Bridge unavailable for this session; heuristic tier only
    FallbackOnly,
}

/// Construction-time orchestrator parameters
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub model_spec: ModelSpec,
    pub settings: RecognitionSettings,
    /// Version tag for native-tier results when the bridge reports none
    pub model_version: String,
}

impl OrchestratorConfig {
    /// Config for the standard asset bundle layout
    pub fn from_assets(
        layout: &AssetLayout,
        descriptor: &ModelDescriptor,
        settings: RecognitionSettings,
    ) -> Self {
        Self {
            model_spec: ModelSpec::for_bundle(layout, descriptor),
            model_version: descriptor.version_tag(),
            settings,
        }
    }
}

/// Mutable state behind the orchestrator lock
struct StateInner {
    state: OrchestratorState,
    model_info: ModelInfo,
    /// Bridge-reported version, when the runtime supplied one
    native_version: Option<String>,
}

/// Tiered recognition state machine
///
/// Constructed once at startup and shared by reference; concurrent
/// `recognize` calls are independent apart from the read-only catalog and
/// the locked counters.
pub struct RecognitionOrchestrator<B: ModelBridge + 'static> {
    bridge: Arc<B>,
    catalog: Arc<BreedCatalog>,
    event_bus: EventBus,
    config: OrchestratorConfig,
    loader: ImageLoader,
    extractor: ImageFeatureExtractor,
    classifier: HeuristicClassifier,
    stats: RecognitionStatistics,
    inner: Mutex<StateInner>,
}

impl<B: ModelBridge + 'static> RecognitionOrchestrator<B> {
    pub fn new(
        bridge: Arc<B>,
        catalog: Arc<BreedCatalog>,
        event_bus: EventBus,
        config: OrchestratorConfig,
    ) -> Self {
        let model_info = ModelInfo {
            status: ModelStatus::NotInitialized,
            input_size: config.model_spec.input_size,
            output_classes: config.model_spec.num_classes,
            confidence_threshold: config.settings.confidence_threshold,
            supported_breeds: catalog.count(),
        };
        Self {
            bridge,
            catalog,
            event_bus,
            config,
            loader: ImageLoader::new(),
            extractor: ImageFeatureExtractor::new(),
            classifier: HeuristicClassifier::new(),
            stats: RecognitionStatistics::new(),
            inner: Mutex::new(StateInner {
                state: OrchestratorState::Uninitialized,
                model_info,
                native_version: None,
            }),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> OrchestratorState {
        self.inner.lock().await.state
    }

    /// Model state snapshot
    pub async fn model_info(&self) -> ModelInfo {
        self.inner.lock().await.model_info.clone()
    }

    /// Point-in-time copy of the running counters
    pub fn statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Initialize the native bridge
    ///
    /// Never fails: any bridge problem degrades the session to fallback-only
    /// mode. Calling again after reaching a Ready state is a no-op, and
    /// concurrent callers serialize on the state lock so the bridge is
    /// initialized at most once per session.
    pub async fn initialize(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, OrchestratorState::Ready(_)) {
            return;
        }
        inner.state = OrchestratorState::Initializing;

        let bridge = Arc::clone(&self.bridge);
        let spec = self.config.model_spec.clone();
        let task = tokio::task::spawn_blocking(move || bridge.initialize(&spec));
        let outcome = match tokio::time::timeout(self.config.settings.init_timeout(), task).await {
            Ok(Ok(Ok(init))) => Ok(init),
            Ok(Ok(Err(e))) => Err(RecognitionError::BridgeUnavailable(format!("{e:#}"))),
            Ok(Err(e)) => Err(RecognitionError::BridgeUnavailable(format!(
                "initialization task failed: {e}"
            ))),
            Err(_) => Err(RecognitionError::BridgeUnavailable(format!(
                "initialization timed out after {}ms",
                self.config.settings.init_timeout_ms
            ))),
        };

        inner.model_info.status = ModelStatus::Initialized;
        match outcome {
            Ok(init) => {
                inner.model_info.output_classes = init.num_labels;
                if init.input_size > 0 {
                    inner.model_info.input_size = init.input_size;
                }
                inner.native_version = init.model_version.clone();
                inner.state = OrchestratorState::Ready(ReadyMode::NativeAvailable);

                let model_version = init
                    .model_version
                    .unwrap_or_else(|| self.config.model_version.clone());
                tracing::info!(
                    num_labels = init.num_labels,
                    input_size = inner.model_info.input_size,
                    model_version = %model_version,
                    "model bridge initialized"
                );
                self.event_bus.emit_lossy(WhiskerEvent::ModelBridgeInitialized {
                    num_labels: init.num_labels,
                    input_size: inner.model_info.input_size,
                    model_version,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                inner.state = OrchestratorState::Ready(ReadyMode::FallbackOnly);
                tracing::warn!(error = %e, "model bridge unavailable, entering fallback mode");
                self.event_bus.emit_lossy(WhiskerEvent::FallbackModeEntered {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Release the native model and return to Uninitialized
    ///
    /// The next recognition call re-initializes automatically.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = OrchestratorState::Uninitialized;
        inner.model_info.status = ModelStatus::NotInitialized;
        inner.native_version = None;
        tracing::info!("recognition orchestrator disposed");
    }

    /// Recognize the breed in an image file
    ///
    /// Auto-initializes on first use. The only caller-visible failures are
    /// decode errors and catalog exhaustion; internal tier failures fall
    /// through the cascade instead.
    pub async fn recognize(&self, image_path: &Path) -> PipelineResult<RecognitionResult> {
        self.recognize_with_cancellation(image_path, &CancellationToken::new())
            .await
    }

    /// [`recognize`](Self::recognize) with a caller-owned cancellation token
    ///
    /// A token cancelled mid-call abandons the in-flight tier, drops the
    /// image buffer, and returns [`RecognitionError::Cancelled`].
    pub async fn recognize_with_cancellation(
        &self,
        image_path: &Path,
        cancel: &CancellationToken,
    ) -> PipelineResult<RecognitionResult> {
        let started = Instant::now();
        let recognition_id = Uuid::new_v4();
        self.initialize().await;

        tracing::debug!(%recognition_id, path = %image_path.display(), "recognition started");
        self.event_bus.emit_lossy(WhiskerEvent::RecognitionStarted {
            recognition_id,
            image_path: image_path.display().to_string(),
            timestamp: Utc::now(),
        });

        let outcome = self
            .run_pipeline(recognition_id, image_path, cancel, started)
            .await;
        match &outcome {
            Ok(result) => {
                let enhanced = result.metadata.contains_key("enhancement_factor");
                self.stats.record_success(
                    result.tier,
                    result.confidence,
                    result.processing_ms,
                    enhanced,
                );
                tracing::info!(
                    %recognition_id,
                    breed = %result.breed_name,
                    tier = result.tier.as_str(),
                    confidence = result.confidence,
                    processing_ms = result.processing_ms,
                    "recognition completed"
                );
                self.event_bus.emit_lossy(WhiskerEvent::RecognitionCompleted {
                    recognition_id,
                    breed_name: result.breed_name.clone(),
                    tier: result.tier.as_str().to_string(),
                    confidence: result.confidence,
                    processing_ms: result.processing_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(RecognitionError::Cancelled) => {
                self.stats.record_cancellation();
                tracing::info!(%recognition_id, "recognition cancelled");
                self.event_bus.emit_lossy(WhiskerEvent::RecognitionCancelled {
                    recognition_id,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::warn!(%recognition_id, error = %e, "recognition failed");
                self.event_bus.emit_lossy(WhiskerEvent::RecognitionFailed {
                    recognition_id,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        outcome
    }

    async fn run_pipeline(
        &self,
        recognition_id: Uuid,
        image_path: &Path,
        cancel: &CancellationToken,
        started: Instant,
    ) -> PipelineResult<RecognitionResult> {
        if cancel.is_cancelled() {
            return Err(RecognitionError::Cancelled);
        }

        // Decode on the blocking pool; cancelling mid-decode abandons the
        // task and its buffer is dropped when it finishes
        let loader = self.loader;
        let path = image_path.to_path_buf();
        let decode_task = tokio::task::spawn_blocking(move || loader.load(&path));
        let image = tokio::select! {
            _ = cancel.cancelled() => return Err(RecognitionError::Cancelled),
            joined = decode_task => match joined {
                Ok(decoded) => decoded?,
                Err(e) => {
                    return Err(RecognitionError::DecodeFailed(format!(
                        "decode task failed: {e}"
                    )))
                }
            },
        };

        let path_str = image_path.display().to_string();
        let native = match self.ready_mode().await {
            ReadyMode::NativeAvailable => {
                self.attempt_native(recognition_id, &image, &path_str, cancel, started)
                    .await?
            }
            ReadyMode::FallbackOnly => None,
        };

        let mut result = match native {
            Some(result) => result,
            None => {
                if cancel.is_cancelled() {
                    return Err(RecognitionError::Cancelled);
                }
                if !self.config.settings.surface_heuristic {
                    tracing::debug!("native tier exhausted and heuristic surfacing disabled");
                    return Err(RecognitionError::NoResolvableBreed);
                }
                self.run_heuristic(recognition_id, &image, &path_str, started)?
            }
        };

        if self.config.settings.enhancement_enabled {
            apply_enhancement(&mut result);
        }
        result.processing_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Native tier: bridge inference plus catalog resolution
    ///
    /// Returns `Ok(None)` when the tier is exhausted without a usable result
    /// (bridge failure, empty predictions, nothing resolvable); only
    /// cancellation propagates as an error.
    async fn attempt_native(
        &self,
        recognition_id: Uuid,
        image: &DecodedImage,
        image_path: &str,
        cancel: &CancellationToken,
        started: Instant,
    ) -> PipelineResult<Option<RecognitionResult>> {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(RecognitionError::Cancelled),
            outcome = self.call_bridge(image) => outcome,
        };
        let predictions = match outcome {
            Ok(predictions) => predictions,
            Err(e) if !e.is_caller_visible() => {
                tracing::warn!(error = %e, "native tier failed, falling back");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if predictions.is_empty() {
            tracing::debug!("bridge returned no predictions, falling back");
            return Ok(None);
        }

        // Predictions arrive pre-sorted. Keep the first entry per breed;
        // drop sub-threshold confidences and labels the catalog cannot map.
        let threshold = self.config.settings.confidence_threshold;
        let mut resolved: Vec<(&BreedProfile, f64)> = Vec::new();
        for prediction in &predictions {
            if prediction.confidence < threshold {
                continue;
            }
            let profile = self
                .catalog
                .resolve_by_label(&prediction.label)
                .or_else(|| self.catalog.resolve_by_name(&prediction.label));
            let Some(profile) = profile else {
                tracing::debug!(label = %prediction.label, "bridge label not in catalog");
                continue;
            };
            if resolved.iter().any(|(p, _)| p.id == profile.id) {
                continue;
            }
            resolved.push((profile, prediction.confidence));
        }
        if resolved.is_empty() {
            tracing::debug!("no bridge prediction resolved in catalog, falling back");
            return Ok(None);
        }

        let (top, top_confidence) = resolved[0];
        let alternatives: Vec<PredictionScore> = resolved[1..]
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, (profile, confidence))| PredictionScore::new(profile, *confidence, i + 2))
            .collect();

        let model_version = self.native_version().await;
        Ok(Some(RecognitionResult::new(
            recognition_id,
            image_path,
            top,
            top_confidence,
            alternatives,
            RecognitionTier::Native,
            started.elapsed().as_millis() as u64,
            model_version,
        )))
    }

    /// One bridge inference call with the configured timeout
    async fn call_bridge(&self, image: &DecodedImage) -> PipelineResult<Vec<BridgePrediction>> {
        let bridge = Arc::clone(&self.bridge);
        let bytes = image.raw_bytes().to_vec();
        let dimensions = ImageDimensions {
            width: image.width(),
            height: image.height(),
        };
        let task = tokio::task::spawn_blocking(move || bridge.infer(&bytes, dimensions));
        match tokio::time::timeout(self.config.settings.bridge_timeout(), task).await {
            Ok(Ok(Ok(predictions))) => Ok(predictions),
            Ok(Ok(Err(e))) => Err(RecognitionError::BridgeCallFailed(format!("{e:#}"))),
            Ok(Err(e)) => Err(RecognitionError::BridgeCallFailed(format!(
                "inference task failed: {e}"
            ))),
            Err(_) => Err(RecognitionError::BridgeCallFailed(format!(
                "inference timed out after {}ms",
                self.config.settings.bridge_timeout_ms
            ))),
        }
    }

    /// Heuristic tier: deterministic feature classification
    fn run_heuristic(
        &self,
        recognition_id: Uuid,
        image: &DecodedImage,
        image_path: &str,
        started: Instant,
    ) -> PipelineResult<RecognitionResult> {
        let features = self.extractor.extract(image);
        let catalog_size = self.catalog.count();
        let main = self
            .classifier
            .classify(&features, image.pixel_count(), catalog_size);
        let top = self
            .catalog
            .by_index(main.breed_index)
            .ok_or(RecognitionError::NoResolvableBreed)?;

        let mut alternatives = Vec::new();
        for alt in self.classifier.alternatives(&main, &features, catalog_size) {
            if let Some(profile) = self.catalog.by_index(alt.breed_index) {
                let rank = alternatives.len() + 2;
                alternatives.push(PredictionScore::new(profile, alt.confidence, rank));
            }
        }

        Ok(RecognitionResult::new(
            recognition_id,
            image_path,
            top,
            main.confidence,
            alternatives,
            RecognitionTier::Heuristic,
            started.elapsed().as_millis() as u64,
            HEURISTIC_VERSION.to_string(),
        ))
    }

    async fn ready_mode(&self) -> ReadyMode {
        match self.inner.lock().await.state {
            OrchestratorState::Ready(mode) => mode,
            _ => ReadyMode::FallbackOnly,
        }
    }

    /// Version tag for native results: bridge-reported when available
    async fn native_version(&self) -> String {
        let inner = self.inner.lock().await;
        inner
            .native_version
            .clone()
            .unwrap_or_else(|| self.config.model_version.clone())
    }
}

/// Confidence-enhancement pass: scale, clamp, mark provenance
fn apply_enhancement(result: &mut RecognitionResult) {
    result.confidence = (result.confidence * ENHANCEMENT_FACTOR).min(1.0);
    result.metadata.insert(
        "enhancement_factor".to_string(),
        ENHANCEMENT_FACTOR.to_string(),
    );
    result.model_version.push_str("+tta");
}
