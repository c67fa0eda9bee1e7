//! Test helpers for recognition pipeline integration tests
//!
//! Provides reusable test infrastructure:
//! - ScriptedBridge: a ModelBridge double replaying queued replies
//! - Solid-color PNG fixtures written to temp directories
//! - Catalogs built from a fixed breed list

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use whisker_common::config::RecognitionSettings;
use whisker_common::BreedCatalog;
use whisker_ml::bridge::{BridgeInit, BridgePrediction, ImageDimensions, ModelBridge, ModelSpec};
use whisker_ml::OrchestratorConfig;

/// Install a test-writer tracing subscriber honoring RUST_LOG
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Breed labels used across pipeline tests, in model-output order
pub const TEST_BREEDS: [&str; 12] = [
    "Abyssinian",
    "Bengal",
    "British Shorthair",
    "Maine Coon",
    "Persian",
    "Ragdoll",
    "Siamese",
    "Siberian",
    "Sphynx",
    "Russian Blue",
    "Norwegian Forest",
    "Scottish Fold",
];

/// Catalog over the first `n` test breeds
pub fn catalog_of(n: usize) -> Arc<BreedCatalog> {
    let labels: Vec<String> = TEST_BREEDS.iter().take(n).map(|s| s.to_string()).collect();
    Arc::new(BreedCatalog::from_labels(&labels))
}

/// Write a solid-color PNG fixture and return its path
pub fn write_png(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    rgb: (u8, u8, u8),
) -> PathBuf {
    let img = RgbImage::from_pixel(width, height, image::Rgb([rgb.0, rgb.1, rgb.2]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, buf.into_inner()).unwrap();
    path
}

/// The 400x400 mid-gray reference image: heuristic index 5 at confidence 0.80
/// against a ten-breed catalog
pub fn write_gray_reference(dir: &Path) -> PathBuf {
    write_png(dir, "gray.png", 400, 400, (128, 128, 128))
}

/// Orchestrator config with the given settings; the asset paths are never
/// touched by the scripted bridge
pub fn test_config(settings: RecognitionSettings) -> OrchestratorConfig {
    OrchestratorConfig {
        model_spec: ModelSpec {
            model_path: PathBuf::from("/assets/models/model.tflite"),
            labels_path: PathBuf::from("/assets/models/labels.txt"),
            num_classes: 10,
            input_size: 384,
        },
        settings,
        model_version: "all_breeds_high_accuracy_v1-v1.0".to_string(),
    }
}

/// Shorthand for a labeled bridge prediction
pub fn prediction(label: &str, confidence: f64) -> BridgePrediction {
    BridgePrediction {
        label: label.to_string(),
        confidence,
    }
}

/// One scripted reply for a bridge inference call
#[derive(Debug, Clone)]
pub enum ScriptedCall {
    /// Return these predictions
    Predictions(Vec<BridgePrediction>),
    /// Fail with this message
    Failure(String),
    /// Block for the given duration, then fail (timeout scenarios)
    Hang(Duration),
}

/// ModelBridge double replaying a queue of scripted calls
///
/// Initialization succeeds unless constructed with `failing_init`. Calls are
/// counted so tests can assert initialization happens exactly once.
pub struct ScriptedBridge {
    script: Mutex<VecDeque<ScriptedCall>>,
    fail_init: bool,
    pub init_calls: AtomicUsize,
    pub infer_calls: AtomicUsize,
}

impl ScriptedBridge {
    pub fn new(script: Vec<ScriptedCall>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fail_init: false,
            init_calls: AtomicUsize::new(0),
            infer_calls: AtomicUsize::new(0),
        }
    }

    /// Bridge whose initialization always fails (fallback-only sessions)
    pub fn failing_init() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_init: true,
            init_calls: AtomicUsize::new(0),
            infer_calls: AtomicUsize::new(0),
        }
    }

    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn infer_count(&self) -> usize {
        self.infer_calls.load(Ordering::SeqCst)
    }
}

impl ModelBridge for ScriptedBridge {
    fn initialize(&self, spec: &ModelSpec) -> anyhow::Result<BridgeInit> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            anyhow::bail!("scripted initialization failure");
        }
        Ok(BridgeInit {
            num_labels: spec.num_classes,
            input_size: spec.input_size,
            model_version: None,
        })
    }

    fn infer(
        &self,
        _image: &[u8],
        _dimensions: ImageDimensions,
    ) -> anyhow::Result<Vec<BridgePrediction>> {
        self.infer_calls.fetch_add(1, Ordering::SeqCst);
        let call = self.script.lock().unwrap().pop_front();
        match call {
            Some(ScriptedCall::Predictions(predictions)) => Ok(predictions),
            Some(ScriptedCall::Failure(message)) => anyhow::bail!(message),
            Some(ScriptedCall::Hang(duration)) => {
                std::thread::sleep(duration);
                anyhow::bail!("hung call completed")
            }
            None => anyhow::bail!("no scripted call remaining"),
        }
    }
}
