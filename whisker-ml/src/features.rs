//! Deterministic pixel-statistics extraction
//!
//! The fallback classifier keys off three statistics sampled from the decoded
//! image. Sampling walks linear pixel indices at a fixed stride so the same
//! image always yields the same features, regardless of platform.

use crate::loader::DecodedImage;
use std::collections::BTreeMap;

/// Statistics extracted from one decoded image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFeatures {
    /// XOR-folded packed RGB samples, non-negative
    pub content_hash: i64,
    /// Most common quantized color, packed 0xRRGGBB
    pub dominant_color: u32,
    /// Mean luminance of sampled pixels in [0.0, 1.0]
    pub brightness: f64,
}

/// Extracts [`ImageFeatures`] from decoded images
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFeatureExtractor;

impl ImageFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, image: &DecodedImage) -> ImageFeatures {
        let features = ImageFeatures {
            content_hash: self.content_hash(image),
            dominant_color: self.dominant_color(image),
            brightness: self.brightness(image),
        };
        tracing::debug!(
            content_hash = features.content_hash,
            dominant_color = features.dominant_color,
            brightness = features.brightness,
            "extracted image features"
        );
        features
    }

    /// XOR of packed 24-bit samples at a stride targeting ~1000 pixels
    fn content_hash(&self, image: &DecodedImage) -> i64 {
        let mut hash: i64 = 0;
        for (r, g, b) in sample_pixels(image, 1000) {
            let packed = (i64::from(r) << 16) | (i64::from(g) << 8) | i64::from(b);
            hash ^= packed;
        }
        hash.abs()
    }

    /// Most common color after quantizing each channel to the lower multiple
    /// of 32, sampled at a stride targeting ~500 pixels
    ///
    /// Ties resolve to the numerically smallest packed color.
    fn dominant_color(&self, image: &DecodedImage) -> u32 {
        let mut tally: BTreeMap<u32, u32> = BTreeMap::new();
        for (r, g, b) in sample_pixels(image, 500) {
            let key = (u32::from(r & 0xE0) << 16) | (u32::from(g & 0xE0) << 8) | u32::from(b & 0xE0);
            *tally.entry(key).or_insert(0) += 1;
        }
        // Ascending key order plus strict > keeps the smallest key on ties
        let mut best_key = 0u32;
        let mut best_count = 0u32;
        for (key, count) in tally {
            if count > best_count {
                best_key = key;
                best_count = count;
            }
        }
        best_key
    }

    /// Mean ITU-R 601 luminance of ~1000 sampled pixels
    fn brightness(&self, image: &DecodedImage) -> f64 {
        let mut sum = 0.0;
        let mut samples = 0u64;
        for (r, g, b) in sample_pixels(image, 1000) {
            let luminance =
                (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
            sum += luminance;
            samples += 1;
        }
        if samples == 0 {
            return 0.5;
        }
        sum / samples as f64
    }
}

/// Walk linear pixel indices at `max(1, pixel_count / target)` stride
fn sample_pixels(
    image: &DecodedImage,
    target: u64,
) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
    let total = image.pixel_count();
    let width = u64::from(image.width());
    let stride = (total / target).max(1);
    (0..total).step_by(stride as usize).map(move |idx| {
        let x = (idx % width) as u32;
        let y = (idx / width) as u32;
        image.pixel_at(x, y)
    })
}
