//! Image loading and decoding
//!
//! Decodes caller-supplied image files into RGB pixel buffers while keeping
//! the original encoded bytes around for the model bridge. Guards against
//! decompression bombs before full decode.

use crate::error::{PipelineResult, RecognitionError};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Largest encoded file accepted (20 MB)
pub const MAX_COMPRESSED_BYTES: usize = 20 * 1024 * 1024;

/// Largest decoded pixel count accepted (100 megapixels)
pub const MAX_PIXELS: u64 = 100_000_000;

/// A decoded image plus the encoded bytes it came from
///
/// The bridge receives the original encoded bytes; feature extraction reads
/// the decoded pixels.
#[derive(Debug)]
pub struct DecodedImage {
    raw: Vec<u8>,
    pixels: image::RgbImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Total decoded pixels (width * height)
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// RGB channels at (x, y); panics if out of bounds
    pub fn pixel_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let p = self.pixels.get_pixel(x, y);
        (p[0], p[1], p[2])
    }

    /// Original encoded bytes as read from disk
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Stateless decoder shared by all recognition calls
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl ImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read and decode an image file
    ///
    /// Any failure (unreadable file, unsupported type, corrupt data,
    /// oversized input) maps to [`RecognitionError::DecodeFailed`].
    pub fn load(&self, path: &Path) -> PipelineResult<DecodedImage> {
        let bytes = std::fs::read(path).map_err(|e| {
            RecognitionError::DecodeFailed(format!("cannot read {}: {}", path.display(), e))
        })?;
        self.decode(bytes)
    }

    /// Decode already-read bytes
    pub fn decode(&self, bytes: Vec<u8>) -> PipelineResult<DecodedImage> {
        if bytes.is_empty() {
            return Err(RecognitionError::DecodeFailed("empty file".to_string()));
        }
        if bytes.len() > MAX_COMPRESSED_BYTES {
            return Err(RecognitionError::DecodeFailed(format!(
                "encoded size {} exceeds limit {}",
                bytes.len(),
                MAX_COMPRESSED_BYTES
            )));
        }

        // Magic-byte check before handing bytes to the decoder
        if let Some(kind) = infer::get(&bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(RecognitionError::DecodeFailed(format!(
                    "unsupported file type: {}",
                    kind.mime_type()
                )));
            }
        }

        // Header-only dimension probe so a decompression bomb is rejected
        // before the full pixel buffer is allocated
        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| RecognitionError::DecodeFailed(format!("format detection: {e}")))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| RecognitionError::DecodeFailed(format!("cannot read dimensions: {e}")))?;
        let pixel_count = u64::from(width) * u64::from(height);
        if pixel_count == 0 {
            return Err(RecognitionError::DecodeFailed(format!(
                "degenerate dimensions {width}x{height}"
            )));
        }
        if pixel_count > MAX_PIXELS {
            return Err(RecognitionError::DecodeFailed(format!(
                "{width}x{height} exceeds pixel limit {MAX_PIXELS}"
            )));
        }

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| RecognitionError::DecodeFailed(format!("decode: {e}")))?;
        let pixels = decoded.to_rgb8();
        tracing::debug!(width, height, "decoded image");

        Ok(DecodedImage { raw: bytes, pixels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn encode_png(width: u32, height: u32, rgb: (u8, u8, u8)) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([rgb.0, rgb.1, rgb.2]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_valid_png() {
        let bytes = encode_png(64, 48, (10, 20, 30));
        let decoded = ImageLoader::new().decode(bytes).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
        assert_eq!(decoded.pixel_count(), 64 * 48);
        assert_eq!(decoded.pixel_at(0, 0), (10, 20, 30));
    }

    #[test]
    fn test_decode_keeps_raw_bytes() {
        let bytes = encode_png(8, 8, (1, 2, 3));
        let decoded = ImageLoader::new().decode(bytes.clone()).unwrap();
        assert_eq!(decoded.raw_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = ImageLoader::new().decode(Vec::new()).unwrap_err();
        assert!(matches!(err, RecognitionError::DecodeFailed(_)));
    }

    #[test]
    fn test_garbage_input_rejected() {
        let err = ImageLoader::new()
            .decode(vec![0xAB; 256])
            .unwrap_err();
        assert!(matches!(err, RecognitionError::DecodeFailed(_)));
    }

    #[test]
    fn test_non_image_type_rejected() {
        // A PDF header is a recognized non-image type
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        let err = ImageLoader::new().decode(bytes).unwrap_err();
        match err {
            RecognitionError::DecodeFailed(msg) => assert!(msg.contains("application/pdf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_encoded_input_rejected() {
        let bytes = vec![0u8; MAX_COMPRESSED_BYTES + 1];
        let err = ImageLoader::new().decode(bytes).unwrap_err();
        match err {
            RecognitionError::DecodeFailed(msg) => assert!(msg.contains("exceeds limit")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImageLoader::new()
            .load(Path::new("/nonexistent/cat.jpg"))
            .unwrap_err();
        assert!(matches!(err, RecognitionError::DecodeFailed(_)));
    }
}
