//! Image normalization: arbitrary downloaded images → uniform card size.
//!
//! Downloaded scans differ in resolution and, occasionally, in aspect ratio
//! (older scans carry uneven borders). Printing demands every card render at
//! exactly the same size, so each image is scaled to fit the target box
//! while preserving its aspect ratio, then centred on a white canvas of the
//! exact target dimensions.
//!
//! The work is behind the [`Normalizer`] trait so the resize backend can be
//! swapped (e.g. for an external tool) without touching the compositor.

use crate::error::DeckSheetError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Narrow interface over the resize step: one image in, one image out.
pub trait Normalizer: Send + Sync {
    /// Produce an image at exactly the fixed card dimensions.
    fn normalize(&self, img: DynamicImage) -> Result<RgbaImage, DeckSheetError>;

    /// Target width in pixels.
    fn width(&self) -> u32;

    /// Target height in pixels.
    fn height(&self) -> u32;
}

/// Native normalizer: aspect-preserving resize plus white padding.
#[derive(Debug, Clone, Copy)]
pub struct FitNormalizer {
    width: u32,
    height: u32,
}

impl FitNormalizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Normalizer for FitNormalizer {
    fn normalize(&self, img: DynamicImage) -> Result<RgbaImage, DeckSheetError> {
        let (w, h) = (img.width(), img.height());
        if w == 0 || h == 0 {
            return Err(DeckSheetError::Normalization {
                path: PathBuf::new(),
                detail: "zero-sized image".into(),
            });
        }

        // Scale to the largest size that fits inside the target box.
        let scale = f64::min(
            self.width as f64 / w as f64,
            self.height as f64 / h as f64,
        );
        let scaled_w = ((w as f64 * scale).round() as u32).max(1);
        let scaled_h = ((h as f64 * scale).round() as u32).max(1);

        let scaled = img.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3);

        let mut canvas =
            RgbaImage::from_pixel(self.width, self.height, Rgba([255, 255, 255, 255]));
        let x = (self.width - scaled_w) / 2;
        let y = (self.height - scaled_h) / 2;
        imageops::overlay(&mut canvas, &scaled.to_rgba8(), x as i64, y as i64);

        debug!(
            "Normalized {}x{} → {}x{} (content {}x{})",
            w, h, self.width, self.height, scaled_w, scaled_h
        );
        Ok(canvas)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Decode a cached image file and normalize it.
///
/// The cache stores raw downloaded bytes without an extension, so the format
/// is sniffed from content rather than the file name.
///
/// # Errors
/// [`DeckSheetError::Normalization`] when the file cannot be read or decoded.
pub fn load_and_normalize(
    path: &Path,
    normalizer: &dyn Normalizer,
) -> Result<RgbaImage, DeckSheetError> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| DeckSheetError::Normalization {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| DeckSheetError::Normalization {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let img = reader.decode().map_err(|e| DeckSheetError::Normalization {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    normalizer.normalize(img)
}
