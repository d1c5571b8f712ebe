//! Similarity metrics over normalized pixel buffers.

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::config::HASH_EDGE;

/// Pixel-level similarity in `(0, 100]`.
///
/// If the buffers still differ in size after normalization (different
/// aspect ratios), the second is resampled to the first's exact dimensions
/// so the per-pixel comparison is well-defined. The MSE of all RGB channels
/// maps to `100 * 1/(1 + mse/255)`: identical buffers score exactly 100 and
/// the score degrades smoothly, never unbounded or negative.
pub fn pixel_similarity(a: &RgbImage, b: &RgbImage) -> f64 {
    let resampled;
    let b = if a.dimensions() != b.dimensions() {
        resampled = imageops::resize(b, a.width(), a.height(), FilterType::CatmullRom);
        &resampled
    } else {
        b
    };

    let mut sum = 0.0f64;
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        for channel in 0..3 {
            let diff = pa[channel] as f64 - pb[channel] as f64;
            sum += diff * diff;
        }
    }
    let mse = sum / (a.width() as f64 * a.height() as f64 * 3.0);

    (100.0 * (1.0 / (1.0 + mse / 255.0))).clamp(0.0, 100.0)
}

/// Coarse mean-luminance hash similarity in `[0, 100]`.
///
/// Auxiliary signal, robust against resize artifacts; deliberately not
/// folded into [`pixel_similarity`].
pub fn hash_similarity(a: &RgbImage, b: &RgbImage) -> f64 {
    (1.0 - (mean_hash(a) - mean_hash(b)).abs()) * 100.0
}

/// Fraction of thumbnail pixels whose luminance exceeds mid-gray.
fn mean_hash(img: &RgbImage) -> f64 {
    let thumb = imageops::resize(img, HASH_EDGE, HASH_EDGE, FilterType::Triangle);
    let bright = thumb
        .pixels()
        .filter(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64 > 128.0)
        .count();
    bright as f64 / (HASH_EDGE * HASH_EDGE) as f64
}
