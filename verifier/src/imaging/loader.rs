//! Image loading and normalization.
//!
//! Borrow and return photos arrive with arbitrary resolution, aspect ratio
//! and color profile; everything downstream assumes RGB8 at a canonical
//! scale, so all of that is fixed here.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use image::RgbImage;
use image::imageops::FilterType;
use log::debug;

use crate::config::{ALLOWED_EXTENSIONS, EngineConfig};

/// Everything that can go wrong turning an image reference into pixels.
/// Callers map these uniformly; no lower-level error escapes the loader.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("image file does not exist: {0}")]
    Missing(String),
    #[error("unsupported image format: {0}")]
    UnsupportedExtension(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("image load timed out after {0}s")]
    Timeout(u64),
}

/// Resolve `reference`, validate it, decode it, and normalize it to RGB8
/// with the shorter edge at the configured target.
pub fn load_image(reference: &str, config: &EngineConfig) -> Result<RgbImage, ImageLoadError> {
    let path = resolve_reference(reference, config);
    if !path.exists() {
        return Err(ImageLoadError::Missing(reference.to_string()));
    }

    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageLoadError::UnsupportedExtension(format!(".{extension}")));
    }

    let decoded = image::open(&path).map_err(|e| ImageLoadError::Decode(e.to_string()))?;
    let normalized = normalize(decoded.to_rgb8(), config.target_edge);
    debug!(
        "loaded {} as {}x{}",
        reference,
        normalized.width(),
        normalized.height()
    );
    Ok(normalized)
}

/// Relative references live under the uploads root handed out by the
/// file-storage layer; absolute paths are taken as-is.
fn resolve_reference(reference: &str, config: &EngineConfig) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.uploads_root.join(path)
    }
}

/// Resize so the shorter edge equals `target`, preserving aspect ratio.
pub fn normalize(img: RgbImage, target: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width.min(height) == target {
        return img;
    }
    let (new_width, new_height) = if width < height {
        (target, ((height as u64 * target as u64) / width as u64).max(1) as u32)
    } else {
        (((width as u64 * target as u64) / height as u64).max(1) as u32, target)
    };
    image::imageops::resize(&img, new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> EngineConfig {
        EngineConfig {
            uploads_root: dir.path().to_path_buf(),
            ..EngineConfig::default()
        }
    }

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([40, 90, 160]))
            .save(dir.path().join(name))
            .unwrap();
    }

    #[test]
    fn loads_and_normalizes_relative_reference() {
        let dir = TempDir::new().unwrap();
        write_png(&dir, "borrow.png", 400, 300);

        let img = load_image("borrow.png", &config_for(&dir)).unwrap();
        assert_eq!(img.dimensions(), (341, 256));
    }

    #[test]
    fn loads_absolute_reference() {
        let dir = TempDir::new().unwrap();
        write_png(&dir, "borrow.png", 300, 300);

        let absolute = dir.path().join("borrow.png");
        let img = load_image(absolute.to_str().unwrap(), &config_for(&dir)).unwrap();
        assert_eq!(img.dimensions(), (256, 256));
    }

    #[test]
    fn missing_file_is_classified() {
        let dir = TempDir::new().unwrap();
        let err = load_image("nope.png", &config_for(&dir)).unwrap_err();
        assert!(matches!(err, ImageLoadError::Missing(_)));
    }

    #[test]
    fn disallowed_extension_is_classified() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

        let err = load_image("notes.txt", &config_for(&dir)).unwrap_err();
        match err {
            ImageLoadError::UnsupportedExtension(ext) => assert_eq!(ext, ".txt"),
            other => panic!("expected extension error, got {other:?}"),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(300, 300, Rgb([1, 2, 3]))
            .save_with_format(dir.path().join("photo.PNG"), image::ImageFormat::Png)
            .unwrap();

        assert!(load_image("photo.PNG", &config_for(&dir)).is_ok());
    }

    #[test]
    fn garbage_bytes_fail_as_decode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

        let err = load_image("broken.png", &config_for(&dir)).unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode(_)));
    }

    #[test]
    fn normalize_keeps_canonical_size() {
        let img = RgbImage::from_pixel(256, 512, Rgb([0, 0, 0]));
        let out = normalize(img, 256);
        assert_eq!(out.dimensions(), (256, 512));
    }

    #[test]
    fn normalize_shrinks_landscape() {
        let img = RgbImage::from_pixel(1024, 512, Rgb([0, 0, 0]));
        let out = normalize(img, 256);
        assert_eq!(out.dimensions(), (512, 256));
    }

    #[test]
    fn normalize_upscales_small_input() {
        let img = RgbImage::from_pixel(64, 96, Rgb([0, 0, 0]));
        let out = normalize(img, 256);
        assert_eq!(out.dimensions(), (256, 384));
    }
}
