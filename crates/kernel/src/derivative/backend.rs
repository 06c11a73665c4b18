//! Image decode/resize backends.
//!
//! The resize cache only needs two things from a backend: the native size
//! of a source and an encoded, resized copy of it. Keeping that behind a
//! trait lets tests count backend calls and swap in failures.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use thiserror::Error;

/// Failures reported by an image backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No decoder (or encoder) exists for the source's format.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("image IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImageError> for BackendError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Unsupported(e) => Self::UnsupportedFormat(e.to_string()),
            ImageError::IoError(e) => Self::Io(e),
            ImageError::Encoding(e) => Self::Encode(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Decodes, resizes and re-encodes images.
///
/// Implementations are called from blocking threads.
pub trait ImageBackend: Send + Sync {
    /// Native `(width, height)` of the image at `source`.
    fn dimensions(&self, source: &Path) -> Result<(u32, u32), BackendError>;

    /// Resize the image at `source` to exactly `width` x `height` and return
    /// it encoded in the source's format.
    fn resize(&self, source: &Path, width: u32, height: u32) -> Result<Vec<u8>, BackendError>;
}

/// Backend built on the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateBackend {
    filter: FilterType,
}

impl ImageCrateBackend {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for ImageCrateBackend {
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl ImageBackend for ImageCrateBackend {
    fn dimensions(&self, source: &Path) -> Result<(u32, u32), BackendError> {
        let reader = ImageReader::open(source)?.with_guessed_format()?;
        if reader.format().is_none() {
            return Err(BackendError::UnsupportedFormat(source.display().to_string()));
        }
        Ok(reader.into_dimensions()?)
    }

    fn resize(&self, source: &Path, width: u32, height: u32) -> Result<Vec<u8>, BackendError> {
        let reader = ImageReader::open(source)?.with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| BackendError::UnsupportedFormat(source.display().to_string()))?;

        // The decoded image is dropped as soon as the resized copy exists.
        let resized = reader.decode()?.resize_exact(width, height, self.filter);
        encode(resized, format)
    }
}

fn encode(image: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel.
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };

    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}
