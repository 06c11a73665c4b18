//! Named derivative sets for standard and high-density displays.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::cache::ResizeCache;
use crate::error::{DepotError, DepotResult};
use crate::models::File;

/// Paths of an image for each display density.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    /// The stored original.
    pub raw: String,
    #[serde(rename = "1x")]
    pub x1: String,
    #[serde(rename = "2x")]
    pub x2: String,
}

impl VariantSet {
    /// Look up an entry by its key (`raw`, `1x` or `2x`).
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "raw" => Some(self.raw.as_str()),
            "1x" => Some(self.x1.as_str()),
            "2x" => Some(self.x2.as_str()),
            _ => None,
        }
    }
}

/// Builds [`VariantSet`]s on top of a [`ResizeCache`].
#[derive(Debug, Clone)]
pub struct VariantSetBuilder {
    cache: ResizeCache,
}

impl VariantSetBuilder {
    pub fn new(cache: ResizeCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ResizeCache {
        &self.cache
    }

    /// `1x` at `width` x `height` and `2x` at double that.
    ///
    /// Returns `None` without touching the filesystem when `image` is `None`.
    pub async fn resize_to_set(
        &self,
        image: Option<&File>,
        width: u32,
        height: u32,
    ) -> DepotResult<Option<VariantSet>> {
        let Some(image) = image else {
            return Ok(None);
        };

        let (double_width, double_height) = width
            .checked_mul(2)
            .zip(height.checked_mul(2))
            .ok_or(DepotError::InvalidDimensions { width, height })?;

        let x1 = self.cache.resized_image_path(image, width, height).await?;
        let x2 = self
            .cache
            .resized_image_path(image, double_width, double_height)
            .await?;

        Ok(Some(VariantSet {
            raw: image.path.clone(),
            x1,
            x2,
        }))
    }

    /// Set for an image stored at double display resolution: `1x` is the
    /// image at half its native size, `2x` is the original itself.
    ///
    /// The caller guarantees the stored image really is a 2x master; nothing
    /// here checks it. Halves round down and never drop below one pixel.
    /// When the backend cannot decode the image, or a half still exceeds the
    /// cache's maximum dimension, `1x` is the original as well.
    /// Returns `None` without touching the filesystem when `image` is `None`.
    pub async fn resize_to_retina_set(
        &self,
        image: Option<&File>,
    ) -> DepotResult<Option<VariantSet>> {
        let Some(image) = image else {
            return Ok(None);
        };

        let max = self.cache.max_dimension();
        let x1 = match self.cache.source_dimensions(image).await? {
            Some((width, height)) => {
                let (half_width, half_height) = ((width / 2).max(1), (height / 2).max(1));
                if half_width > max || half_height > max {
                    info!(
                        source = %image.path,
                        width,
                        height,
                        max,
                        "master too large to halve, serving original as 1x"
                    );
                    image.path.clone()
                } else {
                    self.cache
                        .resized_image_path(image, half_width, half_height)
                        .await?
                }
            }
            None => image.path.clone(),
        };

        Ok(Some(VariantSet {
            raw: image.path.clone(),
            x1,
            x2: image.path.clone(),
        }))
    }
}
