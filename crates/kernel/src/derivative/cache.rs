//! Resize cache for image derivatives.
//!
//! A derivative of `/uploads/ba7/photo.jpg` at 100x100 lives at
//! `/uploads/100x100/{fragment}/photo.jpg`, where `fragment` is a short hash
//! of the source's relative path (or of its bytes, see [`CacheKey`]). The
//! derivative is computed on the first request and served from disk on
//! every later one.
//!
//! There is no per-key lock. Two first requests for the same key may both
//! resize; each writes a temporary file and renames it into place, so
//! readers see either no derivative or a complete one.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::backend::{BackendError, ImageBackend};
use crate::config::{DEFAULT_MAX_CONCURRENT_RESIZES, DEFAULT_MAX_IMAGE_DIMENSION};
use crate::error::{DepotError, DepotResult};
use crate::file::hash::HashNamer;
use crate::file::layout::{StoreLayout, base_name, parse_size_bucket, trim_separators};
use crate::file::storage::write_atomic;
use crate::models::File;

/// What the cache directory fragment is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheKey {
    /// Hash of the source's relative path. Replacing a source in place keeps
    /// serving the old derivatives until they are purged.
    #[default]
    SourcePath,
    /// Hash of the source's bytes. Costs a full read of the source per call.
    SourceContent,
}

#[derive(Debug, Error)]
#[error("unknown resize cache key {0:?}, expected \"path\" or \"content\"")]
pub struct ParseCacheKeyError(String);

impl FromStr for CacheKey {
    type Err = ParseCacheKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(Self::SourcePath),
            "content" => Ok(Self::SourceContent),
            _ => Err(ParseCacheKeyError(s.to_string())),
        }
    }
}

/// Maps (source, width, height) to a cached derivative, generating it once.
#[derive(Clone)]
pub struct ResizeCache {
    layout: StoreLayout,
    namer: HashNamer,
    key: CacheKey,
    backend: Arc<dyn ImageBackend>,
    max_dimension: u32,
    /// Limits concurrent decode/resize work; not a per-key lock.
    processing_semaphore: Arc<Semaphore>,
}

impl ResizeCache {
    /// Create a resize cache over `layout` using `backend`.
    pub fn new(layout: StoreLayout, backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            layout,
            namer: HashNamer::default(),
            key: CacheKey::default(),
            backend,
            max_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            processing_semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_RESIZES)),
        }
    }

    pub fn with_namer(mut self, namer: HashNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn with_key(mut self, key: CacheKey) -> Self {
        self.key = key;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_max_concurrent(mut self, permits: usize) -> Self {
        self.processing_semaphore = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Public path of `image` resized to exactly `width` x `height`.
    ///
    /// Returns the cached derivative when it exists. Otherwise the source is
    /// resized and written to the cache. When the backend has no decoder for
    /// the source's format, the source's own path is returned instead, so
    /// callers must accept an unresized image.
    pub async fn resized_image_path(
        &self,
        image: &File,
        width: u32,
        height: u32,
    ) -> DepotResult<String> {
        self.check_dimensions(width, height)?;

        let relative = trim_separators(&image.path);
        let name =
            base_name(relative).ok_or_else(|| DepotError::InvalidPath(image.path.clone()))?;
        let source = self.layout.resolve(relative)?;

        let fragment = self.fragment(relative, &source).await?;
        let bucket = format!("{width}x{height}");
        let public_path = self.layout.public_path(&[&bucket, &fragment, name]);
        let cached_file = self.layout.resolve(&public_path)?;

        if let Some(cache_dir) = cached_file.parent() {
            fs::create_dir_all(cache_dir).await?;
        }

        if fs::try_exists(&cached_file).await? {
            debug!(source = %image.path, derivative = %public_path, "derivative cache hit");
            return Ok(public_path);
        }

        let encoded = {
            let _permit = self.processing_semaphore.acquire().await?;
            let backend = Arc::clone(&self.backend);
            tokio::task::spawn_blocking(move || backend.resize(&source, width, height)).await?
        };

        let encoded = match encoded {
            Ok(bytes) => bytes,
            Err(BackendError::UnsupportedFormat(reason)) => {
                info!(
                    source = %image.path,
                    reason = %reason,
                    "no decoder for source format, serving original"
                );
                return Ok(image.path.clone());
            }
            Err(e) => return Err(e.into()),
        };

        write_atomic(&cached_file, &encoded).await?;

        info!(
            source = %image.path,
            derivative = %public_path,
            width,
            height,
            size = encoded.len(),
            "derivative generated"
        );
        Ok(public_path)
    }

    /// Native pixel dimensions of `image`, or `None` when the backend has
    /// no decoder for its format.
    pub async fn source_dimensions(&self, image: &File) -> DepotResult<Option<(u32, u32)>> {
        let source = self.layout.resolve(&image.path)?;
        let backend = Arc::clone(&self.backend);

        match tokio::task::spawn_blocking(move || backend.dimensions(&source)).await? {
            Ok(dimensions) => Ok(Some(dimensions)),
            Err(BackendError::UnsupportedFormat(reason)) => {
                info!(source = %image.path, reason = %reason, "no decoder for source format");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every cached derivative of `image`, across all size buckets.
    ///
    /// With [`CacheKey::SourceContent`] this must run before the source is
    /// replaced, since the fragment is derived from the current bytes.
    /// Returns the number of derivatives removed.
    pub async fn purge(&self, image: &File) -> DepotResult<usize> {
        let relative = trim_separators(&image.path);
        let name =
            base_name(relative).ok_or_else(|| DepotError::InvalidPath(image.path.clone()))?;
        let source = self.layout.resolve(relative)?;
        let fragment = self.fragment(relative, &source).await?;

        let root = self.layout.root_dir()?;
        let mut entries = match fs::read_dir(&root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let bucket = entry.file_name();
            if parse_size_bucket(&bucket.to_string_lossy()).is_none()
                || !entry.file_type().await?.is_dir()
            {
                continue;
            }

            let fragment_dir = entry.path().join(&fragment);
            match fs::remove_file(fragment_dir.join(name)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
            remove_if_empty(&fragment_dir).await;
        }

        debug!(source = %image.path, removed, "derivatives purged");
        Ok(removed)
    }

    fn check_dimensions(&self, width: u32, height: u32) -> DepotResult<()> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension
        {
            return Err(DepotError::InvalidDimensions { width, height });
        }
        Ok(())
    }

    async fn fragment(&self, relative: &str, source: &Path) -> DepotResult<String> {
        match self.key {
            CacheKey::SourcePath => Ok(self.namer.hash(relative.as_bytes())),
            CacheKey::SourceContent => Ok(self.namer.hash_file(source).await?),
        }
    }
}

impl std::fmt::Debug for ResizeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeCache")
            .field("layout", &self.layout)
            .field("namer", &self.namer)
            .field("key", &self.key)
            .field("max_dimension", &self.max_dimension)
            .finish()
    }
}

async fn remove_if_empty(dir: &Path) {
    // remove_dir refuses non-empty directories.
    if let Err(e) = fs::remove_dir(dir).await {
        debug!(error = %e, dir = ?dir, "kept derivative directory");
    }
}
