//! Application state shared by every caller of the kernel.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::derivative::{ImageBackend, ImageCrateBackend, ResizeCache, VariantSetBuilder};
use crate::file::{
    FileRepository, FileService, HashNamer, LocalFileStorage, PgFileRepository, StoreLayout,
    TypeValidator,
};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// File service for uploads.
    files: FileService,

    /// Variant sets over the resize cache.
    variants: VariantSetBuilder,
}

impl AppState {
    /// Connect to PostgreSQL and build services with the `image` backend.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        if !db::check_health(&pool).await {
            anyhow::bail!("database is not responding");
        }

        let repository = PgFileRepository::new(pool);
        repository
            .ensure_schema()
            .await
            .context("failed to create file table")?;
        info!("Database connection established");

        Ok(Self::with_parts(
            config,
            Arc::new(repository),
            Arc::new(ImageCrateBackend::default()),
        ))
    }

    /// Build services over an explicit repository and image backend.
    pub fn with_parts(
        config: &Config,
        repository: Arc<dyn FileRepository>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        let layout = StoreLayout::new(&config.public_dir, &config.file_store_path);
        let namer = HashNamer::new(config.hash_prefix_len);

        let files = FileService::new(
            repository,
            LocalFileStorage::new(layout.clone(), namer),
            TypeValidator::new(&config.allowed_file_types),
            config.max_file_size,
        );

        let cache = ResizeCache::new(layout, backend)
            .with_namer(namer)
            .with_key(config.resize_cache_key)
            .with_max_dimension(config.max_image_dimension)
            .with_max_concurrent(config.max_concurrent_resizes);

        Self {
            inner: Arc::new(AppStateInner {
                files,
                variants: VariantSetBuilder::new(cache),
            }),
        }
    }

    /// Get the file service.
    pub fn files(&self) -> &FileService {
        &self.inner.files
    }

    /// Get the resize cache.
    pub fn resize_cache(&self) -> &ResizeCache {
        self.inner.variants.cache()
    }

    /// Get the variant set builder.
    pub fn variants(&self) -> &VariantSetBuilder {
        &self.inner.variants
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("files", &self.inner.files)
            .field("variants", &self.inner.variants)
            .finish()
    }
}
