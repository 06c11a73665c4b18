#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every [`TestApp`] runs the real kernel services over a scratch public
//! directory and an in-memory file repository, so no database is needed.
//! The image backend is the real `image` crate backend wrapped in a
//! counter, which lets tests observe cache hits.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use depot_kernel::derivative::{BackendError, CacheKey, ImageBackend, ImageCrateBackend};
use depot_kernel::file::{HashNamer, MemoryFileRepository};
use depot_kernel::{AppState, Config, File, UploadedFile};

/// Store root used by every test app.
pub const STORE_PATH: &str = "uploads";

/// Real backend that counts its calls.
#[derive(Debug, Default)]
pub struct CountingBackend {
    inner: ImageCrateBackend,
    resizes: AtomicUsize,
    probes: AtomicUsize,
}

impl CountingBackend {
    pub fn resizes(&self) -> usize {
        self.resizes.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ImageBackend for CountingBackend {
    fn dimensions(&self, source: &Path) -> Result<(u32, u32), BackendError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.dimensions(source)
    }

    fn resize(&self, source: &Path, width: u32, height: u32) -> Result<Vec<u8>, BackendError> {
        self.resizes.fetch_add(1, Ordering::SeqCst);
        self.inner.resize(source, width, height)
    }
}

/// Test application over a scratch directory.
pub struct TestApp {
    pub state: AppState,
    pub backend: Arc<CountingBackend>,
    pub repository: Arc<MemoryFileRepository>,
    dir: TempDir,
}

impl TestApp {
    /// App with default configuration.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// App with configuration adjusted by `configure`.
    pub fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let dir = depot_test_utils::scratch_dir();
        let mut config = Config::for_store(dir.path(), STORE_PATH);
        configure(&mut config);

        let backend = Arc::new(CountingBackend::default());
        let repository = Arc::new(MemoryFileRepository::new());
        let state = AppState::with_parts(&config, repository.clone(), backend.clone());

        Self {
            state,
            backend,
            repository,
            dir,
        }
    }

    /// App whose resize cache keys derivatives by source content.
    pub fn content_keyed() -> Self {
        Self::with_config(|config| config.resize_cache_key = CacheKey::SourceContent)
    }

    pub fn public_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Filesystem location of a public path.
    pub fn disk_path(&self, public_path: &str) -> PathBuf {
        self.public_dir().join(public_path.trim_start_matches('/'))
    }

    /// Number of regular files anywhere under the store root.
    pub fn stored_file_count(&self) -> usize {
        depot_test_utils::count_files(&self.public_dir().join(STORE_PATH))
    }

    /// Store `data` as `name` through the file service.
    pub async fn store(&self, name: &str, mime_type: &str, data: Vec<u8>) -> File {
        self.state
            .files()
            .save_uploaded_file(UploadedFile::from_bytes(name, mime_type, data))
            .await
            .expect("store upload")
    }

    /// Store a JPEG of the given size as `name`.
    pub async fn store_jpeg(&self, name: &str, width: u32, height: u32) -> File {
        self.store(name, "image/jpeg", depot_test_utils::jpeg_bytes(width, height))
            .await
    }

    /// Store a PNG of the given size as `name`.
    pub async fn store_png(&self, name: &str, width: u32, height: u32) -> File {
        self.store(name, "image/png", depot_test_utils::png_bytes(width, height))
            .await
    }
}

/// Default-length directory hash of `data`.
pub fn short_hash(data: &[u8]) -> String {
    HashNamer::default().hash(data)
}

/// Pixel size of the image at `path`.
pub fn image_size(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).expect("read derivative dimensions")
}
