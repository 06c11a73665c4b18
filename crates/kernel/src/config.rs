//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::derivative::CacheKey;
use crate::file::{DEFAULT_ALLOWED_TYPES, DEFAULT_HASH_PREFIX_LEN, MAX_HASH_PREFIX_LEN};

/// Maximum upload size (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Largest width or height a derivative may be resized to.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 8192;

/// Maximum concurrent resize operations.
pub const DEFAULT_MAX_CONCURRENT_RESIZES: usize = 4;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Required by the binary only.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Directory that public paths (`/uploads/...`) resolve against (default: `.`).
    pub public_dir: PathBuf,

    /// Store root relative to `public_dir`, without leading or trailing slashes
    /// (default: `uploads`).
    pub file_store_path: String,

    /// MIME types accepted when a caller does not pass its own allow-list.
    pub allowed_file_types: Vec<String>,

    /// Hex characters kept from content hashes for directory names (default: 3).
    pub hash_prefix_len: usize,

    /// Upload size limit in bytes (default: 10 MB).
    pub max_file_size: u64,

    /// Largest accepted derivative width or height (default: 8192).
    pub max_image_dimension: u32,

    /// Concurrent decode/resize operations (default: 4).
    pub max_concurrent_resizes: usize,

    /// How resize cache buckets are keyed (default: source path).
    pub resize_cache_key: CacheKey,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let public_dir = lookup("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let file_store_path = lookup("FILE_STORE_PATH")
            .unwrap_or_else(|| "uploads".to_string())
            .trim_matches(['/', '\\'])
            .to_string();

        let allowed_file_types = match lookup("ALLOWED_FILE_TYPES") {
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        };

        let hash_prefix_len: usize = match lookup("HASH_PREFIX_LEN") {
            Some(v) => v.parse().context("HASH_PREFIX_LEN must be a valid usize")?,
            None => DEFAULT_HASH_PREFIX_LEN,
        };
        if !(1..=MAX_HASH_PREFIX_LEN).contains(&hash_prefix_len) {
            bail!("HASH_PREFIX_LEN must be between 1 and {MAX_HASH_PREFIX_LEN}");
        }

        let max_file_size = match lookup("MAX_FILE_SIZE") {
            Some(v) => v.parse().context("MAX_FILE_SIZE must be a valid u64")?,
            None => DEFAULT_MAX_FILE_SIZE,
        };

        let max_image_dimension = match lookup("MAX_IMAGE_DIMENSION") {
            Some(v) => v.parse().context("MAX_IMAGE_DIMENSION must be a valid u32")?,
            None => DEFAULT_MAX_IMAGE_DIMENSION,
        };

        let max_concurrent_resizes: usize = match lookup("MAX_CONCURRENT_RESIZES") {
            Some(v) => v
                .parse()
                .context("MAX_CONCURRENT_RESIZES must be a valid usize")?,
            None => DEFAULT_MAX_CONCURRENT_RESIZES,
        };
        if max_concurrent_resizes == 0 {
            bail!("MAX_CONCURRENT_RESIZES must be at least 1");
        }

        let resize_cache_key = match lookup("RESIZE_CACHE_KEY") {
            Some(v) => v.parse()?,
            None => CacheKey::default(),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            public_dir,
            file_store_path,
            allowed_file_types,
            hash_prefix_len,
            max_file_size,
            max_image_dimension,
            max_concurrent_resizes,
            resize_cache_key,
        })
    }

    /// Configuration with defaults for a store under `public_dir`.
    pub fn for_store(public_dir: impl Into<PathBuf>, file_store_path: &str) -> Self {
        Self {
            database_url: None,
            database_max_connections: 10,
            public_dir: public_dir.into(),
            file_store_path: file_store_path.trim_matches(['/', '\\']).to_string(),
            allowed_file_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            hash_prefix_len: DEFAULT_HASH_PREFIX_LEN,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            max_concurrent_resizes: DEFAULT_MAX_CONCURRENT_RESIZES,
            resize_cache_key: CacheKey::default(),
        }
    }
}
