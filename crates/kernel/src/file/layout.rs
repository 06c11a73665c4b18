//! Public path layout of the store.
//!
//! Public paths are `/`-separated strings beginning with `/`, e.g.
//! `/uploads/ba7/photo.jpg`. They resolve against the public directory on
//! disk regardless of the platform's separator.

use std::path::{Path, PathBuf};

use crate::error::{DepotError, DepotResult};

/// Maps between public paths and filesystem locations.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    public_dir: PathBuf,
    store_path: String,
}

impl StoreLayout {
    /// Create a layout with the store root `store_path` under `public_dir`.
    pub fn new(public_dir: impl Into<PathBuf>, store_path: &str) -> Self {
        Self {
            public_dir: public_dir.into(),
            store_path: trim_separators(store_path).to_string(),
        }
    }

    /// Store root relative to the public directory, without slashes.
    pub fn store_path(&self) -> &str {
        &self.store_path
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Public path of `segments` under the store root.
    pub fn public_path(&self, segments: &[&str]) -> String {
        let mut path = String::new();
        for segment in std::iter::once(self.store_path.as_str()).chain(segments.iter().copied()) {
            let segment = trim_separators(segment);
            if segment.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }

    /// Filesystem location of a public (or already relative) path.
    ///
    /// Rejects `.`/`..` components and NUL bytes so a path can never
    /// resolve outside the public directory.
    pub fn resolve(&self, public_path: &str) -> DepotResult<PathBuf> {
        let relative = trim_separators(public_path);
        if relative.contains('\0') {
            return Err(DepotError::InvalidPath(public_path.to_string()));
        }

        let mut resolved = self.public_dir.clone();
        for component in relative.split(['/', '\\']).filter(|c| !c.is_empty()) {
            if component == "." || component == ".." {
                return Err(DepotError::InvalidPath(public_path.to_string()));
            }
            resolved.push(component);
        }
        Ok(resolved)
    }

    /// Filesystem location of the store root.
    pub fn root_dir(&self) -> DepotResult<PathBuf> {
        self.resolve(&self.store_path)
    }
}

/// Strip leading and trailing path separators.
pub fn trim_separators(path: &str) -> &str {
    path.trim_matches(['/', '\\'])
}

/// Last component of a public path.
pub fn base_name(path: &str) -> Option<&str> {
    trim_separators(path)
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Parse a `{width}x{height}` derivative bucket name.
pub fn parse_size_bucket(name: &str) -> Option<(u32, u32)> {
    let (width, height) = name.split_once('x')?;
    if width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if height.is_empty() || !height.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((width.parse().ok()?, height.parse().ok()?))
}
