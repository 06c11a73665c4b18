//! Local filesystem storage for uploads.
//!
//! Uploads land in `{store}/{hash}/{name}`, where `hash` is a short
//! fragment of the content digest, or directly in `{store}/{name}` when the
//! caller asks for the store root.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::hash::HashNamer;
use super::layout::{StoreLayout, parse_size_bucket};
use super::upload::UploadSource;
use crate::error::{DepotError, DepotResult};

/// Longest filename kept on disk.
const MAX_FILENAME_LEN: usize = 200;

/// Hex characters of the tag appended to rewritten names.
const NAME_TAG_LEN: usize = 8;

/// Writes upload bytes into the store layout.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    layout: StoreLayout,
    namer: HashNamer,
}

impl LocalFileStorage {
    /// Create a new local file storage.
    pub fn new(layout: StoreLayout, namer: HashNamer) -> Self {
        Self { layout, namer }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Move an upload to its place in the store and return its public path.
    ///
    /// An existing file at the destination is replaced. Only the same
    /// `target_name` maps to the same destination; see [`stored_filename`].
    pub async fn write(
        &self,
        source: UploadSource,
        target_name: &str,
        save_to_root: bool,
    ) -> DepotResult<String> {
        let safe_name = stored_filename(target_name)
            .ok_or_else(|| DepotError::InvalidPath(target_name.to_string()))?;
        // The store root also holds the `{w}x{h}` derivative buckets.
        if save_to_root && parse_size_bucket(&safe_name).is_some() {
            return Err(DepotError::InvalidPath(target_name.to_string()));
        }

        let public_path = if save_to_root {
            self.layout.public_path(&[&safe_name])
        } else {
            let fragment = match &source {
                UploadSource::Memory(data) => self.namer.hash(data),
                UploadSource::TempFile(path) => self.namer.hash_file(path).await?,
            };
            self.layout.public_path(&[&fragment, &safe_name])
        };

        let destination = self.layout.resolve(&public_path)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        match source {
            UploadSource::Memory(data) => write_atomic(&destination, &data).await?,
            UploadSource::TempFile(path) => move_file(&path, &destination).await?,
        }

        debug!(path = %public_path, file = ?destination, "upload stored");
        Ok(public_path)
    }
}

/// Write `data` next to `destination` and rename it into place, so readers
/// never observe a partially written file.
pub(crate) async fn write_atomic(destination: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_path_for(destination);

    let result = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, destination).await
    }
    .await;

    if result.is_err()
        && let Err(e) = fs::remove_file(&temp_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(error = %e, path = ?temp_path, "failed to remove temporary file");
    }
    result
}

/// Move a file, copying when a rename is not possible (e.g. across devices).
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(error = %rename_err, from = ?from, "rename failed, copying instead");
            let data = fs::read(from).await?;
            write_atomic(to, &data).await?;
            if let Err(e) = fs::remove_file(from).await {
                warn!(error = %e, path = ?from, "failed to remove moved upload source");
            }
            Ok(())
        }
    }
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let unique = uuid::Uuid::now_v7().simple().to_string();
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.{unique}.tmp"))
}

/// On-disk filename for `target_name`, or `None` when nothing usable is left.
///
/// Names that are already safe and short enough are used as they are. Any
/// other name gets a tag derived from the full original before its
/// extension (`a b.txt` becomes `a_b-{tag}.txt`), so two distinct target
/// names do not land on the same file.
pub fn stored_filename(target_name: &str) -> Option<String> {
    let safe = sanitize_filename(target_name);
    if safe.is_empty() || safe == "." || safe == ".." {
        return None;
    }
    if safe == target_name && safe.len() <= MAX_FILENAME_LEN {
        return Some(safe);
    }

    let tag = HashNamer::new(NAME_TAG_LEN).hash(target_name.as_bytes());
    let (stem, suffix) = match safe.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!("-{tag}.{ext}")),
        _ => (safe.as_str(), format!("-{tag}")),
    };

    let mut name: String = stem
        .chars()
        .take(MAX_FILENAME_LEN.saturating_sub(suffix.len()))
        .collect();
    name.push_str(&suffix);
    name.truncate(MAX_FILENAME_LEN);
    Some(name)
}

/// Sanitize a filename for safe storage: the last path component, with
/// every character outside `[A-Za-z0-9._-]` replaced by `_`.
fn sanitize_filename(filename: &str) -> String {
    // Only the last component survives, whichever separator the client used.
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    name.chars()
        .filter(|c| *c != '\0')
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
