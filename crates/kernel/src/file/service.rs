//! File management service.
//!
//! Validates uploads, stores them in the content-hash layout, and records
//! them through the repository.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::mime::TypeValidator;
use super::repository::FileRepository;
use super::storage::LocalFileStorage;
use super::upload::UploadedFile;
use crate::error::{DepotError, DepotResult};
use crate::models::File;

/// File service for managing uploads.
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    storage: LocalFileStorage,
    validator: TypeValidator,
    max_file_size: u64,
}

impl FileService {
    /// Create a new file service.
    pub fn new(
        repository: Arc<dyn FileRepository>,
        storage: LocalFileStorage,
        validator: TypeValidator,
        max_file_size: u64,
    ) -> Self {
        Self {
            repository,
            storage,
            validator,
            max_file_size,
        }
    }

    /// Store the first file of a multi-file upload.
    pub async fn save_uploaded_files<I>(&self, files: I) -> DepotResult<File>
    where
        I: IntoIterator<Item = UploadedFile>,
    {
        let file = files.into_iter().next().ok_or(DepotError::EmptyUpload)?;
        self.save_uploaded_file(file).await
    }

    /// Store an upload under its client-side name and record it.
    pub async fn save_uploaded_file(&self, file: UploadedFile) -> DepotResult<File> {
        let name = file.client_name().to_string();
        self.store(file, &name, false).await
    }

    /// Store an upload as `target_name` and record it.
    ///
    /// The record keeps `target_name` as given; only the on-disk name is
    /// sanitized. The record is only created once the bytes are in place.
    pub async fn store(
        &self,
        file: UploadedFile,
        target_name: &str,
        save_to_root: bool,
    ) -> DepotResult<File> {
        let path = self
            .store_uploaded_file(file, target_name, save_to_root)
            .await?;
        let record = self.repository.create(target_name, &path).await?;
        debug!(id = %record.id, name = %record.name, path = %record.path, "file recorded");
        Ok(record)
    }

    /// Store an upload without creating a record, returning its public path.
    ///
    /// Rejects the client-declared type when it is not allowed; nothing is
    /// written in that case.
    pub async fn store_uploaded_file(
        &self,
        file: UploadedFile,
        target_name: &str,
        save_to_root: bool,
    ) -> DepotResult<String> {
        self.validator.validate(file.client_mime_type(), None)?;

        let size = file.len().await?;
        if size > self.max_file_size {
            return Err(DepotError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        self.storage
            .write(file.into_source(), target_name, save_to_root)
            .await
    }

    /// Fetch a file record by id.
    pub async fn file_by_id(&self, id: Uuid) -> DepotResult<File> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(DepotError::NotFound(id))
    }

    /// Check the sniffed type of an upload against `allow_list`, or the
    /// configured default when it is `None` or empty.
    pub async fn check_file_mime_type(
        &self,
        file: &UploadedFile,
        allow_list: Option<&[String]>,
    ) -> DepotResult<()> {
        let sniffed = file.sniff_mime_type().await?;
        self.validator.validate(sniffed, allow_list)
    }

    /// Get the storage backend.
    pub fn storage(&self) -> &LocalFileStorage {
        &self.storage
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("storage", &self.storage)
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}
