//! Uploaded file handles.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncReadExt;

use super::mime::{UNKNOWN_MIME_TYPE, sniff};

/// Bytes of an upload, either buffered or spooled to a temporary file.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Memory(Vec<u8>),
    /// A temporary file owned by the upload; storing it moves the file.
    TempFile(PathBuf),
}

/// A file received from a client, with the name and type the client reported.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    client_name: String,
    client_mime_type: String,
    source: UploadSource,
}

impl UploadedFile {
    pub fn from_bytes(
        client_name: impl Into<String>,
        client_mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            client_mime_type: client_mime_type.into(),
            source: UploadSource::Memory(data),
        }
    }

    pub fn from_temp_file(
        client_name: impl Into<String>,
        client_mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            client_mime_type: client_mime_type.into(),
            source: UploadSource::TempFile(path.into()),
        }
    }

    /// Original filename as sent by the client.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// MIME type as declared by the transport.
    pub fn client_mime_type(&self) -> &str {
        &self.client_mime_type
    }

    pub fn source(&self) -> &UploadSource {
        &self.source
    }

    pub(crate) fn into_source(self) -> UploadSource {
        self.source
    }

    /// Size of the upload in bytes.
    pub async fn len(&self) -> std::io::Result<u64> {
        match &self.source {
            UploadSource::Memory(data) => Ok(data.len() as u64),
            UploadSource::TempFile(path) => Ok(fs::metadata(path).await?.len()),
        }
    }

    pub async fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// MIME type detected from the content's leading bytes.
    pub async fn sniff_mime_type(&self) -> std::io::Result<&'static str> {
        match &self.source {
            UploadSource::Memory(data) => Ok(sniff(data)),
            UploadSource::TempFile(path) => sniff_file(path).await,
        }
    }
}

async fn sniff_file(path: &Path) -> std::io::Result<&'static str> {
    // Signatures all sit within the first few KB.
    let mut head = Vec::with_capacity(8192);
    fs::File::open(path)
        .await?
        .take(8192)
        .read_to_end(&mut head)
        .await?;
    if head.is_empty() {
        return Ok(UNKNOWN_MIME_TYPE);
    }
    Ok(sniff(&head))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_upload_reports_length_and_type() {
        let png = depot_test_utils::png_bytes(4, 4);
        let upload = UploadedFile::from_bytes("a.png", "image/png", png.clone());
        assert_eq!(upload.len().await.unwrap(), png.len() as u64);
        assert_eq!(upload.sniff_mime_type().await.unwrap(), "image/png");
    }

    #[tokio::test]
    async fn temp_file_upload_sniffs_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.tmp");
        std::fs::write(&path, depot_test_utils::jpeg_bytes(4, 4)).unwrap();

        let upload = UploadedFile::from_temp_file("a.jpg", "image/jpeg", &path);
        assert_eq!(upload.sniff_mime_type().await.unwrap(), "image/jpeg");
        assert!(!upload.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn empty_temp_file_is_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tmp");
        std::fs::write(&path, b"").unwrap();

        let upload = UploadedFile::from_temp_file("empty", "text/plain", &path);
        assert_eq!(upload.sniff_mime_type().await.unwrap(), UNKNOWN_MIME_TYPE);
    }
}
