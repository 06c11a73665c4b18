//! Short content-hash fragments used as directory names.
//!
//! The store fans files out into directories named after a truncated
//! SHA-256 digest. Three hex characters give 4096 buckets; widen the prefix
//! for high-volume stores, since two sources landing in the same bucket at
//! the same dimensions share a cache slot when their names also match.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Default number of hex characters kept from a digest.
pub const DEFAULT_HASH_PREFIX_LEN: usize = 3;

/// Hex characters in a full SHA-256 digest.
pub const MAX_HASH_PREFIX_LEN: usize = 64;

/// Derives deterministic directory-name fragments from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashNamer {
    prefix_len: usize,
}

impl HashNamer {
    /// Create a namer keeping `prefix_len` hex characters, clamped to `1..=64`.
    pub fn new(prefix_len: usize) -> Self {
        Self {
            prefix_len: prefix_len.clamp(1, MAX_HASH_PREFIX_LEN),
        }
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Hash a byte slice (file content or a path string).
    pub fn hash(&self, data: &[u8]) -> String {
        self.truncate(Sha256::digest(data).into())
    }

    /// Hash a file's content without loading it into memory at once.
    pub async fn hash_file(&self, path: &Path) -> std::io::Result<String> {
        let mut file = fs::File::open(path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(self.truncate(hasher.finalize().into()))
    }

    fn truncate(&self, digest: [u8; 32]) -> String {
        let mut hex = hex::encode(digest);
        hex.truncate(self.prefix_len);
        hex
    }
}

impl Default for HashNamer {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_PREFIX_LEN)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn default_fragment_is_three_hex_chars() {
        let fragment = HashNamer::default().hash(b"hello world");
        assert_eq!(fragment.len(), 3);
        assert!(fragment.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic() {
        let namer = HashNamer::default();
        assert_eq!(namer.hash(b"same bytes"), namer.hash(b"same bytes"));
    }

    #[test]
    fn fragment_is_prefix_of_sha256() {
        // sha256("abc") = ba7816bf...
        assert_eq!(HashNamer::new(8).hash(b"abc"), "ba7816bf");
        assert_eq!(HashNamer::default().hash(b"abc"), "ba7");
    }

    #[test]
    fn prefix_len_is_clamped() {
        assert_eq!(HashNamer::new(0).prefix_len(), 1);
        assert_eq!(HashNamer::new(500).prefix_len(), 64);
        assert_eq!(HashNamer::new(500).hash(b"abc").len(), 64);
    }

    #[tokio::test]
    async fn file_hash_matches_slice_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let namer = HashNamer::new(16);
        assert_eq!(namer.hash_file(&path).await.unwrap(), namer.hash(&data));
    }
}
