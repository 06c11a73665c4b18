//! Depot test utilities.
//!
//! Fixture builders for image and upload tests: encoded images of a known
//! size and helpers for laying files out in a scratch directory.
#![allow(clippy::expect_used)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

/// Encode a `width` x `height` gradient as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// Encode a `width` x `height` gradient as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Plain text that no image decoder accepts.
pub fn text_bytes() -> Vec<u8> {
    b"just some notes, not an image\n".to_vec()
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .expect("encoding an in-memory fixture image");
    out.into_inner()
}

/// Write `data` to `dir/name`, creating parent directories.
pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("creating fixture directory");
    }
    std::fs::write(&path, data).expect("writing fixture file");
    path
}

/// Create a scratch directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("creating scratch directory")
}

/// Count regular files under `dir`, recursively.
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_decode_at_requested_size() {
        let png = image::load_from_memory(&png_bytes(7, 5)).expect("png decodes");
        assert_eq!((png.width(), png.height()), (7, 5));

        let jpeg = image::load_from_memory(&jpeg_bytes(16, 9)).expect("jpeg decodes");
        assert_eq!((jpeg.width(), jpeg.height()), (16, 9));
    }

    #[test]
    fn text_is_not_an_image() {
        assert!(image::load_from_memory(&text_bytes()).is_err());
    }

    #[test]
    fn counts_nested_files() {
        let dir = scratch_dir();
        write_fixture(dir.path(), "a.txt", b"a");
        write_fixture(dir.path(), "nested/b.txt", b"b");
        assert_eq!(count_files(dir.path()), 2);
        assert_eq!(count_files(&dir.path().join("missing")), 0);
    }
}
