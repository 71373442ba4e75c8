//! Shared test utilities for the gallery-shrink test suite.
//!
//! Builds real JPEG bytes and real ZIP files on disk so codec and archive
//! tests can exercise the production backends end to end.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("Trip.zip");
//! write_zip(&path, &[("photos/", b""), ("photos/001.jpg", &encode_test_jpeg(800, 600))]);
//!
//! let entries = read_zip(&path);
//! assert_eq!(entries[0].0, "photos/");
//! ```

use image::{ImageEncoder, RgbImage};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// =========================================================================
// Images
// =========================================================================

/// Encode a synthetic gradient as baseline JPEG.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Decode JPEG bytes and return `(width, height)`.
pub fn jpeg_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg).unwrap();
    (img.width(), img.height())
}

// =========================================================================
// Archives
// =========================================================================

/// Write a deflated ZIP at `path`. Names ending in `/` become directory entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    write_zip_with(path, entries, SimpleFileOptions::default());
}

/// Like [`write_zip`], but every entry is stored uncompressed, so entry
/// bytes appear verbatim in the file.
pub fn write_stored_zip(path: &Path, entries: &[(&str, &[u8])]) {
    write_zip_with(
        path,
        entries,
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
    );
}

/// Flip one byte in the middle of `needle`'s first occurrence in the file.
pub fn corrupt_bytes_in_file(path: &Path, needle: &[u8]) {
    let mut bytes = std::fs::read(path).unwrap();
    let start = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap();
    bytes[start + needle.len() / 2] ^= 0xFF;
    std::fs::write(path, bytes).unwrap();
}

fn write_zip_with(path: &Path, entries: &[(&str, &[u8])], options: SimpleFileOptions) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Every entry of the ZIP at `path` as `(name, bytes)`, in archive order.
pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}
