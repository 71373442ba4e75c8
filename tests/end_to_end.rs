//! End-to-end runs over real ZIP archives with real JPEGs.
//!
//! Archives are built with the `zip` and `image` crates in a temp directory,
//! then shrunk through the public library API or the compiled binary.
//!
//! Run with: cargo test --test end_to_end

use gallery_shrink::config::GalleryConfig;
use gallery_shrink::discover::discover;
use gallery_shrink::imaging::RustCodec;
use gallery_shrink::transform::TransformEvent;
use gallery_shrink::{batch, config};
use image::{ImageEncoder, RgbImage};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::process::Command;
use std::sync::mpsc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, SimpleFileOptions::default())
                .unwrap();
            continue;
        }
        let method = if name.ends_with(".bin") {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        zip.start_file(*name, SimpleFileOptions::default().compression_method(method))
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn entries(path: &Path) -> Vec<(String, Vec<u8>, CompressionMethod)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data, file.compression())
        })
        .collect()
}

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gallery-shrink"))
}

// =========================================================================
// Library API
// =========================================================================

#[test]
fn gallery_is_resized_and_other_entries_copied() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Trip.zip");
    let notes = b"Day one: arrived late.\n".to_vec();
    let raw: Vec<u8> = (0..=255).collect();
    build_zip(
        &source,
        &[
            ("Trip/", b""),
            ("Trip/001.jpg", &jpeg(2000, 1500)),
            ("Trip/002.jpeg", &jpeg(600, 900)),
            ("Trip/notes.txt", &notes),
            ("Trip/sensor.bin", &raw),
        ],
    );

    let mut config = GalleryConfig::default();
    config.images.max_edge = 1000;
    let (tx, rx) = mpsc::channel();
    let summary = batch::run_batch(&RustCodec::new(), &[source.clone()], &config, Some(&tx));
    drop(tx);

    assert!(summary.is_success());
    let stats = summary.processed[0].stats;
    assert_eq!(stats.images_processed, 2);
    assert_eq!(stats.entries_copied, 3);
    assert!(stats.result_bytes < stats.original_bytes);

    let out = entries(&tmp.path().join("Trip-proc.zip"));
    let names: Vec<&str> = out.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(
        names,
        [
            "Trip/",
            "Trip/001.jpg",
            "Trip/002.jpeg",
            "Trip/notes.txt",
            "Trip/sensor.bin"
        ]
    );
    assert_eq!(dimensions(&out[1].1), (1000, 750));
    assert_eq!(dimensions(&out[2].1), (600, 900));
    assert_eq!(out[3].1, notes);
    assert_eq!(out[4].1, raw);
    assert_eq!(out[4].2, CompressionMethod::Stored);

    let progress = rx
        .into_iter()
        .filter(|e| matches!(e, TransformEvent::EntryProgress { .. }))
        .count();
    assert_eq!(progress, 2);
}

#[test]
fn source_archive_is_untouched() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Keep.zip");
    build_zip(&source, &[("a.jpg", &jpeg(1600, 1600))]);
    let before = std::fs::read(&source).unwrap();

    let summary = batch::run_batch(
        &RustCodec::new(),
        &[source.clone()],
        &GalleryConfig::default(),
        None,
    );

    assert!(summary.is_success());
    assert_eq!(std::fs::read(&source).unwrap(), before);
    let out = entries(&tmp.path().join("Keep-proc.zip"));
    assert_eq!(dimensions(&out[0].1), (1200, 1200));
}

#[test]
fn garbage_entries_skipped_when_requested() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Mac.zip");
    build_zip(
        &source,
        &[
            ("__MACOSX/", b""),
            ("__MACOSX/._a.jpg", b"resource fork"),
            ("a.jpg", &jpeg(100, 100)),
            (".DS_Store", b"finder"),
        ],
    );

    let overlay: toml::Value = toml::from_str("[archive]\nskip_garbage = true\n").unwrap();
    let config = config::resolve_config([overlay]).unwrap();
    let summary = batch::run_batch(&RustCodec::new(), &[source], &config, None);

    assert_eq!(summary.processed[0].stats.entries_skipped, 3);
    let out = entries(&tmp.path().join("Mac-proc.zip"));
    let names: Vec<&str> = out.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, ["a.jpg"]);
}

#[test]
fn directory_run_skips_previous_outputs() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.zip", "b.zip", "a-proc.zip"] {
        build_zip(&tmp.path().join(name), &[("x.txt", b"x")]);
    }

    let config = GalleryConfig::default();
    let found = discover(tmp.path(), &config.archive.suffix).unwrap();
    assert_eq!(found.archives.len(), 2);

    let summary = batch::run_batch(&RustCodec::new(), &found.archives, &config, None);
    assert_eq!(summary.processed.len(), 2);
    assert!(tmp.path().join("b-proc.zip").exists());
    assert!(!tmp.path().join("a-proc-proc.zip").exists());
}

// =========================================================================
// Binary
// =========================================================================

#[test]
fn cli_shrinks_single_archive() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Trip.zip");
    build_zip(&source, &[("001.jpg", &jpeg(800, 400))]);

    let out = binary()
        .arg(&source)
        .args(["--max-edge", "200", "--suffix", "small"])
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("800x400 → 200x100"), "{stdout}");
    assert!(stdout.contains("Processed 1 archive"), "{stdout}");
    let result = entries(&tmp.path().join("Trip-small.zip"));
    assert_eq!(dimensions(&result[0].1), (200, 100));
}

#[test]
fn cli_json_events_and_failure_exit_code() {
    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("archives.txt");
    build_zip(&tmp.path().join("good.zip"), &[("n.txt", b"n")]);
    std::fs::write(&list, "good.zip\nmissing.zip\n").unwrap();

    let out = binary().arg(&list).arg("--json").output().unwrap();

    assert!(!out.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = lines.iter().map(|l| l["event"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        ["archive_started", "archive_finished", "archive_failed", "summary"]
    );
    assert_eq!(lines[2]["stage"], "open_source");
    assert_eq!(lines[2]["reason"], "no such file");
}

#[test]
fn cli_rejects_invalid_quality() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("a.zip");
    build_zip(&source, &[("n.txt", b"n")]);

    let out = binary()
        .arg(&source)
        .args(["--quality", "0"])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(!tmp.path().join("a-proc.zip").exists());
}

#[test]
fn cli_gen_config_is_loadable() {
    let tmp = TempDir::new().unwrap();
    let out = binary().arg("gen-config").output().unwrap();
    assert!(out.status.success());

    let path = tmp.path().join("gallery-shrink.toml");
    std::fs::write(&path, &out.stdout).unwrap();
    let loaded = config::load_config(&path, true).unwrap();
    assert_eq!(loaded, GalleryConfig::default());
}
