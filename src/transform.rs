//! Archive transformation: one source ZIP in, one shrunk ZIP out.
//!
//! The heart of the tool. For one [`ArchiveJob`]:
//!
//! ```text
//! open source → create destination → classify entries → per-entry loop → finalize
//! ```
//!
//! ## Per-entry rules
//!
//! | Kind | Destination | Stats |
//! |---|---|---|
//! | `Verbatim` | bytes copied unchanged, same name | `entries_copied` |
//! | `Skip` | omitted | `entries_skipped` |
//! | `Image` | decoded, bounded to `max_edge`, re-encoded at `quality` | `images_processed` |
//! | `Image`, decode/encode failed | omitted, or original bytes with `on_decode_failure = "copy"` | `images_failed` |
//! | `Image`, stored data unreadable | omitted | `images_failed` |
//!
//! An image that fails to read, decode or encode is reported as an
//! [`TransformEvent::EntryFailed`] and processing continues. Only failures
//! of the archive itself abort: open, create, reading a non-image entry,
//! write, and finalize. When an
//! archive aborts after the destination was created, the partial destination
//! file is removed.
//!
//! ## Parallel Processing
//!
//! Entries are read sequentially in windows of a few per worker thread,
//! images within a window are decoded/resized/encoded in parallel using
//! [rayon](https://docs.rs/rayon), and results are written back in archive
//! index order by the single destination writer. Output is therefore
//! identical regardless of thread count.

use crate::archive::error::Direction;
use crate::archive::{
    ArchiveError, ArchiveReader, ArchiveStage, ArchiveWriter, ErrorCategory, SourceEntry,
    ZipFileWriter, ZipReader,
};
use crate::classify::{EntryKind, classify};
use crate::config::{DecodeFailurePolicy, GalleryConfig};
use crate::imaging::{CodecError, Dimensions, ImageCodec, Quality, plan_resize};
use crate::naming::destination_path;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Everything needed to process one archive. Immutable for the job's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveJob {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub quality: Quality,
    pub max_edge: u32,
    pub skip_garbage: bool,
    pub on_decode_failure: DecodeFailurePolicy,
}

impl ArchiveJob {
    /// Build a job for `source` from validated config values.
    pub fn from_config(source: &Path, config: &GalleryConfig) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: destination_path(source, &config.archive.suffix),
            quality: Quality::new(config.images.quality),
            max_edge: config.images.max_edge,
            skip_garbage: config.archive.skip_garbage,
            on_decode_failure: config.images.on_decode_failure,
        }
    }
}

/// Counters for one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Source archive size when opened.
    pub original_bytes: u64,
    /// Destination archive size after finalizing.
    pub result_bytes: u64,
    pub images_processed: usize,
    /// Non-image entries copied unchanged (directories included).
    pub entries_copied: usize,
    pub entries_skipped: usize,
    /// Images that failed to decode or encode, whatever the policy did with them.
    pub images_failed: usize,
}

impl TransformStats {
    /// Destination size as a percentage of the source size.
    pub fn ratio_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 100.0;
        }
        self.result_bytes as f64 * 100.0 / self.original_bytes as f64
    }
}

/// Which step of an image entry failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStage {
    /// Stored bytes could not be extracted (CRC mismatch, bad deflate stream).
    Read,
    Decode,
    Encode,
}

/// A recoverable failure of one image entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub stage: EntryStage,
    /// Cause as reported by the codec or the archive, without the stage.
    pub reason: String,
}

impl EntryFailure {
    fn codec(stage: EntryStage, error: CodecError) -> Self {
        Self {
            stage,
            reason: error.detail().to_string(),
        }
    }
}

/// Progress events emitted while processing archives.
///
/// Entry positions are 1-based; `total` counts every entry in the archive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransformEvent {
    ArchiveStarted {
        path: PathBuf,
        size: u64,
    },
    EntryProgress {
        index: usize,
        total: usize,
        name: String,
        source: Dimensions,
        target: Dimensions,
    },
    EntryFailed {
        index: usize,
        total: usize,
        name: String,
        stage: EntryStage,
        reason: String,
        /// Original bytes were written in place of the re-encoded image.
        kept_original: bool,
    },
    ArchiveFinished {
        path: PathBuf,
        output: PathBuf,
        output_size: u64,
        ratio_percent: f64,
        stats: TransformStats,
    },
    ArchiveFailed {
        path: PathBuf,
        stage: ArchiveStage,
        reason: String,
    },
}

pub(crate) fn emit(events: Option<&Sender<TransformEvent>>, event: TransformEvent) {
    if let Some(tx) = events {
        // A gone receiver only means nobody is listening anymore.
        tx.send(event).ok();
    }
}

/// A re-encoded image ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReencodedImage {
    pub data: Vec<u8>,
    pub source: Dimensions,
    pub target: Dimensions,
}

/// Decode, bound to `max_edge`, and re-encode one JPEG.
pub fn reencode_image<C: ImageCodec>(
    codec: &C,
    bytes: &[u8],
    max_edge: u32,
    quality: Quality,
) -> Result<ReencodedImage, EntryFailure> {
    let image = codec
        .decode(bytes)
        .map_err(|error| EntryFailure::codec(EntryStage::Decode, error))?;
    let source = codec.dimensions(&image);
    let plan = plan_resize(source, max_edge);
    let resized = codec.resize(image, plan);
    let data = codec
        .encode(&resized, quality)
        .map_err(|error| EntryFailure::codec(EntryStage::Encode, error))?;
    Ok(ReencodedImage {
        data,
        source,
        target: plan.dimensions(),
    })
}

enum Outcome {
    Verbatim(SourceEntry),
    Reencoded {
        entry: SourceEntry,
        image: ReencodedImage,
    },
    /// `original` is `None` when the entry could not even be read.
    Failed {
        name: String,
        original: Option<SourceEntry>,
        failure: EntryFailure,
    },
}

/// Stream every entry of `reader` into `writer`.
///
/// Returns the entry counters; byte sizes are left at zero for the caller.
/// The writer is not finalized here.
pub fn transform_entries<C, R, W>(
    codec: &C,
    job: &ArchiveJob,
    reader: &mut R,
    writer: &mut W,
    events: Option<&Sender<TransformEvent>>,
) -> Result<TransformStats, ArchiveError>
where
    C: ImageCodec,
    R: ArchiveReader,
    W: ArchiveWriter,
{
    let kinds: Vec<EntryKind> = reader
        .entry_names()
        .iter()
        .map(|name| classify(name, job.skip_garbage))
        .collect();
    let total = kinds.len();
    let window = rayon::current_num_threads().max(1) * 2;
    let mut stats = TransformStats::default();

    let mut start = 0;
    while start < total {
        let end = (start + window).min(total);

        let mut batch = Vec::with_capacity(end - start);
        for (index, kind) in kinds.iter().enumerate().take(end).skip(start) {
            if *kind == EntryKind::Skip {
                tracing::debug!(name = %reader.entry_names()[index], "skipping garbage entry");
                stats.entries_skipped += 1;
                continue;
            }
            let read = match reader.read_entry(index) {
                Ok(entry) => Ok(entry),
                // Unreadable image data costs the entry; anything else costs the archive.
                Err(err) if *kind == EntryKind::Image => Err(unreadable_image(err)),
                Err(err) => return Err(err),
            };
            batch.push((index, *kind, read));
        }

        let outcomes: Vec<(usize, Outcome)> = batch
            .into_par_iter()
            .map(|(index, kind, read)| {
                let outcome = match (kind, read) {
                    (_, Err(outcome)) => outcome,
                    (EntryKind::Image, Ok(entry)) => {
                        match reencode_image(codec, &entry.data, job.max_edge, job.quality) {
                            Ok(image) => Outcome::Reencoded {
                                entry: SourceEntry {
                                    data: Vec::new(),
                                    ..entry
                                },
                                image,
                            },
                            Err(failure) => Outcome::Failed {
                                name: entry.name.clone(),
                                original: Some(entry),
                                failure,
                            },
                        }
                    }
                    (_, Ok(entry)) => Outcome::Verbatim(entry),
                };
                (index, outcome)
            })
            .collect();

        for (index, outcome) in outcomes {
            write_outcome(job, writer, index, total, outcome, &mut stats, events)?;
        }
        start = end;
    }

    Ok(stats)
}

fn unreadable_image(err: ArchiveError) -> Outcome {
    let name = match &err {
        ArchiveError::ReadEntry { name, .. } => name.clone(),
        other => other.to_string(),
    };
    Outcome::Failed {
        name,
        original: None,
        failure: EntryFailure {
            stage: EntryStage::Read,
            reason: err.category().message().to_string(),
        },
    }
}

fn write_outcome<W: ArchiveWriter>(
    job: &ArchiveJob,
    writer: &mut W,
    index: usize,
    total: usize,
    outcome: Outcome,
    stats: &mut TransformStats,
    events: Option<&Sender<TransformEvent>>,
) -> Result<(), ArchiveError> {
    match outcome {
        Outcome::Verbatim(entry) => {
            if entry.is_dir {
                writer.add_directory(&entry.name, &entry.attrs)?;
            } else {
                writer.write_file(&entry.name, &entry.attrs, &entry.data)?;
            }
            stats.entries_copied += 1;
        }
        Outcome::Reencoded { entry, image } => {
            writer.write_file(&entry.name, &entry.attrs, &image.data)?;
            stats.images_processed += 1;
            emit(
                events,
                TransformEvent::EntryProgress {
                    index: index + 1,
                    total,
                    name: entry.name,
                    source: image.source,
                    target: image.target,
                },
            );
        }
        Outcome::Failed {
            name,
            original,
            failure,
        } => {
            let keep = job.on_decode_failure == DecodeFailurePolicy::KeepOriginal;
            let kept_original = match original {
                Some(entry) if keep => {
                    writer.write_file(&entry.name, &entry.attrs, &entry.data)?;
                    true
                }
                _ => false,
            };
            tracing::warn!(
                name = %name,
                stage = ?failure.stage,
                reason = %failure.reason,
                kept_original,
                "image entry failed"
            );
            stats.images_failed += 1;
            emit(
                events,
                TransformEvent::EntryFailed {
                    index: index + 1,
                    total,
                    name,
                    stage: failure.stage,
                    reason: failure.reason,
                    kept_original,
                },
            );
        }
    }
    Ok(())
}

/// Process one archive on disk.
///
/// Sizes come from the filesystem: `original_bytes` when the source is
/// opened, `result_bytes` once the destination is finalized. On any failure
/// after the destination was created, it is removed again.
pub fn transform_archive<C: ImageCodec>(
    codec: &C,
    job: &ArchiveJob,
    events: Option<&Sender<TransformEvent>>,
) -> Result<TransformStats, ArchiveError> {
    let mut reader = ZipReader::open(&job.source_path)?;
    let original_bytes = fs::metadata(&job.source_path)
        .map_err(|e| ArchiveError::OpenSource(ErrorCategory::from_io(&e, Direction::Read)))?
        .len();
    tracing::info!(
        path = %job.source_path.display(),
        entries = reader.entry_names().len(),
        "processing archive"
    );
    emit(
        events,
        TransformEvent::ArchiveStarted {
            path: job.source_path.clone(),
            size: original_bytes,
        },
    );

    let mut writer = ZipFileWriter::create(&job.destination_path)?;

    let result = transform_entries(codec, job, &mut reader, &mut writer, events)
        .and_then(|stats| writer.finish().map(|()| stats))
        .and_then(|stats| {
            let result_bytes = fs::metadata(&job.destination_path)
                .map_err(|e| ArchiveError::Finalize(ErrorCategory::from_io(&e, Direction::Read)))?
                .len();
            Ok(TransformStats {
                original_bytes,
                result_bytes,
                ..stats
            })
        });
    drop(reader);

    match result {
        Ok(stats) => {
            emit(
                events,
                TransformEvent::ArchiveFinished {
                    path: job.source_path.clone(),
                    output: job.destination_path.clone(),
                    output_size: stats.result_bytes,
                    ratio_percent: stats.ratio_percent(),
                    stats,
                },
            );
            Ok(stats)
        }
        Err(err) => {
            if let Err(e) = fs::remove_file(&job.destination_path) {
                tracing::warn!(
                    path = %job.destination_path.display(),
                    error = %e,
                    "could not remove partial destination"
                );
            }
            Err(err)
        }
    }
}
