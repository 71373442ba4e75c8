//! Batch runs: many archives, one at a time.
//!
//! Archive-level failures never stop the batch. Each one is reported as a
//! [`TransformEvent::ArchiveFailed`], recorded in the [`BatchSummary`], and
//! the next archive starts. Whether the overall run counts as a failure is
//! left to the caller via [`BatchSummary::is_success`].

use crate::archive::ArchiveError;
use crate::config::GalleryConfig;
use crate::imaging::ImageCodec;
use crate::transform::{ArchiveJob, TransformEvent, TransformStats, emit, transform_archive};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedArchive {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub stats: TransformStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedArchive {
    pub source: PathBuf,
    pub error: ArchiveError,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: Vec<ProcessedArchive>,
    pub failed: Vec<FailedArchive>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Entry counters summed over every completed archive.
    pub fn totals(&self) -> TransformStats {
        self.processed
            .iter()
            .fold(TransformStats::default(), |acc, p| TransformStats {
                original_bytes: acc.original_bytes + p.stats.original_bytes,
                result_bytes: acc.result_bytes + p.stats.result_bytes,
                images_processed: acc.images_processed + p.stats.images_processed,
                entries_copied: acc.entries_copied + p.stats.entries_copied,
                entries_skipped: acc.entries_skipped + p.stats.entries_skipped,
                images_failed: acc.images_failed + p.stats.images_failed,
            })
    }
}

/// Transform every archive in `archives` in order.
pub fn run_batch<C: ImageCodec>(
    codec: &C,
    archives: &[PathBuf],
    config: &GalleryConfig,
    events: Option<&Sender<TransformEvent>>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for source in archives {
        let job = ArchiveJob::from_config(source, config);
        match transform_archive(codec, &job, events) {
            Ok(stats) => summary.processed.push(ProcessedArchive {
                source: job.source_path,
                destination: job.destination_path,
                stats,
            }),
            Err(error) => {
                report_failure(source, &error, events);
                summary.failed.push(FailedArchive {
                    source: source.clone(),
                    error,
                });
            }
        }
    }
    summary
}

fn report_failure(source: &Path, error: &ArchiveError, events: Option<&Sender<TransformEvent>>) {
    tracing::warn!(path = %source.display(), stage = %error.stage(), "{error}");
    emit(
        events,
        TransformEvent::ArchiveFailed {
            path: source.to_path_buf(),
            stage: error.stage(),
            reason: error.category().message().to_string(),
        },
    );
}
