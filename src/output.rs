//! CLI output formatting for progress events and the end-of-run summary.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! Trip.zip (48.2 MB)
//!     001/120 photos/001.jpg 4000x3000 → 1200x900
//!     002/120 photos/002.jpg decode failed: invalid JPEG marker (dropped)
//! Trip.zip → Trip-proc.zip 6.1 MB (12.7%)
//! Broken.zip failed to open source: not a zip archive
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processed 2 archives, 1 failed
//!     Images: 238 re-encoded, 1 failed
//!     Entries: 4 copied, 2 skipped
//!     Size: 96.4 MB → 12.3 MB (12.8%)
//! Failed
//!     Broken.zip: cannot open source archive: not a zip archive
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability; the
//! `print_*` wrappers write to stdout. Format functions are pure.

use crate::batch::BatchSummary;
use crate::transform::{EntryStage, TransformEvent};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Zero-padded `index/total`, padded to at least three digits.
fn format_position(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{index:0>width$}/{total:0>width$}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte size using binary units.
///
/// ```text
/// 512 B
/// 1.5 KB
/// 48.2 MB
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Format a single progress event as display lines.
pub fn format_event(event: &TransformEvent) -> Vec<String> {
    match event {
        TransformEvent::ArchiveStarted { path, size } => {
            vec![format!("{} ({})", file_name(path), format_bytes(*size))]
        }
        TransformEvent::EntryProgress {
            index,
            total,
            name,
            source,
            target,
        } => {
            let sizes = if source == target {
                format!("{source} (kept size)")
            } else {
                format!("{source} → {target}")
            };
            vec![format!(
                "{}{} {} {}",
                indent(1),
                format_position(*index, *total),
                name,
                sizes
            )]
        }
        TransformEvent::EntryFailed {
            index,
            total,
            name,
            stage,
            reason,
            kept_original,
        } => {
            let stage = match stage {
                EntryStage::Read => "read",
                EntryStage::Decode => "decode",
                EntryStage::Encode => "encode",
            };
            let action = if *kept_original {
                "kept original"
            } else {
                "dropped"
            };
            vec![format!(
                "{}{} {} {} failed: {} ({})",
                indent(1),
                format_position(*index, *total),
                name,
                stage,
                reason,
                action
            )]
        }
        TransformEvent::ArchiveFinished {
            path,
            output,
            output_size,
            ratio_percent,
            ..
        } => vec![format!(
            "{} → {} {} ({:.1}%)",
            file_name(path),
            file_name(output),
            format_bytes(*output_size),
            ratio_percent
        )],
        TransformEvent::ArchiveFailed {
            path,
            stage,
            reason,
        } => vec![format!(
            "{} failed to {}: {}",
            file_name(path),
            stage,
            reason
        )],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let processed = summary.processed.len();
    let plural = if processed == 1 { "" } else { "s" };
    if summary.failed.is_empty() {
        lines.push(format!("Processed {processed} archive{plural}"));
    } else {
        lines.push(format!(
            "Processed {processed} archive{plural}, {} failed",
            summary.failed.len()
        ));
    }

    if processed > 0 {
        let totals = summary.totals();
        lines.push(format!(
            "{}Images: {} re-encoded, {} failed",
            indent(1),
            totals.images_processed,
            totals.images_failed
        ));
        lines.push(format!(
            "{}Entries: {} copied, {} skipped",
            indent(1),
            totals.entries_copied,
            totals.entries_skipped
        ));
        lines.push(format!(
            "{}Size: {} → {} ({:.1}%)",
            indent(1),
            format_bytes(totals.original_bytes),
            format_bytes(totals.result_bytes),
            totals.ratio_percent()
        ));
    }

    if !summary.failed.is_empty() {
        lines.push("Failed".to_string());
        for failure in &summary.failed {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                file_name(&failure.source),
                failure.error
            ));
        }
    }
    lines
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
