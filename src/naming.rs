//! Output naming for processed archives.
//!
//! A processed archive sits next to its source with the suffix appended to
//! the stem, keeping the original extension:
//!
//! - `Trip.zip` + `proc` → `Trip-proc.zip`
//! - `photos/2019.Summer.ZIP` + `proc` → `photos/2019.Summer-proc.ZIP`
//! - `README` + `proc` → `README-proc`
//!
//! The same convention is used in reverse by discovery to recognize archives
//! that are already outputs of an earlier run.

use std::path::{Path, PathBuf};

/// Derive the destination path for `source`.
pub fn destination_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    source.with_file_name(file_name)
}

/// True when the file stem already ends with `-<suffix>`.
///
/// Comparison is exact on the suffix so `Trip-process.zip` is not mistaken
/// for an output of suffix `proc`.
pub fn is_suffixed(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.strip_suffix(suffix))
        .is_some_and(|rest| rest.ends_with('-'))
}
