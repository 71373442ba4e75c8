//! Input discovery: which archives a run should process.
//!
//! The single positional input decides the mode:
//!
//! | Input | Mode | Archives |
//! |---|---|---|
//! | directory | [`InputMode::Directory`] | every `*.zip` directly inside it, by file name |
//! | `*.zip` file | [`InputMode::Single`] | just that file |
//! | any other file | [`InputMode::List`] | one path per line |
//!
//! In directory mode, archives already named like an output of this tool
//! (`Trip-proc.zip` for suffix `proc`) are left out so re-running over the
//! same directory never shrinks its own output.
//!
//! List files ignore blank lines and lines starting with `#`. Relative paths
//! are resolved against the list file's directory.

use crate::naming::is_suffixed;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Single,
    Directory,
    List,
}

/// Archives to process, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub mode: InputMode,
    pub archives: Vec<PathBuf>,
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

pub fn detect_mode(input: &Path) -> Result<InputMode, DiscoverError> {
    if !input.exists() {
        return Err(DiscoverError::NotFound(input.to_path_buf()));
    }
    Ok(if input.is_dir() {
        InputMode::Directory
    } else if has_zip_extension(input) {
        InputMode::Single
    } else {
        InputMode::List
    })
}

/// Resolve `input` into the list of archives to process.
pub fn discover(input: &Path, suffix: &str) -> Result<Discovered, DiscoverError> {
    let mode = detect_mode(input)?;
    let archives = match mode {
        InputMode::Single => vec![input.to_path_buf()],
        InputMode::Directory => scan_directory(input, suffix)?,
        InputMode::List => read_list_file(input)?,
    };
    tracing::debug!(?mode, count = archives.len(), "discovered archives");
    Ok(Discovered { mode, archives })
}

/// Every `*.zip` file directly inside `dir`, excluding earlier outputs.
pub fn scan_directory(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut archives = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_zip_extension(path) {
            continue;
        }
        if is_suffixed(path, suffix) {
            tracing::debug!(path = %path.display(), "skipping already processed archive");
            continue;
        }
        archives.push(entry.into_path());
    }
    Ok(archives)
}

/// Archive paths listed one per line in `list`.
pub fn read_list_file(list: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let content = fs::read_to_string(list)?;
    let base = list.parent().unwrap_or(Path::new(""));
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| base.join(line))
        .collect())
}
