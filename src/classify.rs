//! Entry classification: what happens to each file inside an archive.
//!
//! Every entry name maps to exactly one [`EntryKind`]:
//!
//! | Kind | Rule |
//! |---|---|
//! | `Skip` | `skip_garbage` is on and the entry is archive-tool metadata |
//! | `Image` | extension is a JPEG extension (case-insensitive) |
//! | `Verbatim` | everything else, including directory entries |
//!
//! Garbage means a path component starting with `__` (macOS `__MACOSX/`
//! resource forks) or OS thumbnail caches (`.DS_Store`, `Thumbs.db`).

/// Extensions decoded and re-encoded as JPEG.
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "jfif"];

const RESERVED_PREFIX: &str = "__";
const GARBAGE_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Verbatim,
    Skip,
}

/// Classify an archive entry by name.
pub fn classify(name: &str, skip_garbage: bool) -> EntryKind {
    if skip_garbage && is_garbage(name) {
        return EntryKind::Skip;
    }
    if is_jpeg_name(name) {
        EntryKind::Image
    } else {
        EntryKind::Verbatim
    }
}

fn is_garbage(name: &str) -> bool {
    name.split('/')
        .filter(|c| !c.is_empty())
        .any(|c| c.starts_with(RESERVED_PREFIX) || GARBAGE_FILES.contains(&c))
}

/// True for file (not directory) names with a JPEG extension.
pub fn is_jpeg_name(name: &str) -> bool {
    if name.ends_with('/') {
        return false;
    }
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => JPEG_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        _ => false,
    }
}
