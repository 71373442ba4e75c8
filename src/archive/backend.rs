//! Archive reader/writer traits.
//!
//! The transform pipeline only needs four things from a ZIP library: list
//! entry names, read one entry, write one entry, finalize. These traits
//! describe exactly that, so the pipeline runs unchanged against the real
//! [`zip_backend`](super::zip_backend) and against in-memory archives in tests.

use super::error::ArchiveError;

/// Per-entry attributes carried from source to destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryAttrs {
    /// Entry was stored uncompressed.
    pub stored: bool,
    pub modified: Option<zip::DateTime>,
    pub unix_mode: Option<u32>,
}

/// One entry read from a source archive.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub name: String,
    pub is_dir: bool,
    pub data: Vec<u8>,
    pub attrs: EntryAttrs,
}

/// Read side of an archive.
pub trait ArchiveReader {
    /// Entry names in archive index order.
    fn entry_names(&self) -> &[String];

    /// Read the entry at `index` fully into memory.
    fn read_entry(&mut self, index: usize) -> Result<SourceEntry, ArchiveError>;
}

/// Write side of an archive. Single writer, entries appended in call order.
pub trait ArchiveWriter {
    /// What finishing hands back (the closed file, or the written entries).
    type Output;

    fn write_file(
        &mut self,
        name: &str,
        attrs: &EntryAttrs,
        data: &[u8],
    ) -> Result<(), ArchiveError>;

    fn add_directory(&mut self, name: &str, attrs: &EntryAttrs) -> Result<(), ArchiveError>;

    /// Write the central directory and close the archive.
    fn finish(self) -> Result<Self::Output, ArchiveError>;
}
