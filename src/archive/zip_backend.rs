//! ZIP files on disk via the `zip` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Open + list | `ZipArchive::new`, `by_index_raw` |
//! | Read entry | `ZipArchive::by_index` (decompresses, checks CRC) |
//! | Write entry | `ZipWriter::start_file` / `add_directory` |
//! | Finalize | `ZipWriter::finish` + buffered writer flush |
//!
//! Entries are written deflated unless the source entry was stored;
//! modification time and unix permissions are carried over when present.

use super::backend::{ArchiveReader, ArchiveWriter, EntryAttrs, SourceEntry};
use super::error::{ArchiveError, Direction, ErrorCategory};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry sizes come from the archive header; never trust them for more
/// than this much up-front allocation.
const MAX_PREALLOCATE: u64 = 64 * 1024 * 1024;

/// Source archive opened read-only.
pub struct ZipReader {
    archive: ZipArchive<BufReader<File>>,
    names: Vec<String>,
}

impl ZipReader {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)
            .map_err(|e| ArchiveError::OpenSource(ErrorCategory::from_io(&e, Direction::Read)))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ArchiveError::OpenSource(ErrorCategory::from_zip(&e, Direction::Read)))?;

        let names = (0..archive.len())
            .map(|i| archive.by_index_raw(i).map(|f| f.name().to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ArchiveError::OpenSource(ErrorCategory::from_zip(&e, Direction::Read)))?;

        Ok(Self { archive, names })
    }
}

impl ArchiveReader for ZipReader {
    fn entry_names(&self) -> &[String] {
        &self.names
    }

    fn read_entry(&mut self, index: usize) -> Result<SourceEntry, ArchiveError> {
        let name = self.names[index].clone();
        let mut file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                return Err(ArchiveError::ReadEntry {
                    category: ErrorCategory::from_zip(&e, Direction::Read),
                    name,
                });
            }
        };

        let attrs = EntryAttrs {
            stored: file.compression() == CompressionMethod::Stored,
            modified: file.last_modified(),
            unix_mode: file.unix_mode(),
        };
        let is_dir = file.is_dir();

        let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOCATE) as usize);
        if let Err(e) = file.read_to_end(&mut data) {
            return Err(ArchiveError::ReadEntry {
                category: ErrorCategory::from_io(&e, Direction::Read),
                name,
            });
        }

        Ok(SourceEntry {
            name,
            is_dir,
            data,
            attrs,
        })
    }
}

/// Destination archive, created or truncated on open.
pub struct ZipFileWriter {
    writer: ZipWriter<BufWriter<File>>,
}

impl ZipFileWriter {
    pub fn create(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(|e| {
            ArchiveError::CreateDestination(ErrorCategory::from_io(&e, Direction::Write))
        })?;
        Ok(Self {
            writer: ZipWriter::new(BufWriter::new(file)),
        })
    }
}

fn file_options(attrs: &EntryAttrs, len: usize) -> SimpleFileOptions {
    let method = if attrs.stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let mut options = SimpleFileOptions::default()
        .compression_method(method)
        .large_file(len as u64 >= u64::from(u32::MAX));
    if let Some(modified) = attrs.modified {
        options = options.last_modified_time(modified);
    }
    if let Some(mode) = attrs.unix_mode {
        options = options.unix_permissions(mode);
    }
    options
}

impl ArchiveWriter for ZipFileWriter {
    type Output = ();

    fn write_file(
        &mut self,
        name: &str,
        attrs: &EntryAttrs,
        data: &[u8],
    ) -> Result<(), ArchiveError> {
        let write_error = |category| ArchiveError::WriteEntry {
            name: name.to_string(),
            category,
        };
        self.writer
            .start_file(name, file_options(attrs, data.len()))
            .map_err(|e| write_error(ErrorCategory::from_zip(&e, Direction::Write)))?;
        self.writer
            .write_all(data)
            .map_err(|e| write_error(ErrorCategory::from_io(&e, Direction::Write)))
    }

    fn add_directory(&mut self, name: &str, attrs: &EntryAttrs) -> Result<(), ArchiveError> {
        self.writer
            .add_directory(name, file_options(attrs, 0))
            .map_err(|e| ArchiveError::WriteEntry {
                name: name.to_string(),
                category: ErrorCategory::from_zip(&e, Direction::Write),
            })
    }

    fn finish(self) -> Result<(), ArchiveError> {
        let buffered = self
            .writer
            .finish()
            .map_err(|e| ArchiveError::Finalize(ErrorCategory::from_zip(&e, Direction::Write)))?;
        buffered
            .into_inner()
            .map_err(|e| ArchiveError::Finalize(ErrorCategory::from_io(e.error(), Direction::Write)))?;
        Ok(())
    }
}
