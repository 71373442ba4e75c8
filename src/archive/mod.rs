//! ZIP archive access.
//!
//! - **Backend**: [`ArchiveReader`] / [`ArchiveWriter`] traits
//! - **Zip backend**: [`ZipReader`] / [`ZipFileWriter`] over files on disk
//! - **Errors**: [`ArchiveError`] and the fixed [`ErrorCategory`] message table

pub mod backend;
pub mod error;
pub mod zip_backend;

pub use backend::{ArchiveReader, ArchiveWriter, EntryAttrs, SourceEntry};
pub use error::{ArchiveError, ArchiveStage, ErrorCategory};
pub use zip_backend::{ZipFileWriter, ZipReader};
