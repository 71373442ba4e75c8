//! Archive-level failures and their human-readable categories.
//!
//! Whatever the ZIP codec or the OS reports is reduced to one
//! [`ErrorCategory`], and each category has exactly one message in
//! [`CATEGORY_MESSAGES`]. Users see the message; the raw cause is logged at
//! debug level where the mapping happens.

use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NotAZip,
    Unsupported,
    Crc,
    NoSuchFile,
    PermissionDenied,
    DiskFull,
    InvalidPath,
    Read,
    Write,
    Unknown,
}

/// The fixed category → message table.
pub const CATEGORY_MESSAGES: &[(ErrorCategory, &str)] = &[
    (ErrorCategory::NotAZip, "not a zip archive"),
    (
        ErrorCategory::Unsupported,
        "unsupported archive (multi-disk or encrypted)",
    ),
    (ErrorCategory::Crc, "CRC error"),
    (ErrorCategory::NoSuchFile, "no such file"),
    (ErrorCategory::PermissionDenied, "permission denied"),
    (ErrorCategory::DiskFull, "no space left on device"),
    (ErrorCategory::InvalidPath, "invalid path"),
    (ErrorCategory::Read, "read error"),
    (ErrorCategory::Write, "write error"),
    (ErrorCategory::Unknown, "unknown error"),
];

/// Which way the failing I/O was going, for errors with no better category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl ErrorCategory {
    pub fn message(self) -> &'static str {
        CATEGORY_MESSAGES
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, message)| *message)
            .unwrap_or("unknown error")
    }

    pub fn from_io(err: &io::Error, direction: Direction) -> Self {
        tracing::debug!(error = %err, kind = ?err.kind(), "mapping io error");
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoSuchFile,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::StorageFull => Self::DiskFull,
            io::ErrorKind::InvalidInput | io::ErrorKind::IsADirectory => Self::InvalidPath,
            // zip surfaces checksum mismatches as io errors while streaming an entry
            _ if err.to_string().contains("checksum") => Self::Crc,
            _ => match direction {
                Direction::Read => Self::Read,
                Direction::Write => Self::Write,
            },
        }
    }

    pub fn from_zip(err: &ZipError, direction: Direction) -> Self {
        match err {
            ZipError::Io(io_err) => Self::from_io(io_err, direction),
            ZipError::InvalidArchive(_) => {
                tracing::debug!(error = %err, "mapping zip error");
                Self::NotAZip
            }
            ZipError::UnsupportedArchive(_) => {
                tracing::debug!(error = %err, "mapping zip error");
                Self::Unsupported
            }
            ZipError::FileNotFound => Self::NoSuchFile,
            other => {
                tracing::debug!(error = %other, "unmapped zip error");
                Self::Unknown
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Where in the archive lifecycle a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStage {
    OpenSource,
    CreateDestination,
    ReadEntry,
    WriteEntry,
    Finalize,
}

impl fmt::Display for ArchiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenSource => "open source",
            Self::CreateDestination => "create destination",
            Self::ReadEntry => "read entry",
            Self::WriteEntry => "write entry",
            Self::Finalize => "finalize destination",
        })
    }
}

/// A failure that ends processing of one archive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("cannot open source archive: {0}")]
    OpenSource(ErrorCategory),
    #[error("cannot create destination archive: {0}")]
    CreateDestination(ErrorCategory),
    #[error("cannot read entry {name}: {category}")]
    ReadEntry {
        name: String,
        category: ErrorCategory,
    },
    #[error("cannot write entry {name}: {category}")]
    WriteEntry {
        name: String,
        category: ErrorCategory,
    },
    #[error("cannot finalize destination archive: {0}")]
    Finalize(ErrorCategory),
}

impl ArchiveError {
    pub fn stage(&self) -> ArchiveStage {
        match self {
            Self::OpenSource(_) => ArchiveStage::OpenSource,
            Self::CreateDestination(_) => ArchiveStage::CreateDestination,
            Self::ReadEntry { .. } => ArchiveStage::ReadEntry,
            Self::WriteEntry { .. } => ArchiveStage::WriteEntry,
            Self::Finalize(_) => ArchiveStage::Finalize,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OpenSource(c) | Self::CreateDestination(c) | Self::Finalize(c) => *c,
            Self::ReadEntry { category, .. } | Self::WriteEntry { category, .. } => *category,
        }
    }
}
