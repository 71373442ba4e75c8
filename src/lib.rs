//! # Gallery Shrink
//!
//! Batch-shrinks photo galleries stored as ZIP archives. Every JPEG entry is
//! bounded to a maximum edge and re-encoded at a chosen quality; every other
//! entry is copied byte for byte. Each `Trip.zip` produces a sibling
//! `Trip-proc.zip`; sources are never modified.
//!
//! # Pipeline
//!
//! ```text
//! input ──discover──▶ [a.zip, b.zip, …] ──run_batch──▶ transform_archive (one at a time)
//!                                                        │
//!                                   classify each entry ─┤
//!                                   Image:    decode → plan_resize → resize → encode
//!                                   Verbatim: copy bytes
//!                                   Skip:     omit
//! ```
//!
//! Progress is reported as [`transform::TransformEvent`] values over an
//! `mpsc` channel; the binary prints them as text or JSON lines.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Input modes (single archive, directory, list file) → archive paths |
//! | [`batch`] | Runs archives sequentially, collects the [`batch::BatchSummary`] |
//! | [`transform`] | One archive: entry loop, parallel re-encoding, ordered writes |
//! | [`classify`] | Entry name → `Image` / `Verbatim` / `Skip` |
//! | [`imaging`] | Resize planning and the JPEG codec behind the `ImageCodec` trait |
//! | [`archive`] | ZIP reading and writing behind narrow traits, error categories |
//! | [`naming`] | `<stem>-<suffix>.<ext>` destination names |
//! | [`config`] | `gallery-shrink.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Narrow Capability Traits
//!
//! The transformer only sees [`imaging::ImageCodec`],
//! [`archive::ArchiveReader`], and [`archive::ArchiveWriter`]. Production
//! uses the `image` and `zip` crates; tests substitute a recording mock codec
//! and in-memory archives, so the entry loop is tested without encoding a
//! single pixel.
//!
//! ## Failures Are Scoped
//!
//! A broken image costs one entry, never the archive. A broken archive costs
//! one archive, never the batch. Archive-level errors are reduced to a fixed
//! set of [`archive::ErrorCategory`] values, each with one static message.

pub mod archive;
pub mod batch;
pub mod classify;
pub mod config;
pub mod discover;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;
