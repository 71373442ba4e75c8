//! Image codec trait and shared error type.
//!
//! The [`ImageCodec`] trait defines the operations the transform pipeline
//! needs from an image library: decode, inspect, resize and encode.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), the `image` crate's pure
//! Rust JPEG decoder/encoder. Tests swap in a mock whose "pixels" are just
//! dimensions, so pipeline logic runs without touching real image data.

use super::params::{Dimensions, Quality, ResizePlan};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

impl CodecError {
    /// The codec's message without the stage prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Decode(message) | Self::Encode(message) => message,
        }
    }
}

/// Trait for image codecs.
///
/// `Sync` so one codec can be shared by every rayon worker; `Image` is `Send`
/// so decoded buffers can move between them.
pub trait ImageCodec: Sync {
    /// Decoded pixel buffer, owned by one entry's transform step.
    type Image: Send;

    /// Decode raw entry bytes. Zero-sized images are a decode error.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, CodecError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Resample to the plan's dimensions. Identity plans return the input.
    fn resize(&self, image: Self::Image, plan: ResizePlan) -> Self::Image;

    /// Encode as JPEG at the given quality.
    fn encode(&self, image: &Self::Image, quality: Quality) -> Result<Vec<u8>, CodecError>;
}
