//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Plan** | [`plan_resize`]: longest edge bounded, never upscales |
//! | **Decode** | `image` JPEG decoder |
//! | **Resize** | Lanczos3 |
//! | **Encode** | `image` JPEG encoder at a configurable quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{CodecError, ImageCodec};
pub use calculations::plan_resize;
pub use params::{Dimensions, Quality, ResizePlan};
pub use rust_backend::RustCodec;
