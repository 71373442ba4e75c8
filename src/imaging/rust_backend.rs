//! Pure Rust JPEG codec on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{CodecError, ImageCodec};
use super::params::{Dimensions, Quality, ResizePlan};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// JPEG codec backed by the `image` crate.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG has no alpha and no 16-bit mode; anything else is narrowed first.
fn to_jpeg_color(image: &DynamicImage) -> Option<DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => None,
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLumaA16(_) => Some(DynamicImage::ImageLuma8(image.to_luma8())),
        _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

impl ImageCodec for RustCodec {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CodecError::Decode("image has zero dimensions".to_string()));
        }
        Ok(image)
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        let (width, height) = image.dimensions();
        Dimensions { width, height }
    }

    fn resize(&self, image: DynamicImage, plan: ResizePlan) -> DynamicImage {
        if plan.is_identity(self.dimensions(&image)) {
            return image;
        }
        image.resize_exact(plan.target_width, plan.target_height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
        let narrowed = to_jpeg_color(image);
        let source = narrowed.as_ref().unwrap_or(image);

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, quality.value());
        source
            .write_with_encoder(encoder)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out)
    }
}
