//! Lossless PNG encoding for previews.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::compositor::Surface;
use crate::error::CertigenError;

pub fn encode(surface: &Surface) -> Result<Vec<u8>, CertigenError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            surface.as_rgba().as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| CertigenError::ExportEncoding(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}
