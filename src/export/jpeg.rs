//! JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::compositor::Surface;
use crate::error::CertigenError;

/// Composite the surface over white and drop alpha.
pub fn flatten(surface: &Surface) -> RgbImage {
    let rgba = surface.as_rgba();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([over_white(p[0]), over_white(p[1]), over_white(p[2])])
    })
}

/// Encode at `quality` (clamped to 1-100).
pub fn encode(surface: &Surface, quality: u8) -> Result<Vec<u8>, CertigenError> {
    let rgb = flatten(surface);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CertigenError::ExportEncoding(format!("JPEG encoding failed: {}", e)))?;
    Ok(bytes)
}
