//! Single-page PDF export.
//!
//! ```text
//! Catalog ─▶ Pages ─▶ Page (MediaBox 0 0 W H)
//!                       ├─ Contents: q W 0 0 H 0 0 cm /Im1 Do Q   (Flate)
//!                       └─ Resources/XObject/Im1: JPEG (DCTDecode)
//! ```
//!
//! The page is sized in points equal to the surface's pixel dimensions, so
//! the certificate prints at its natural aspect ratio with no margins.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};
use std::io::Write;

use super::{PDF_JPEG_QUALITY, jpeg};
use crate::compositor::Surface;
use crate::error::CertigenError;

const IMAGE_NAME: &[u8] = b"Im1";

fn deflate(data: &[u8]) -> Result<Vec<u8>, CertigenError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CertigenError::ExportEncoding(format!("Failed to compress page content: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| CertigenError::ExportEncoding(format!("Failed to compress page content: {}", e)))
}

pub fn encode(surface: &Surface) -> Result<Vec<u8>, CertigenError> {
    let jpeg = jpeg::encode(surface, PDF_JPEG_QUALITY)?;
    let (width, height) = (surface.width() as f32, surface.height() as f32);

    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids([page_id]).count(1);

    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, width, height))
            .parent(pages_id)
            .contents(content_id);
        page.resources().x_objects().pair(Name(IMAGE_NAME), image_id);
    }

    {
        let mut image = pdf.image_xobject(image_id, &jpeg);
        image.filter(Filter::DctDecode);
        image.width(surface.width() as i32);
        image.height(surface.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
    }

    let mut content = Content::new();
    content.save_state();
    content.transform([width, 0.0, 0.0, height, 0.0, 0.0]);
    content.x_object(Name(IMAGE_NAME));
    content.restore_state();
    let compressed = deflate(&content.finish())?;
    pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);

    Ok(pdf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_page_matches_surface_size() {
        let surface = Surface::new(RgbaImage::from_pixel(800, 600, Rgba([255, 255, 255, 255])));
        let bytes = encode(&surface).unwrap();
        let text = as_text(&bytes);

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(text.contains("/MediaBox [0 0 800 600]"));
        assert!(text.contains("/Width 800"));
        assert!(text.contains("/Height 600"));
        assert!(text.contains("/DCTDecode"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_embeds_jpeg() {
        let surface = Surface::new(RgbaImage::from_pixel(10, 20, Rgba([1, 2, 3, 255])));
        let bytes = encode(&surface).unwrap();
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xD8]));
    }
}
