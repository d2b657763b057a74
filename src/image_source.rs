//! # Template Image Loading
//!
//! Resolves an [`ImageSource`] to a decoded [`TemplateImage`].
//!
//! ```text
//! ImageSource ──fetch──▶ bytes ──decode (blocking pool)──▶ TemplateImage
//!   Path      tokio::fs
//!   Url       reqwest
//!   DataUri   base64
//!   Bytes     as-is
//! ```
//!
//! Loading is the only asynchronous step of a render. Every failure comes
//! back as [`CertigenError::ImageDecode`] so callers can offer a retry.
//!
//! Templates may be raster (anything the `image` crate decodes) or vector.
//! SVG documents are rasterized once, at their intrinsic size, with resvg.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};

use crate::error::CertigenError;

/// Largest SVG raster accepted, in pixels.
const MAX_SVG_PIXELS: u64 = 64 * 1024 * 1024;

/// Where a template image comes from.
///
/// Serialized as a single string: data URIs and `http(s)://` URLs are kept
/// verbatim, anything else is a file path. In-memory bytes serialize as a
/// data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
    DataUri(String),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Classify a reference string.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        if trimmed.starts_with("data:") {
            Self::DataUri(trimmed.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Fetch and decode the image.
    pub async fn load(&self) -> Result<TemplateImage, CertigenError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("certigen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertigenError::ImageDecode(format!("HTTP client error: {}", e)))?;
        self.load_with(&client).await
    }

    /// Fetch and decode the image using a shared HTTP client.
    pub async fn load_with(&self, client: &reqwest::Client) -> Result<TemplateImage, CertigenError> {
        let bytes = self.fetch(client).await?;
        let image = tokio::task::spawn_blocking(move || TemplateImage::decode(&bytes))
            .await
            .map_err(|e| CertigenError::ImageDecode(format!("Decode task failed: {}", e)))??;

        tracing::debug!(
            source = %self,
            width = image.width(),
            height = image.height(),
            "template image decoded"
        );
        Ok(image)
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>, CertigenError> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                CertigenError::ImageDecode(format!("Failed to read {}: {}", path.display(), e))
            }),
            Self::Url(url) => {
                let response = client.get(url).send().await.map_err(|e| {
                    CertigenError::ImageDecode(format!("Failed to download {}: {}", url, e))
                })?;
                if !response.status().is_success() {
                    return Err(CertigenError::ImageDecode(format!(
                        "Failed to download {}: HTTP {}",
                        url,
                        response.status()
                    )));
                }
                let bytes = response.bytes().await.map_err(|e| {
                    CertigenError::ImageDecode(format!("Failed to read image data: {}", e))
                })?;
                Ok(bytes.to_vec())
            }
            Self::DataUri(uri) => decode_data_uri(uri)
                .map(|(_, bytes)| bytes)
                .map_err(|e| CertigenError::ImageDecode(e.to_string())),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<String> for ImageSource {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        match source {
            ImageSource::Path(path) => path.to_string_lossy().into_owned(),
            ImageSource::Url(url) | ImageSource::DataUri(url) => url,
            ImageSource::Bytes(bytes) => {
                let mime = if is_svg(&bytes) {
                    "image/svg+xml"
                } else {
                    image::guess_format(&bytes)
                        .map(|f| f.to_mime_type())
                        .unwrap_or("application/octet-stream")
                };
                encode_data_uri(mime, &bytes)
            }
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
            Self::DataUri(uri) => write!(f, "data URI ({} bytes)", uri.len()),
            Self::Bytes(bytes) => write!(f, "in-memory image ({} bytes)", bytes.len()),
        }
    }
}

/// A decoded template background at its natural resolution.
///
/// Cheap to clone; batch renders share one decoded image.
#[derive(Debug, Clone)]
pub struct TemplateImage {
    image: Arc<RgbaImage>,
}

impl TemplateImage {
    /// Decode raster bytes (PNG, JPEG, GIF, BMP, WebP, ...) or an SVG
    /// document.
    pub fn decode(bytes: &[u8]) -> Result<Self, CertigenError> {
        if is_svg(bytes) {
            return Self::from_rgba(rasterize_svg(bytes)?);
        }
        let format = image::guess_format(bytes)
            .map_err(|e| CertigenError::ImageDecode(format!("Unrecognized image format: {}", e)))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| CertigenError::ImageDecode(format!("Failed to decode image: {}", e)))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    pub fn from_rgba(image: RgbaImage) -> Result<Self, CertigenError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CertigenError::ImageDecode(
                "Image has zero width or height".to_string(),
            ));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }
}

/// Whether `bytes` look like an SVG document.
fn is_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with('<') && head.contains("<svg")
}

fn svg_options() -> usvg::Options<'static> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    let fontdb = FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone();
    usvg::Options {
        fontdb,
        ..Default::default()
    }
}

/// Rasterize an SVG document at its intrinsic size.
fn rasterize_svg(bytes: &[u8]) -> Result<RgbaImage, CertigenError> {
    let tree = usvg::Tree::from_data(bytes, &svg_options())
        .map_err(|e| CertigenError::ImageDecode(format!("Failed to parse SVG: {}", e)))?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    if width as u64 * height as u64 > MAX_SVG_PIXELS {
        return Err(CertigenError::ImageDecode(format!(
            "SVG is too large to rasterize: {}x{}",
            width, height
        )));
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        CertigenError::ImageDecode(format!("Failed to allocate {}x{} raster", width, height))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(image)
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), CertigenError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CertigenError::InvalidInput("not a data URI".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CertigenError::InvalidInput("data URI has no payload".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| CertigenError::InvalidInput("only base64 data URIs are supported".to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CertigenError::InvalidInput(format!("invalid base64 in data URI: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// Build a base64 data URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_parse_classifies() {
        assert!(matches!(ImageSource::parse("data:image/png;base64,AA=="), ImageSource::DataUri(_)));
        assert!(matches!(ImageSource::parse("https://x.test/a.png"), ImageSource::Url(_)));
        assert!(matches!(ImageSource::parse("templates/a.png"), ImageSource::Path(_)));
    }

    #[test]
    fn test_decode_keeps_natural_size() {
        let image = TemplateImage::decode(&png_bytes(31, 17)).unwrap();
        assert_eq!((image.width(), image.height()), (31, 17));
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let err = TemplateImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CertigenError::ImageDecode(_)));
    }

    const BADGE_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">
  <rect x="0" y="0" width="20" height="20" fill="#ff0000"/>
  <rect x="20" y="0" width="20" height="20" fill="#0000ff"/>
</svg>"##;

    #[test]
    fn test_decode_svg_at_intrinsic_size() {
        let image = TemplateImage::decode(BADGE_SVG.as_bytes()).unwrap();
        assert_eq!((image.width(), image.height()), (40, 20));
        assert_eq!(*image.as_rgba().get_pixel(5, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.as_rgba().get_pixel(35, 10), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_decode_broken_or_oversized_svg() {
        let broken = TemplateImage::decode(b"<svg xmlns=\"http://www.w3.org/2000/svg\"").unwrap_err();
        assert!(matches!(broken, CertigenError::ImageDecode(_)));

        let huge = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100000" height="100000"/>"#;
        let err = TemplateImage::decode(huge.as_bytes()).unwrap_err();
        assert!(matches!(err, CertigenError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn test_load_svg_data_uri() {
        let uri = encode_data_uri("image/svg+xml", BADGE_SVG.as_bytes());
        let image = ImageSource::parse(&uri).load().await.unwrap();
        assert_eq!((image.width(), image.height()), (40, 20));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let bytes = png_bytes(2, 2);
        let uri = encode_data_uri("image/png", &bytes);
        let (mime, decoded) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_data_uri_rejects_plain_encoding() {
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("nope").is_err());
    }

    #[test]
    fn test_bytes_serialize_as_data_uri() {
        let source = ImageSource::Bytes(png_bytes(1, 1));
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.starts_with("\"data:image/png;base64,"));
        let back: ImageSource = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ImageSource::DataUri(_)));
    }

    #[tokio::test]
    async fn test_load_bytes_and_data_uri() {
        let bytes = png_bytes(8, 4);
        let from_bytes = ImageSource::Bytes(bytes.clone()).load().await.unwrap();
        let from_uri = ImageSource::DataUri(encode_data_uri("image/png", &bytes)).load().await.unwrap();
        assert_eq!(from_bytes.as_rgba(), from_uri.as_rgba());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_decode_error() {
        let err = ImageSource::Path("/nonexistent/certigen/template.png".into())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, CertigenError::ImageDecode(_)));
    }
}
