//! # Certificate Export
//!
//! Encodes rendered surfaces into downloadable files.
//!
//! | Format | Encoding | Default quality |
//! |--------|----------|-----------------|
//! | `jpg`  | Baseline JPEG, alpha flattened over white | 80 |
//! | `pdf`  | One page, 1 px = 1 pt, JPEG placed full-bleed | 100 (fixed) |
//! | `png`  | Lossless RGBA | n/a |
//!
//! Files are named `certificate-<name>.<ext>`.

pub mod batch;
pub mod jpeg;
pub mod pdf;
pub mod png;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::compositor::Surface;
use crate::error::CertigenError;

pub use batch::{
    BatchReport, DirectoryWriter, ExportRecord, collect_batch, export_batch, export_batch_to_dir,
    stream_batch,
};

/// JPEG quality for direct downloads.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
/// JPEG quality for the image embedded in a PDF page.
pub const PDF_JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpg,
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Pdf => "pdf",
            Self::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CertigenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "pdf" => Ok(Self::Pdf),
            "png" => Ok(Self::Png),
            other => Err(CertigenError::InvalidInput(format!(
                "Unknown export format '{}' (expected jpg, pdf or png)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

/// How to encode a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub format: ExportFormat,
    /// JPEG quality, 1-100. Ignored for PDF and PNG.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpg,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_quality(self, quality: u8) -> Self {
        Self { quality, ..self }
    }
}

/// An encoded certificate ready to save or attach.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Encode a surface in the requested format.
pub fn encode(surface: &Surface, options: &ExportOptions) -> Result<Vec<u8>, CertigenError> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(CertigenError::ExportEncoding(format!(
            "Cannot export a {}x{} surface",
            surface.width(),
            surface.height()
        )));
    }

    match options.format {
        ExportFormat::Jpg => jpeg::encode(surface, options.quality),
        ExportFormat::Pdf => pdf::encode(surface),
        ExportFormat::Png => png::encode(surface),
    }
}

/// Encode a surface and name it for `recipient_name`.
pub fn export(
    surface: &Surface,
    recipient_name: &str,
    options: &ExportOptions,
) -> Result<ExportedFile, CertigenError> {
    let bytes = encode(surface, options)?;
    let file_name = file_name(recipient_name, options.format);
    tracing::debug!(file = %file_name, bytes = bytes.len(), "certificate exported");
    Ok(ExportedFile {
        file_name,
        mime_type: options.format.mime_type(),
        bytes,
    })
}

/// `certificate-<name>.<ext>`, with characters unsafe in file names
/// replaced by `_`. A blank name gives `certificate.<ext>`.
pub fn file_name(recipient_name: &str, format: ExportFormat) -> String {
    let safe: String = recipient_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if safe.is_empty() {
        format!("certificate.{}", format.extension())
    } else {
        format!("certificate-{}.{}", safe, format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name("Ada Lovelace", ExportFormat::Jpg), "certificate-Ada Lovelace.jpg");
        assert_eq!(file_name("a/b\\c", ExportFormat::Pdf), "certificate-a_b_c.pdf");
        assert_eq!(file_name("  ", ExportFormat::Png), "certificate.png");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPEG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpg);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options: ExportOptions = serde_json::from_str(r#"{"format":"pdf"}"#).unwrap();
        assert_eq!(options, ExportOptions::new(ExportFormat::Pdf));
        assert_eq!(options.quality, 80);
    }

    #[test]
    fn test_zero_dimension_fails() {
        for format in [ExportFormat::Jpg, ExportFormat::Pdf, ExportFormat::Png] {
            let err = encode(&surface(0, 10), &ExportOptions::new(format)).unwrap_err();
            assert!(matches!(err, CertigenError::ExportEncoding(_)));
        }
    }

    #[test]
    fn test_export_names_and_types() {
        let file = export(&surface(4, 4), "Grace", &ExportOptions::new(ExportFormat::Png)).unwrap();
        assert_eq!(file.file_name, "certificate-Grace.png");
        assert_eq!(file.mime_type, "image/png");
        assert!(file.bytes.starts_with(b"\x89PNG"));
    }
}
