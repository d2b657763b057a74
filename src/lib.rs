//! # Certigen - Certificate Generator Library
//!
//! Certigen personalizes certificate templates: it draws positioned,
//! styled text over a background image, substituting each recipient's
//! name, and exports the result as JPEG, PDF or PNG. It provides:
//!
//! - **Compositor**: percentage-based layout, greedy word-wrap, alignment
//! - **Fonts**: explicit registration of TTF/OTF faces with a built-in fallback
//! - **Editor**: drag/resize/nudge state machine with clamping
//! - **Export**: JPEG, single-page PDF and PNG encoders, sequential batches
//! - **Mail**: per-recipient dispatch through an EmailJS-compatible API
//! - **Storage**: key-value adapter and typed workspace repository
//!
//! ## Quick Start
//!
//! ```no_run
//! use certigen::{
//!     compositor::Compositor,
//!     export::{self, ExportFormat, ExportOptions},
//!     fonts::FontRegistry,
//!     image_source::ImageSource,
//!     model::{TextAlign, TextElement},
//! };
//!
//! # async fn example() -> Result<(), certigen::error::CertigenError> {
//! let mut fonts = FontRegistry::new();
//! fonts
//!     .register_file("Serif", &"normal".into(), "fonts/DejaVuSerif.ttf")
//!     .await?;
//!
//! let template = ImageSource::parse("templates/award.png").load().await?;
//! let elements = vec![
//!     TextElement::new("Certificate of Achievement").with_position(50.0, 20.0),
//!     TextElement::new("Awarded to {name}")
//!         .with_position(50.0, 50.0)
//!         .with_font_family("Serif")
//!         .with_align(TextAlign::Center)
//!         .with_width(Some(600.0)),
//! ];
//!
//! let surface = Compositor::new(&fonts).render(&template, &elements, "Ada Lovelace");
//! let pdf = export::export(&surface, "Ada Lovelace", &ExportOptions::new(ExportFormat::Pdf))?;
//! std::fs::write(&pdf.file_name, &pdf.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Text elements, recipients, templates |
//! | [`color`] | CSS color parsing |
//! | [`image_source`] | Template image loading and decoding |
//! | [`fonts`] | Font registry and glyph rasterization |
//! | [`compositor`] | The render pass and preview sessions |
//! | [`editor`] | Interactive editing state machine |
//! | [`export`] | JPEG / PDF / PNG encoders and batch export |
//! | [`mail`] | Certificate email dispatch |
//! | [`storage`] | Store adapter and workspace |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod color;
pub mod compositor;
pub mod editor;
pub mod error;
pub mod export;
pub mod fonts;
pub mod image_source;
pub mod mail;
pub mod model;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use compositor::{Compositor, Surface, render};
pub use error::CertigenError;
pub use fonts::FontRegistry;
pub use image_source::{ImageSource, TemplateImage};
pub use model::{Recipient, TextElement};
