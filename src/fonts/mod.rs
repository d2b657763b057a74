//! # Font Registry
//!
//! Fonts must be installed before a render references them. Installation is
//! an explicit step ([`FontRegistry::register`] or the awaitable
//! [`FontRegistry::register_file`]) that validates the bytes; once it returns
//! `Ok`, the family is usable by every later render.
//!
//! ## Resolution
//!
//! ```text
//! element.fontFamily ──▶ registered? ──yes──▶ outline face (bold variant if any)
//!                             │
//!                             no
//!                             ▼
//!                  default family registered? ──yes──▶ that face
//!                             │
//!                             no
//!                             ▼
//!                     built-in Spleen bitmap face
//! ```
//!
//! A missing font never fails a render. Requesting bold from a family
//! without a bold face draws the regular face twice, one pixel apart.

pub mod bitmap;
pub mod outline;

use ab_glyph::FontArc;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::CertigenError;
use crate::model::{DEFAULT_FONT_FAMILY, FontWeight};

/// Family name of the built-in bitmap face.
pub const BUILTIN_FAMILY: &str = "Spleen";

/// Pixel rectangle a draw is confined to, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Clip {
    /// The whole of a `width × height` surface.
    pub fn surface(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width.min(i32::MAX as u32) as i32,
            y1: height.min(i32::MAX as u32) as i32,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Overlap with the box `[min_x, max_x) × [min_y, max_y)`, if any.
    pub fn intersect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Option<Clip> {
        let clip = Clip {
            x0: (min_x.floor().max(self.x0 as f32)) as i32,
            y0: (min_y.floor().max(self.y0 as f32)) as i32,
            x1: (max_x.ceil().min(self.x1 as f32)) as i32,
            y1: (max_y.ceil().min(self.y1 as f32)) as i32,
        };
        (clip.x0 < clip.x1 && clip.y0 < clip.y1).then_some(clip)
    }
}

/// Which glyph source a resolved font draws with.
#[derive(Clone)]
pub enum Face {
    /// Built-in Spleen bitmap face.
    Builtin,
    /// A registered TTF/OTF face.
    Outline(FontArc),
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Builtin => write!(f, "Builtin"),
            Face::Outline(_) => write!(f, "Outline"),
        }
    }
}

/// A face at a concrete pixel size, ready to measure and draw.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub face: Face,
    pub px: f32,
    /// Draw a second pass offset by one pixel.
    pub synthetic_bold: bool,
}

impl ResolvedFont {
    pub fn builtin(px: f32) -> Self {
        Self {
            face: Face::Builtin,
            px,
            synthetic_bold: false,
        }
    }

    /// Rendered width of a single line.
    pub fn measure(&self, text: &str) -> f32 {
        match &self.face {
            Face::Builtin => bitmap::measure(text, self.px),
            Face::Outline(font) => outline::measure(font, text, self.px),
        }
    }

    /// Rasterize one line with its left edge at `x` and top at `top`.
    ///
    /// Only pixels inside `clip` reach `plot`.
    pub fn draw(
        &self,
        text: &str,
        x: f32,
        top: f32,
        clip: Clip,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let passes: &[f32] = if self.synthetic_bold { &[0.0, 1.0] } else { &[0.0] };
        for dx in passes {
            match &self.face {
                Face::Builtin => bitmap::draw(text, self.px, x + dx, top, clip, plot),
                Face::Outline(font) => {
                    outline::draw(font, text, self.px, x + dx, top, clip, plot)
                }
            }
        }
    }
}

#[derive(Default)]
struct FamilyFaces {
    display_name: String,
    regular: Option<FontArc>,
    bold: Option<FontArc>,
}

/// A user-uploaded font as persisted in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontUpload {
    /// Name the user typed, e.g. "My Script".
    pub name: String,
    /// Family elements refer to, e.g. "custom-my-script".
    pub family: String,
    #[serde(default)]
    pub weight: FontWeight,
    /// Base64 font bytes.
    pub data: String,
}

impl FontUpload {
    pub fn new(name: &str, weight: FontWeight, bytes: &[u8]) -> Self {
        Self {
            name: name.trim().to_string(),
            family: custom_family_name(name),
            weight,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>, CertigenError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| CertigenError::Font(format!("corrupt stored font '{}': {}", self.family, e)))
    }
}

/// `"My Custom Font"` → `"custom-my-custom-font"`.
pub fn custom_family_name(name: &str) -> String {
    let slug = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    format!("custom-{}", slug)
}

fn family_key(family: &str) -> String {
    family.trim().to_lowercase()
}

/// Installed fonts, looked up by family name (case-insensitive).
#[derive(Default)]
pub struct FontRegistry {
    families: HashMap<String, FamilyFaces>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and install a font under `family`.
    ///
    /// Bold weights (>= 600) install the family's bold face; anything else
    /// installs the regular face. Re-registering replaces the earlier face.
    pub fn register(
        &mut self,
        family: &str,
        weight: &FontWeight,
        bytes: Vec<u8>,
    ) -> Result<(), CertigenError> {
        if family.trim().is_empty() {
            return Err(CertigenError::Font("font family name cannot be empty".to_string()));
        }
        let font = outline::load(bytes)
            .map_err(|e| CertigenError::Font(format!("cannot load font '{}': {}", family, e)))?;

        let entry = self
            .families
            .entry(family_key(family))
            .or_insert_with(|| FamilyFaces {
                display_name: family.trim().to_string(),
                ..Default::default()
            });
        if weight.is_bold() {
            entry.bold = Some(font);
        } else {
            entry.regular = Some(font);
        }

        tracing::info!(family, weight = weight.as_str(), "font registered");
        Ok(())
    }

    /// Read a font file and install it. Completes once the font is usable.
    pub async fn register_file(
        &mut self,
        family: &str,
        weight: &FontWeight,
        path: impl AsRef<Path>,
    ) -> Result<(), CertigenError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CertigenError::Font(format!("cannot read font file {}: {}", path.display(), e))
        })?;
        self.register(family, weight, bytes)
    }

    /// Install a persisted upload.
    pub fn register_upload(&mut self, upload: &FontUpload) -> Result<(), CertigenError> {
        self.register(&upload.family, &upload.weight, upload.bytes()?)
    }

    /// Re-install persisted uploads. Broken entries are logged and skipped.
    ///
    /// Returns how many fonts were installed.
    pub fn restore(&mut self, uploads: &[FontUpload]) -> usize {
        uploads
            .iter()
            .filter(|upload| match self.register_upload(upload) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(family = %upload.family, "skipping stored font: {}", e);
                    false
                }
            })
            .count()
    }

    /// Whether `family` resolves without falling back.
    pub fn contains(&self, family: &str) -> bool {
        let key = family_key(family);
        key == family_key(BUILTIN_FAMILY) || self.families.contains_key(&key)
    }

    /// Family names, built-in first, then registered ones alphabetically.
    pub fn families(&self) -> Vec<String> {
        let mut registered: Vec<String> = self
            .families
            .values()
            .map(|f| f.display_name.clone())
            .collect();
        registered.sort();
        std::iter::once(BUILTIN_FAMILY.to_string())
            .chain(registered)
            .collect()
    }

    /// Strict lookup: only families that are actually installed.
    pub fn lookup(
        &self,
        family: &str,
        weight: &FontWeight,
        px: f32,
    ) -> Result<ResolvedFont, CertigenError> {
        let key = family_key(family);
        if key == family_key(BUILTIN_FAMILY) {
            return Ok(ResolvedFont {
                synthetic_bold: weight.is_bold(),
                ..ResolvedFont::builtin(px)
            });
        }

        let faces = self
            .families
            .get(&key)
            .ok_or_else(|| CertigenError::FontUnavailable(family.to_string()))?;

        let (font, synthetic_bold) = match (weight.is_bold(), &faces.bold, &faces.regular) {
            (true, Some(bold), _) => (bold, false),
            (true, None, Some(regular)) => (regular, true),
            (false, _, Some(regular)) => (regular, false),
            (false, Some(bold), None) => (bold, false),
            (_, None, None) => return Err(CertigenError::FontUnavailable(family.to_string())),
        };

        Ok(ResolvedFont {
            face: Face::Outline(font.clone()),
            px,
            synthetic_bold,
        })
    }

    /// Lenient lookup used by render: falls back instead of failing.
    pub fn resolve(&self, family: &str, weight: &FontWeight, px: f32) -> ResolvedFont {
        if let Ok(font) = self.lookup(family, weight, px) {
            return font;
        }

        let is_default = family_key(family) == family_key(DEFAULT_FONT_FAMILY);
        if !is_default {
            tracing::warn!(family, "font unavailable, falling back to {}", DEFAULT_FONT_FAMILY);
        }

        self.lookup(DEFAULT_FONT_FAMILY, weight, px)
            .unwrap_or_else(|_| ResolvedFont {
                synthetic_bold: weight.is_bold(),
                ..ResolvedFont::builtin(px)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<u8> {
        std::fs::read(format!(
            "{}/tests/fixtures/fonts/{}",
            env!("CARGO_MANIFEST_DIR"),
            name
        ))
        .unwrap()
    }

    #[test]
    fn test_custom_family_name() {
        assert_eq!(custom_family_name("My Custom  Font"), "custom-my-custom-font");
    }

    #[test]
    fn test_register_rejects_invalid_bytes() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register("Broken", &FontWeight::normal(), b"junk".to_vec())
            .unwrap_err();
        assert!(matches!(err, CertigenError::Font(_)));
        assert!(!registry.contains("Broken"));
    }

    #[test]
    fn test_lookup_unregistered_is_unavailable() {
        let registry = FontRegistry::new();
        let err = registry.lookup("Georgia", &FontWeight::normal(), 20.0).unwrap_err();
        assert!(matches!(err, CertigenError::FontUnavailable(_)));
    }

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let registry = FontRegistry::new();
        let font = registry.resolve("Georgia", &FontWeight::normal(), 20.0);
        assert!(matches!(font.face, Face::Builtin));
        assert_eq!(font.measure("abcd"), 40.0);
    }

    #[test]
    fn test_resolve_prefers_registered_default_family() {
        let mut registry = FontRegistry::new();
        registry
            .register("Arial", &FontWeight::normal(), fixture("DejaVuSans.ttf"))
            .unwrap();
        let font = registry.resolve("Missing", &FontWeight::normal(), 20.0);
        assert!(matches!(font.face, Face::Outline(_)));
    }

    #[test]
    fn test_bold_variant_and_synthetic_bold() {
        let mut registry = FontRegistry::new();
        registry
            .register("DejaVu", &FontWeight::normal(), fixture("DejaVuSans.ttf"))
            .unwrap();
        let synthetic = registry.lookup("dejavu", &FontWeight::bold(), 20.0).unwrap();
        assert!(synthetic.synthetic_bold);

        registry
            .register("DejaVu", &FontWeight::bold(), fixture("DejaVuSans-Bold.ttf"))
            .unwrap();
        let real = registry.lookup("DejaVu", &FontWeight::from("700"), 20.0).unwrap();
        assert!(!real.synthetic_bold);
        assert!(real.measure("Certificate") > synthetic.measure("Certificate"));
    }

    #[test]
    fn test_restore_skips_broken_uploads() {
        let good = FontUpload::new("Deja", FontWeight::normal(), &fixture("DejaVuSans.ttf"));
        let broken = FontUpload {
            data: "!!!".to_string(),
            ..FontUpload::new("Bad", FontWeight::normal(), b"")
        };
        let mut registry = FontRegistry::new();
        assert_eq!(registry.restore(&[good, broken]), 1);
        assert!(registry.contains("custom-deja"));
        assert!(!registry.contains("custom-bad"));
    }

    #[test]
    fn test_families_lists_builtin_first() {
        let mut registry = FontRegistry::new();
        registry
            .register("Zeta", &FontWeight::normal(), fixture("DejaVuSans.ttf"))
            .unwrap();
        registry
            .register("Alpha", &FontWeight::normal(), fixture("DejaVuSans.ttf"))
            .unwrap();
        assert_eq!(registry.families(), vec!["Spleen", "Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_register_file() {
        let mut registry = FontRegistry::new();
        let path = format!("{}/tests/fixtures/fonts/DejaVuSans.ttf", env!("CARGO_MANIFEST_DIR"));
        registry
            .register_file("FromDisk", &FontWeight::normal(), &path)
            .await
            .unwrap();
        assert!(registry.contains("fromdisk"));

        let missing = registry
            .register_file("Nope", &FontWeight::normal(), "/no/such/font.ttf")
            .await;
        assert!(missing.is_err());
    }
}
