//! Text elements: positioned, styled text fields on a template.
//!
//! Elements are immutable value records. Every edit goes through a `with_*`
//! method that returns a new record, and the owning [`super::ElementList`]
//! swaps the whole record in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;

/// Font size used when an element has none (or a non-positive one).
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
/// Default fill color.
pub const DEFAULT_FONT_COLOR: &str = "#222";
/// Default font family.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Line height as a multiple of the font size when `lineHeight` is unset.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// The literal substitution token replaced by the recipient name.
pub const NAME_TOKEN: &str = "{name}";

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_font_color() -> String {
    DEFAULT_FONT_COLOR.to_string()
}

/// Horizontal anchor of each line relative to the element's `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Line starts at `x`.
    #[default]
    Left,
    /// Line is centered on `x`.
    Center,
    /// Line ends at `x`.
    Right,
}

/// CSS-style font weight.
///
/// Stored as the original string (`"normal"`, `"bold"`, `"700"`) so saved
/// data round-trips untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontWeight(String);

impl FontWeight {
    pub fn normal() -> Self {
        Self("normal".to_string())
    }

    pub fn bold() -> Self {
        Self("bold".to_string())
    }

    /// Numeric weight (400 = normal, 700 = bold). Unknown keywords map to 400.
    pub fn numeric(&self) -> u16 {
        match self.0.trim().to_ascii_lowercase().as_str() {
            "bold" | "bolder" => 700,
            "lighter" => 300,
            other => other.parse::<u16>().unwrap_or(400),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.numeric() >= 600
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::normal()
    }
}

impl From<&str> for FontWeight {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One placeable text field on a template.
///
/// ## Coordinates
///
/// `x` and `y` are percentages (0-100) of the rendered surface, so the
/// same element lands in the same relative spot at any resolution. `y`
/// always denotes the top of the text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub text_align: TextAlign,
    /// Wrap width in pixels. `None` draws a single unwrapped line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Box height hint for interactive resize. Not used by render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

impl TextElement {
    /// Create an element with a fresh id at the template's center.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: format!("text-{}", Uuid::new_v4()),
            text: text.into(),
            x: 50.0,
            y: 50.0,
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            font_family: None,
            font_weight: FontWeight::normal(),
            text_align: TextAlign::Left,
            width: None,
            height: None,
            line_height: None,
        }
    }

    /// Starter element used by the editor's "add text" action.
    pub fn editor_default() -> Self {
        Self {
            font_size: 24.0,
            font_color: "#000000".to_string(),
            font_family: Some(DEFAULT_FONT_FAMILY.to_string()),
            width: Some(200.0),
            height: Some(40.0),
            ..Self::new("New Text")
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self
        }
    }

    /// Move to a new position, clamped to `[0, 100]`.
    pub fn with_position(self, x: f32, y: f32) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
            ..self
        }
    }

    pub fn with_font_size(self, font_size: f32) -> Self {
        Self { font_size, ..self }
    }

    pub fn with_font_color(self, color: impl Into<String>) -> Self {
        Self {
            font_color: color.into(),
            ..self
        }
    }

    pub fn with_font_family(self, family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..self
        }
    }

    pub fn with_font_weight(self, weight: impl Into<FontWeight>) -> Self {
        Self {
            font_weight: weight.into(),
            ..self
        }
    }

    pub fn with_align(self, text_align: TextAlign) -> Self {
        Self { text_align, ..self }
    }

    pub fn with_width(self, width: Option<f32>) -> Self {
        Self { width, ..self }
    }

    pub fn with_height(self, height: Option<f32>) -> Self {
        Self { height, ..self }
    }

    pub fn with_line_height(self, line_height: Option<f32>) -> Self {
        Self {
            line_height,
            ..self
        }
    }

    /// Font size actually used for drawing.
    pub fn effective_font_size(&self) -> f32 {
        if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            DEFAULT_FONT_SIZE
        }
    }

    /// Distance between wrapped lines.
    pub fn effective_line_height(&self) -> f32 {
        match self.line_height {
            Some(lh) if lh.is_finite() && lh > 0.0 => lh,
            _ => self.effective_font_size() * LINE_HEIGHT_FACTOR,
        }
    }

    /// Wrap width, ignoring non-positive values.
    pub fn wrap_width(&self) -> Option<f32> {
        self.width.filter(|w| w.is_finite() && *w > 0.0)
    }

    pub fn effective_font_family(&self) -> &str {
        match self.font_family.as_deref() {
            Some(family) if !family.trim().is_empty() => family,
            _ => DEFAULT_FONT_FAMILY,
        }
    }

    pub fn color(&self) -> Color {
        Color::parse_or_default(&self.font_color)
    }

    /// Position clamped into `[0, 100]`; NaN maps to 0.
    pub fn clamped_position(&self) -> (f32, f32) {
        (clamp_percent(self.x), clamp_percent(self.y))
    }

    /// Replace every `{name}` token with `name` in a single pass.
    pub fn resolve_text(&self, name: &str) -> String {
        substitute_name(&self.text, name)
    }
}

/// Single-pass `{name}` substitution. A name that itself contains
/// `{name}` is inserted literally.
pub fn substitute_name(text: &str, name: &str) -> String {
    text.replace(NAME_TOKEN, name)
}

/// Clamp a percentage into `[0, 100]`.
pub fn clamp_percent(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}
