//! Element layout: coordinate mapping, `{name}` substitution and greedy
//! word-wrap.
//!
//! ## Coordinates
//!
//! ```text
//! (0,0) ─────────────── x% of W ──────────────▶
//!   │
//!   y% of H        ●  anchor = (x/100·W, y/100·H)
//!   │              │
//!   ▼         left: line starts at anchor
//!           center: line centered on anchor
//!            right: line ends at anchor
//! ```
//!
//! The anchor's `y` is always the top of the first line. Line `i` sits at
//! `y + i · lineHeight`.

use crate::color::Color;
use crate::fonts::{FontRegistry, ResolvedFont};
use crate::model::{TextAlign, TextElement};

/// One line of an element, positioned on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Left edge after alignment.
    pub x: f32,
    /// Top of the line.
    pub top: f32,
    /// Measured width.
    pub width: f32,
}

/// Everything needed to draw one element.
#[derive(Debug, Clone)]
pub struct ElementLayout {
    pub id: String,
    pub lines: Vec<PlacedLine>,
    pub font: ResolvedFont,
    pub color: Color,
}

/// Map percentage coordinates onto a `width × height` surface.
pub fn to_pixels(x_pct: f32, y_pct: f32, width: u32, height: u32) -> (f32, f32) {
    (x_pct / 100.0 * width as f32, y_pct / 100.0 * height as f32)
}

/// Greedy single-pass word-wrap.
///
/// Words are whitespace-delimited and never split. A word that would push
/// the current line past `max_width` starts a new line, unless the current
/// line is still empty, in which case it stays (and may overflow).
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", line, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Left edge of a line of `line_width` anchored at `anchor_x`.
pub fn align_x(anchor_x: f32, line_width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => anchor_x,
        TextAlign::Center => anchor_x - line_width / 2.0,
        TextAlign::Right => anchor_x - line_width,
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// Lay out one element for a given recipient name.
pub fn layout_element(
    element: &TextElement,
    recipient_name: &str,
    width: u32,
    height: u32,
    fonts: &FontRegistry,
) -> ElementLayout {
    let font = fonts.resolve(
        element.effective_font_family(),
        &element.font_weight,
        element.effective_font_size(),
    );
    let text = element.resolve_text(recipient_name);
    let (anchor_x, anchor_y) = to_pixels(
        finite_or_zero(element.x),
        finite_or_zero(element.y),
        width,
        height,
    );

    let raw_lines = match element.wrap_width() {
        Some(max_width) => wrap_words(&text, max_width, |s| font.measure(s)),
        None if text.is_empty() => Vec::new(),
        None => vec![text],
    };

    let line_height = element.effective_line_height();
    let lines = raw_lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let line_width = font.measure(&text);
            PlacedLine {
                x: align_x(anchor_x, line_width, element.text_align),
                top: anchor_y + i as f32 * line_height,
                width: line_width,
                text,
            }
        })
        .collect();

    ElementLayout {
        id: element.id.clone(),
        lines,
        font,
        color: element.color(),
    }
}
