//! Built-in bitmap face.
//!
//! Uses the Spleen bitmap font family so a render never depends on system
//! fonts. Every Spleen size has a 1:2 cell, so a glyph drawn at `px`
//! pixels is `px / 2` wide and every string measures
//! `chars * px / 2`. That makes layout exact and identical on every host.
//!
//! ## Source Size Selection
//!
//! ```text
//! px <= 14  → Spleen 6x12
//! px <= 20  → Spleen 8x16
//! px >  20  → Spleen 12x24
//! ```
//!
//! The chosen source bitmap is scaled nearest-neighbor onto the cell.

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use super::Clip;

/// Horizontal advance as a fraction of the pixel size.
pub const ADVANCE_RATIO: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceSize {
    width: usize,
    height: usize,
}

const SMALL: SourceSize = SourceSize { width: 6, height: 12 };
const MEDIUM: SourceSize = SourceSize { width: 8, height: 16 };
const LARGE: SourceSize = SourceSize { width: 12, height: 24 };

fn source_for(px: f32) -> SourceSize {
    if px <= 14.0 {
        SMALL
    } else if px <= 20.0 {
        MEDIUM
    } else {
        LARGE
    }
}

/// Characters that take up a cell (control characters are skipped).
fn drawable(ch: &char) -> bool {
    !ch.is_control()
}

/// Width of `text` drawn at `px` pixels.
pub fn measure(text: &str, px: f32) -> f32 {
    text.chars().filter(drawable).count() as f32 * px * ADVANCE_RATIO
}

/// Glyph bitmap for a character: `width * height` bytes, 1 = ink.
///
/// Characters missing from Spleen get a box outline.
fn glyph_bitmap(ch: char, size: SourceSize) -> Vec<u8> {
    let mut glyph = vec![0u8; size.width * size.height];
    let data = match size {
        SMALL => FONT_6X12,
        MEDIUM => FONT_8X16,
        _ => FONT_12X24,
    };

    let Ok(mut spleen) = PSF2Font::new(data) else {
        draw_box(&mut glyph, size.width, size.height);
        return glyph;
    };

    let utf8 = ch.to_string();
    match spleen.glyph_for_utf8(utf8.as_bytes()) {
        Some(rows) => {
            for (row_y, row) in rows.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < size.height && col_x < size.width {
                        glyph[row_y * size.width + col_x] = on as u8;
                    }
                }
            }
        }
        None => draw_box(&mut glyph, size.width, size.height),
    }

    glyph
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

/// Rasterize `text` with its left edge at `x` and its top at `top`.
///
/// `plot(px, py, coverage)` receives every inked pixel inside `clip`.
/// Cells outside `clip` are never sampled, so the cost is bounded by the
/// clip area rather than the glyph size.
pub fn draw(
    text: &str,
    px: f32,
    x: f32,
    top: f32,
    clip: Clip,
    plot: &mut dyn FnMut(i32, i32, f32),
) {
    if px <= 0.0 {
        return;
    }

    let size = source_for(px);
    let cell_w = px * ADVANCE_RATIO;
    let cell_h = px;

    for (i, ch) in text.chars().filter(drawable).enumerate() {
        if ch == ' ' {
            continue;
        }
        let gx = x + i as f32 * cell_w;
        let Some(cell) = clip.intersect(gx, top, gx + cell_w, top + cell_h) else {
            continue;
        };
        let glyph = glyph_bitmap(ch, size);

        for py in cell.y0..cell.y1 {
            // Sample the source at the destination pixel center.
            let v = (py as f32 + 0.5 - top) / cell_h;
            if !(0.0..1.0).contains(&v) {
                continue;
            }
            let sy = (v * size.height as f32) as usize;
            for px_ in cell.x0..cell.x1 {
                let u = (px_ as f32 + 0.5 - gx) / cell_w;
                if !(0.0..1.0).contains(&u) {
                    continue;
                }
                let sx = (u * size.width as f32) as usize;
                if glyph[sy * size.width + sx] != 0 {
                    plot(px_, py, 1.0);
                }
            }
        }
    }
}
