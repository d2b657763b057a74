//! Outline font rendering for registered TTF/OTF fonts.
//!
//! Lays out glyphs with ab_glyph (advances plus pair kerning) and reports
//! anti-aliased coverage per pixel. The top of the text block sits at the
//! font's ascent above the baseline, so `top` means the same thing here as
//! for the bitmap face.

use ab_glyph::{Font, FontArc, GlyphId, Point, ScaleFont, point};

use super::Clip;

/// Parse and validate font bytes.
pub fn load(bytes: Vec<u8>) -> Result<FontArc, ab_glyph::InvalidFont> {
    FontArc::try_from_vec(bytes)
}

fn layout(font: &FontArc, text: &str, px: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(px);
    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars().filter(|c| !c.is_control()) {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }

    (glyphs, caret_x)
}

/// Advance width of `text` at `px` pixels.
pub fn measure(font: &FontArc, text: &str, px: f32) -> f32 {
    layout(font, text, px).1
}

/// Largest glyph box, in pixels, rasterized at full resolution.
const MAX_GLYPH_PIXELS: f32 = 2048.0 * 2048.0;

/// Rasterize `text` with its left edge at `x` and its top at `top`.
///
/// Glyphs entirely outside `clip` are skipped. A glyph whose box exceeds
/// [`MAX_GLYPH_PIXELS`] is rasterized at a reduced scale and sampled back up
/// over the clipped area, so memory stays bounded for any `px`.
pub fn draw(
    font: &FontArc,
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

    let baseline_y = top + font.as_scaled(px).ascent();
    let (glyphs, _) = layout(font, text, px);

    for (glyph_id, glyph_x) in glyphs {
        let origin = point(x + glyph_x, baseline_y);
        let glyph = glyph_id.with_scale_and_position(px, origin);
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };

        let bounds = outlined.px_bounds();
        let Some(visible) = clip.intersect(bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y)
        else {
            continue;
        };

        if bounds.width() * bounds.height() <= MAX_GLYPH_PIXELS {
            outlined.draw(|gx, gy, coverage| {
                let (dx, dy) = (gx as i32 + bounds.min.x as i32, gy as i32 + bounds.min.y as i32);
                if coverage > 0.0 && visible.contains(dx, dy) {
                    plot(dx, dy, coverage.min(1.0));
                }
            });
        } else {
            let factor = (MAX_GLYPH_PIXELS / (bounds.width() * bounds.height())).sqrt();
            draw_reduced(font, glyph_id, px, origin, factor, visible, plot);
        }
    }
}

/// Rasterize one glyph at `px * factor` and sample it over `visible`.
fn draw_reduced(
    font: &FontArc,
    glyph_id: GlyphId,
    px: f32,
    origin: Point,
    factor: f32,
    visible: Clip,
    plot: &mut dyn FnMut(i32, i32, f32),
) {
    let small = glyph_id.with_scale_and_position(px * factor, point(origin.x * factor, origin.y * factor));
    let Some(outlined) = font.outline_glyph(small) else {
        return;
    };
    let bounds = outlined.px_bounds();
    let (w, h) = (bounds.width() as usize, bounds.height() as usize);
    if w == 0 || h == 0 {
        return;
    }

    let mut coverage = vec![0.0f32; w * h];
    outlined.draw(|gx, gy, c| {
        if let Some(cell) = coverage.get_mut(gy as usize * w + gx as usize) {
            *cell = c;
        }
    });

    for dy in visible.y0..visible.y1 {
        let sy = ((dy as f32 + 0.5) * factor - bounds.min.y).floor();
        if sy < 0.0 || sy >= h as f32 {
            continue;
        }
        for dx in visible.x0..visible.x1 {
            let sx = ((dx as f32 + 0.5) * factor - bounds.min.x).floor();
            if sx < 0.0 || sx >= w as f32 {
                continue;
            }
            let c = coverage[sy as usize * w + sx as usize];
            if c > 0.0 {
                plot(dx, dy, c.min(1.0));
            }
        }
    }
}
