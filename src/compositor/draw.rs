//! Pixel blending onto the surface.

use image::{Rgba, RgbaImage};

use crate::color::Color;

/// Source-over blend of `color` at `coverage` onto pixel `(x, y)`.
///
/// Pixels outside the surface are ignored, so text may overflow the
/// template edges without error.
pub fn blend(surface: &mut RgbaImage, x: i32, y: i32, color: Color, coverage: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= surface.width() || y >= surface.height() {
        return;
    }

    let src_a = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let dst = *surface.get_pixel(x, y);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let channel = |s: u8, d: u8| -> u8 {
        if out_a <= 0.0 {
            return 0;
        }
        let v = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    surface.put_pixel(
        x,
        y,
        Rgba([
            channel(color.r, dst[0]),
            channel(color.g, dst[1]),
            channel(color.b, dst[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]),
    );
}
