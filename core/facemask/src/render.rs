use image::{Rgb, RgbImage};

use crate::region::RedactionRect;

/// Default preview overlay colour.
pub const PREVIEW_RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Default fill for the final redaction.
pub const REDACTION_BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Default opacity of the preview overlay.
pub const DEFAULT_PREVIEW_ALPHA: f64 = 0.65;

/// Blend one channel: `round(alpha * overlay + (1 - alpha) * base)`, saturated.
fn blend_channel(overlay: u8, base: u8, alpha: f64) -> u8 {
    (alpha * overlay as f64 + (1.0 - alpha) * base as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Translucent preview: `overlay` composited at `alpha` over the rectangle.
///
/// Pixels outside the rectangle are copied unchanged.
pub fn render_preview(
    image: &RgbImage,
    rect: RedactionRect,
    overlay: Rgb<u8>,
    alpha: f64,
) -> RgbImage {
    let mut preview = image.clone();
    for (x, y, pixel) in preview.enumerate_pixels_mut() {
        if !rect.contains(x, y) {
            continue;
        }
        let [r, g, b] = pixel.0;
        *pixel = Rgb([
            blend_channel(overlay.0[0], r, alpha),
            blend_channel(overlay.0[1], g, alpha),
            blend_channel(overlay.0[2], b, alpha),
        ]);
    }
    preview
}

/// Final redaction: every pixel inside the rectangle replaced by `fill`.
pub fn render_final(image: &RgbImage, rect: RedactionRect, fill: Rgb<u8>) -> RgbImage {
    let mut redacted = image.clone();
    let y_end = rect.y_max.saturating_add(1).min(image.height());
    let x_end = rect.x_max.saturating_add(1).min(image.width());
    for y in rect.y_min..y_end {
        for x in rect.x_min..x_end {
            redacted.put_pixel(x, y, fill);
        }
    }
    redacted
}
