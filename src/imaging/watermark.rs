//! Watermark badge for exports from non-premium users.
//!
//! A semi-transparent rounded badge with a fixed white label, anchored to the
//! bottom-right corner. Badge geometry depends only on the raster size, so
//! [`watermark_rect`] can tell callers (and tests) exactly which pixels the
//! badge may touch.

use super::calculations::PixelRect;
use super::operations::rounded_rect_path;
use super::raster::{self, RenderError};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use std::sync::LazyLock;
use tiny_skia::{FillRule, Paint, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

pub const WATERMARK_LABEL: &str = "Made with shotframe";

const FONT_SIZE: f32 = 13.0;
/// Distance from the right and bottom raster edges.
const EDGE_INSET: f32 = 12.0;
/// Space between the label and the badge edge.
const TEXT_PADDING: f32 = 8.0;
const BADGE_RADIUS: f32 = 6.0;
const BADGE_ALPHA: u8 = 115;

static FONT: LazyLock<Result<Font, String>> = LazyLock::new(|| {
    let bytes: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
    Font::from_bytes(bytes, FontSettings::default()).map_err(str::to_string)
});

fn font() -> Result<&'static Font, RenderError> {
    FONT.as_ref().map_err(|e| RenderError::Font(e.clone()))
}

/// Badge placement in raster coordinates; may extend past the top-left edge
/// on tiny rasters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Badge {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

fn badge(font: &Font, raster_w: u32, raster_h: u32) -> Badge {
    let text_w: f32 = WATERMARK_LABEL
        .chars()
        .map(|c| font.metrics(c, FONT_SIZE).advance_width)
        .sum();
    let text_h = font
        .horizontal_line_metrics(FONT_SIZE)
        .map_or(FONT_SIZE * 1.2, |m| m.ascent - m.descent);
    let width = (text_w + 2.0 * TEXT_PADDING).ceil();
    let height = (text_h + 2.0 * TEXT_PADDING).ceil();
    Badge {
        x: raster_w as f32 - EDGE_INSET - width,
        y: raster_h as f32 - EDGE_INSET - height,
        width,
        height,
    }
}

/// Pixels the badge may change on a `width`×`height` raster.
///
/// `None` when the badge falls entirely outside the raster or the font
/// cannot be loaded.
pub fn watermark_rect(width: u32, height: u32) -> Option<PixelRect> {
    let b = badge(font().ok()?, width, height);
    let x0 = b.x.max(0.0);
    let y0 = b.y.max(0.0);
    let x1 = (b.x + b.width).min(width as f32);
    let y1 = (b.y + b.height).min(height as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Copy `src` and draw the watermark badge over it.
pub fn apply_watermark(src: &Pixmap) -> Result<Pixmap, RenderError> {
    let font = font()?;
    let b = badge(font, src.width(), src.height());
    let mut out = src.clone();

    let path = rounded_rect_path(b.x, b.y, b.width, b.height, BADGE_RADIUS)
        .ok_or_else(|| RenderError::Geometry("cannot build watermark badge".into()))?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, BADGE_ALPHA);
    paint.anti_alias = true;
    out.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: b.x + TEXT_PADDING,
        y: b.y + TEXT_PADDING,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(WATERMARK_LABEL, FONT_SIZE, 0));

    let glyph_paint = PixmapPaint::default();
    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        let (_, coverage) = font.rasterize_config(glyph.key);
        let mut glyph_px = raster::blank(glyph.width as u32, glyph.height as u32)?;
        for (dst, &c) in glyph_px.pixels_mut().iter_mut().zip(&coverage) {
            *dst = PremultipliedColorU8::from_rgba(c, c, c, c)
                .unwrap_or(PremultipliedColorU8::TRANSPARENT);
        }
        out.draw_pixmap(
            glyph.x.round() as i32,
            glyph.y.round() as i32,
            glyph_px.as_ref(),
            &glyph_paint,
            Transform::identity(),
            None,
        );
    }
    tracing::trace!(x = b.x, y = b.y, "watermark drawn");

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{opaque_pixmap, premul_at};

    #[test]
    fn font_loads() {
        assert!(font().is_ok());
    }

    #[test]
    fn badge_anchors_bottom_right_with_inset() {
        let rect = watermark_rect(800, 600).unwrap();
        assert_eq!(rect.x + rect.width, 800 - 12);
        assert_eq!(rect.y + rect.height, 600 - 12);
        assert!(rect.width > rect.height);
        assert!(rect.height >= 16 + 10);
    }

    #[test]
    fn badge_size_does_not_depend_on_raster_size() {
        let a = watermark_rect(800, 600).unwrap();
        let b = watermark_rect(3000, 4000).unwrap();
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn tiny_raster_clips_badge() {
        assert!(watermark_rect(4, 4).is_none());
        let out = apply_watermark(&opaque_pixmap(4, 4, [9, 9, 9])).unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
    }

    #[test]
    fn watermark_changes_only_the_badge_region() {
        let src = opaque_pixmap(400, 300, [240, 240, 240]);
        let out = apply_watermark(&src).unwrap();
        let rect = watermark_rect(400, 300).unwrap();
        let mut changed_inside = 0;
        for y in 0..300 {
            for x in 0..400 {
                let same = premul_at(&src, x, y) == premul_at(&out, x, y);
                if rect.contains(x, y) {
                    changed_inside += usize::from(!same);
                } else {
                    assert!(same, "pixel ({x}, {y}) outside the badge changed");
                }
            }
        }
        assert!(changed_inside > 0);
    }

    #[test]
    fn watermark_draws_white_text_over_dark_badge() {
        let src = opaque_pixmap(400, 300, [255, 255, 255]);
        let out = apply_watermark(&src).unwrap();
        let rect = watermark_rect(400, 300).unwrap();
        // Padding area of the badge is darkened.
        let pad = premul_at(&out, rect.x + rect.width / 2, rect.y + 2);
        assert!(pad[0] < 200);
        // Some text pixel is brighter than the bare badge.
        let brightest_text = (rect.y + 8..rect.y + rect.height - 8)
            .flat_map(|y| (rect.x + 8..rect.x + rect.width - 8).map(move |x| (x, y)))
            .map(|(x, y)| premul_at(&out, x, y)[0])
            .max()
            .unwrap();
        assert!(brightest_text > pad[0] + 50);
    }

    #[test]
    fn input_is_not_mutated() {
        let src = opaque_pixmap(300, 200, [10, 20, 30]);
        let before = src.data().to_vec();
        let _ = apply_watermark(&src).unwrap();
        assert_eq!(src.data(), &before[..]);
    }
}
