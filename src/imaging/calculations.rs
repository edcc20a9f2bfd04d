//! Pure geometry for the compositing pipeline.
//!
//! All functions here are pure and testable without any pixels. The
//! pipeline asks this module where to crop, how large the canvas is and where
//! the foreground lands; it never does that arithmetic itself.

use super::params::{AspectRatio, EditingParameters, NormalizedRect};
use serde::Serialize;

/// Floating-point size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Round to whole pixels, never below 1×1.
    pub fn to_pixels(self) -> (u32, u32) {
        let px = |v: f32| {
            if v.is_finite() {
                v.round().clamp(1.0, u32::MAX as f32) as u32
            } else {
                1
            }
        };
        (px(self.width), px(self.height))
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Integer rectangle in raster pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}

/// Where row 0 of a raster lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOrigin {
    TopLeft,
    BottomLeft,
}

/// Convert a normalized (top-left origin) crop rect into raster pixels.
///
/// For a bottom-left-origin raster the vertical coordinate is flipped:
/// `y = (1 - rect.y - rect.height) * height`. The result is rounded to whole
/// pixels and kept inside the extent, at least 1×1.
///
/// # Examples
/// ```
/// # use shotframe::imaging::{NormalizedRect, RasterOrigin, pixel_crop_rect};
/// let rect = NormalizedRect::new(0.1, 0.2, 0.5, 0.3);
/// let px = pixel_crop_rect(&rect, (1000, 500), RasterOrigin::BottomLeft);
/// assert_eq!((px.x, px.y, px.width, px.height), (100, 250, 500, 150));
/// ```
pub fn pixel_crop_rect(
    rect: &NormalizedRect,
    extent: (u32, u32),
    origin: RasterOrigin,
) -> PixelRect {
    let (ext_w, ext_h) = (extent.0.max(1), extent.1.max(1));
    let top = match origin {
        RasterOrigin::TopLeft => rect.y,
        RasterOrigin::BottomLeft => 1.0 - rect.y - rect.height,
    };

    let axis = |start: f32, len: f32, total: u32| {
        let scale = total as f32;
        let p0 = (start * scale).round().clamp(0.0, (total - 1) as f32) as u32;
        let len = (len * scale).round().clamp(1.0, (total - p0) as f32) as u32;
        (p0, len)
    };
    let (x, width) = axis(rect.x, rect.width, ext_w);
    let (y, height) = axis(top, rect.height, ext_h);

    PixelRect {
        x,
        y,
        width,
        height,
    }
}

/// Canvas size for a foreground with padding under an aspect constraint.
///
/// Base size is the foreground plus `2 * padding` per axis. Square takes the
/// larger side for both; a portrait ratio recomputes width from height, a
/// landscape ratio recomputes height from width. Shadow extent is not part of
/// the canvas; it gets clipped at the final composite.
///
/// # Examples
/// ```
/// # use shotframe::imaging::{AspectRatio, Size, canvas_size};
/// let canvas = canvas_size(Size::new(1000.0, 2000.0), 50.0, AspectRatio::Square);
/// assert_eq!(canvas, Size::new(2100.0, 2100.0));
/// ```
pub fn canvas_size(foreground: Size, padding: f32, aspect: AspectRatio) -> Size {
    let base = Size::new(
        foreground.width + 2.0 * padding,
        foreground.height + 2.0 * padding,
    );

    match aspect {
        AspectRatio::Free => base,
        AspectRatio::Square => {
            let side = base.width.max(base.height);
            Size::new(side, side)
        }
        AspectRatio::Portrait | AspectRatio::Landscape => match aspect.ratio() {
            Some(r) if r < 1.0 => Size::new(base.height * r, base.height),
            Some(r) if r > 1.0 => Size::new(base.width, base.width / r),
            _ => base,
        },
    }
}

/// Origin that centers `foreground` inside `canvas`.
///
/// Always called with the pre-shadow foreground size so a growing shadow
/// doesn't push the subject off-center.
pub fn centered_origin(canvas: Size, foreground: Size) -> Point {
    Point {
        x: (canvas.width - foreground.width) / 2.0,
        y: (canvas.height - foreground.height) / 2.0,
    }
}

/// Corner radius actually applied to a `width`×`height` frame.
///
/// `min(requested, min(width, height) / 2)`, never negative.
pub fn effective_corner_radius(requested: f32, width: f32, height: f32) -> f32 {
    if !requested.is_finite() || requested <= 0.0 {
        return 0.0;
    }
    requested.min(width.min(height) / 2.0).max(0.0)
}

/// Geometry of one export render, computed without touching pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub source: (u32, u32),
    /// Crop in source pixels; the full extent for an identity crop.
    pub crop: PixelRect,
    /// Foreground size after cropping (before shadow).
    pub foreground: (u32, u32),
    pub corner_radius: f32,
    pub canvas: (u32, u32),
    pub foreground_origin: Point,
}

/// Plan the export geometry for a `source`-sized image.
pub fn plan_layout(source: (u32, u32), params: &EditingParameters) -> LayoutPlan {
    let params = params.sanitized();
    let crop = if params.crop_rect.is_full_frame() {
        PixelRect {
            x: 0,
            y: 0,
            width: source.0,
            height: source.1,
        }
    } else {
        pixel_crop_rect(&params.crop_rect, source, RasterOrigin::TopLeft)
    };
    let foreground = Size::from((crop.width, crop.height));
    let canvas = canvas_size(foreground, params.padding, params.aspect_ratio);
    let (canvas_w, canvas_h) = canvas.to_pixels();

    LayoutPlan {
        source,
        crop,
        foreground: (crop.width, crop.height),
        corner_radius: effective_corner_radius(
            params.corner_radius,
            foreground.width,
            foreground.height,
        ),
        canvas: (canvas_w, canvas_h),
        foreground_origin: centered_origin(
            Size::from((canvas_w, canvas_h)),
            foreground,
        ),
    }
}
