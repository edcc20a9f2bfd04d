//! Individual compositing stages.
//!
//! Each stage is a pure function from an input raster to a new raster; none
//! of them mutate their input. The [`pipeline`](super::pipeline) decides which
//! stages run and in what order, and what to do when one fails.

use super::calculations::{PixelRect, Point, effective_corner_radius};
use super::params::{BackgroundType, EditingParameters, ShadowSettings};
use super::raster::{self, RenderError};
use tiny_skia::{
    FillRule, IntRect, LinearGradient, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, SpreadMode, Transform,
};

/// Bezier control distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Result type for compositing stages.
pub type Result<T> = std::result::Result<T, RenderError>;

/// A foreground layer, possibly grown to make room for a shadow.
///
/// `inset` is where the unshadowed frame sits inside `pixmap`; placing the
/// layer at `origin - inset` puts the frame itself at `origin`. It goes
/// negative when the layer was clipped through the frame.
#[derive(Debug, Clone)]
pub struct ShadowedLayer {
    pub pixmap: Pixmap,
    pub inset: (i32, i32),
}

impl ShadowedLayer {
    /// A layer with no shadow margin.
    pub fn flat(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            inset: (0, 0),
        }
    }
}

/// Half-open pixel bounds in the frame's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Bounds {
    pub fn from_xywh(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add(i64::from(width)),
            bottom: y.saturating_add(i64::from(height)),
        }
    }

    fn translate(self, dx: i64, dy: i64) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            right: self.right.saturating_add(dx),
            bottom: self.bottom.saturating_add(dy),
        }
    }

    fn expand(self, by: i64) -> Self {
        Self {
            left: self.left.saturating_sub(by),
            top: self.top.saturating_sub(by),
            right: self.right.saturating_add(by),
            bottom: self.bottom.saturating_add(by),
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn intersect(self, other: Self) -> Option<Self> {
        let out = Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (out.left < out.right && out.top < out.bottom).then_some(out)
    }

    fn size(self) -> Result<(u32, u32)> {
        let side = |len: i64| u32::try_from(len).map_err(|_| geometry("shadow layer too large"));
        Ok((
            side(self.right.saturating_sub(self.left))?,
            side(self.bottom.saturating_sub(self.top))?,
        ))
    }
}

/// Copy out a sub-rectangle.
pub fn crop(src: &Pixmap, rect: PixelRect) -> Result<Pixmap> {
    let int_rect = IntRect::from_xywh(
        i32::try_from(rect.x).map_err(|_| geometry("crop x out of range"))?,
        i32::try_from(rect.y).map_err(|_| geometry("crop y out of range"))?,
        rect.width,
        rect.height,
    )
    .ok_or_else(|| geometry("empty crop rectangle"))?;
    src.clone_rect(int_rect)
        .ok_or_else(|| geometry("crop rectangle outside the frame"))
}

/// Rounded rectangle outline; the radius is clamped to half the short side.
pub(crate) fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = effective_corner_radius(radius, w, h);
    if r <= 0.0 {
        return Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect);
    }
    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Mask the frame with an anti-aliased rounded rectangle.
pub fn round_corners(src: &Pixmap, radius: f32) -> Result<Pixmap> {
    let (w, h) = (src.width(), src.height());
    if effective_corner_radius(radius, w as f32, h as f32) <= 0.0 {
        return Ok(src.clone());
    }
    let path = rounded_rect_path(0.0, 0.0, w as f32, h as f32, radius)
        .ok_or_else(|| geometry("cannot build corner mask path"))?;
    let mut mask = Mask::new(w, h).ok_or(RenderError::Allocation {
        width: w,
        height: h,
    })?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());

    let mut out = src.clone();
    out.apply_mask(&mask);
    Ok(out)
}

/// Black copy of `src` with alpha scaled by `opacity`.
fn silhouette(src: &Pixmap, opacity: f32) -> Result<Pixmap> {
    let mut out = raster::blank(src.width(), src.height())?;
    for (dst, px) in out.pixels_mut().iter_mut().zip(src.pixels()) {
        let alpha = (f32::from(px.alpha()) * opacity).round() as u8;
        *dst = PremultipliedColorU8::from_rgba(0, 0, 0, alpha)
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
    Ok(out)
}

/// Put a blurred, offset black shadow behind the frame.
///
/// Unclipped, the layer covers the frame plus everything the blurred shadow
/// reaches. With `visible` set (the canvas, in frame coordinates), only that
/// window is allocated and blurred; the pixels it keeps are the same as the
/// unclipped layer's.
pub fn drop_shadow(
    src: &Pixmap,
    shadow: &ShadowSettings,
    visible: Option<Bounds>,
) -> Result<ShadowedLayer> {
    let shadow = shadow.sanitized();
    let reach = i64::from(raster::blur_radius(shadow.blur));
    let (dx, dy) = (
        shadow.offset.0.round() as i64,
        shadow.offset.1.round() as i64,
    );

    let frame = Bounds::from_xywh(0, 0, src.width(), src.height());
    let full = frame.union(frame.translate(dx, dy).expand(reach));
    let layer = match visible {
        Some(window) => full
            .intersect(window)
            .ok_or_else(|| geometry("shadow layer outside the canvas"))?,
        None => full,
    };
    // The blur reads up to `reach` pixels past the layer; beyond `full` there
    // is nothing to read.
    let work = layer
        .expand(reach)
        .intersect(full)
        .ok_or_else(|| geometry("empty shadow layer"))?;

    let (work_w, work_h) = work.size()?;
    let mut scratch = raster::blank(work_w, work_h)?;
    let paint = PixmapPaint::default();
    scratch.draw_pixmap(
        to_i32(dx.saturating_sub(work.left))?,
        to_i32(dy.saturating_sub(work.top))?,
        silhouette(src, shadow.opacity)?.as_ref(),
        &paint,
        Transform::identity(),
        None,
    );
    let blurred = raster::blur(&scratch, shadow.blur)?;

    let (layer_w, layer_h) = layer.size()?;
    let mut out = crop(
        &blurred,
        PixelRect {
            x: (layer.left - work.left) as u32,
            y: (layer.top - work.top) as u32,
            width: layer_w,
            height: layer_h,
        },
    )?;
    let inset = (
        to_i32(layer.left.saturating_neg())?,
        to_i32(layer.top.saturating_neg())?,
    );
    out.draw_pixmap(
        inset.0,
        inset.1,
        src.as_ref(),
        &paint,
        Transform::identity(),
        None,
    );

    Ok(ShadowedLayer { pixmap: out, inset })
}

/// Paint the canvas background: a flat palette colour or a diagonal gradient
/// from the top-left corner to the bottom-right corner.
pub fn background(size: (u32, u32), params: &EditingParameters) -> Result<Pixmap> {
    let (w, h) = size;
    let mut canvas = raster::blank(w, h)?;
    match params.background {
        BackgroundType::Solid => canvas.fill(params.solid_color.color().to_skia()),
        BackgroundType::Gradient => {
            let stops = params
                .gradient
                .stops()
                .iter()
                .map(|s| tiny_skia::GradientStop::new(s.position, s.color.to_skia()))
                .collect();
            let shader = LinearGradient::new(
                tiny_skia::Point::from_xy(0.0, 0.0),
                tiny_skia::Point::from_xy(w as f32, h as f32),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )
            .ok_or_else(|| geometry("cannot build background gradient"))?;
            let paint = Paint {
                shader,
                anti_alias: false,
                ..Paint::default()
            };
            let rect = Rect::from_xywh(0.0, 0.0, w as f32, h as f32)
                .ok_or_else(|| geometry("empty canvas"))?;
            canvas.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
    Ok(canvas)
}

/// Draw `layer` over `canvas` so its unshadowed frame lands at `origin`.
///
/// The canvas keeps its size: anything that falls outside it, usually shadow,
/// is clipped here.
pub fn composite(mut canvas: Pixmap, layer: &ShadowedLayer, origin: Point) -> Pixmap {
    let x = (origin.x.round() as i32).saturating_sub(layer.inset.0);
    let y = (origin.y.round() as i32).saturating_sub(layer.inset.1);
    canvas.draw_pixmap(
        x,
        y,
        layer.pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    canvas
}

fn to_i32(v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| geometry("shadow offset out of range"))
}

fn geometry(msg: &str) -> RenderError {
    RenderError::Geometry(msg.to_string())
}
