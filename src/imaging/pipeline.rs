//! Preview and export renders.
//!
//! Both entry points run the same ordered pipeline over one parameter
//! snapshot:
//!
//! ```text
//! crop → round corners → (remember frame size) → shadow → canvas size
//!      → background → composite at centered origin → clip to canvas
//!      → watermark (export only)
//! ```
//!
//! Preview stops after the corner mask when padding is zero. Export never
//! takes that shortcut.
//!
//! Rendering never fails as a whole: a stage that errors is logged and
//! skipped, and the pipeline carries on with that stage's input. If the
//! source can't even be turned into a working raster, the source comes back
//! unchanged.

use super::calculations::{RasterOrigin, Size, canvas_size, centered_origin, pixel_crop_rect};
use super::operations::{self, Bounds, ShadowedLayer};
use super::params::EditingParameters;
use super::raster::{self, RenderError};
use super::watermark;
use image::RgbaImage;
use tiny_skia::Pixmap;
use tracing::{debug, warn};

/// Which entry point is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    Preview,
    Export,
}

/// Render the live preview for `params`.
#[tracing::instrument(level = "debug", skip_all, fields(width = source.width(), height = source.height()))]
pub fn render_preview(source: &RgbaImage, params: &EditingParameters) -> RgbaImage {
    render(source, params, Fidelity::Preview, false)
}

/// Render the final export for `params`, with the watermark badge on top when
/// `watermark` is set.
#[tracing::instrument(level = "debug", skip_all, fields(width = source.width(), height = source.height(), watermark))]
pub fn render_export(source: &RgbaImage, params: &EditingParameters, watermark: bool) -> RgbaImage {
    render(source, params, Fidelity::Export, watermark)
}

fn render(
    source: &RgbaImage,
    params: &EditingParameters,
    fidelity: Fidelity,
    watermark: bool,
) -> RgbaImage {
    let frame = match raster::to_pixmap(source) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(%err, "source is not a usable raster, returning it unchanged");
            return source.clone();
        }
    };
    let mut out = compose(frame, &params.sanitized(), fidelity);
    if fidelity == Fidelity::Export && watermark {
        out = stage("watermark", out, watermark::apply_watermark);
    }
    raster::to_rgba_image(&out)
}

fn compose(mut frame: Pixmap, params: &EditingParameters, fidelity: Fidelity) -> Pixmap {
    if !params.crop_rect.is_full_frame() {
        let rect = pixel_crop_rect(
            &params.crop_rect,
            (frame.width(), frame.height()),
            RasterOrigin::TopLeft,
        );
        frame = stage("crop", frame, |f| operations::crop(f, rect));
    }

    if params.corner_radius > 0.0 {
        frame = stage("round_corners", frame, |f| {
            operations::round_corners(f, params.corner_radius)
        });
    }

    // Centering anchor: the frame before any shadow growth.
    let original = Size::from((frame.width(), frame.height()));

    if fidelity == Fidelity::Preview && params.padding == 0.0 {
        debug!("zero padding, preview skips canvas stages");
        return frame;
    }

    let canvas = canvas_size(original, params.padding, params.aspect_ratio);
    let canvas_px = canvas.to_pixels();
    let origin = centered_origin(Size::from(canvas_px), original);
    debug!(canvas_w = canvas_px.0, canvas_h = canvas_px.1, x = origin.x, y = origin.y, "canvas");

    let layer = if params.shadow.enabled {
        // Only the part of the shadow that lands on the canvas is rendered.
        let visible = Bounds::from_xywh(
            -(origin.x.round() as i64),
            -(origin.y.round() as i64),
            canvas_px.0,
            canvas_px.1,
        );
        match operations::drop_shadow(&frame, &params.shadow, Some(visible)) {
            Ok(layer) => layer,
            Err(err) => {
                warn!(stage = "drop_shadow", %err, "stage failed, keeping its input");
                ShadowedLayer::flat(frame)
            }
        }
    } else {
        ShadowedLayer::flat(frame)
    };

    let background = operations::background(canvas_px, params).or_else(|err| {
        warn!(stage = "background", %err, "stage failed, compositing on transparent canvas");
        raster::blank(canvas_px.0, canvas_px.1)
    });
    match background {
        // Drawing into the canvas-sized background is the canvas crop: anything
        // outside it, shadow included, is clipped.
        Ok(background) => operations::composite(background, &layer, origin),
        Err(err) => {
            warn!(stage = "composite", %err, "no canvas, returning the foreground layer");
            layer.pixmap
        }
    }
}

/// Run one stage; on failure log it and hand back the stage's input.
fn stage<F>(name: &'static str, input: Pixmap, op: F) -> Pixmap
where
    F: FnOnce(&Pixmap) -> Result<Pixmap, RenderError>,
{
    match op(&input) {
        Ok(out) => out,
        Err(err) => {
            warn!(stage = name, %err, "stage failed, keeping its input");
            input
        }
    }
}
