//! Image compositing, pure Rust.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Working raster** | `tiny_skia::Pixmap`, premultiplied, top-left origin |
//! | **Crop / corner mask** | `Pixmap::clone_rect`, `tiny_skia::Mask` |
//! | **Shadow blur** | three-pass box approximation of a Gaussian, rows in parallel via `rayon` |
//! | **Background** | palette colours, `tiny_skia::LinearGradient` |
//! | **Watermark text** | `fontdue` glyph layout over a bundled font |
//!
//! The module is split into:
//! - **Parameters**: the editing state a render reads ([`EditingParameters`])
//! - **Palette**: named solid colours and gradients
//! - **Calculations**: pure geometry (crop rects, canvas size, centering)
//! - **Operations**: one function per compositing stage
//! - **Pipeline**: [`render_preview`] and [`render_export`], which order the
//!   stages and absorb stage failures

mod calculations;
pub mod operations;
pub mod palette;
mod params;
mod pipeline;
pub mod raster;
mod watermark;

pub use calculations::{
    LayoutPlan, PixelRect, Point, RasterOrigin, Size, canvas_size, centered_origin,
    effective_corner_radius, pixel_crop_rect, plan_layout,
};
pub use palette::{GradientId, PaletteError, SolidId};
pub use params::{
    AspectRatio, BackgroundType, EditingParameters, MAX_SHADOW_BLUR, MIN_CROP_EXTENT, NormalizedRect, ParseError,
    ShadowSettings,
};
pub use pipeline::{Fidelity, render_export, render_preview};
pub use raster::RenderError;
pub use watermark::{WATERMARK_LABEL, watermark_rect};
