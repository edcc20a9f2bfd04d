//! Parameter types for a render.
//!
//! These structs describe *what* the finished frame should look like, not
//! *how* to paint it. An [`EditingParameters`] value is a complete snapshot:
//! the editor copies it on every mutation and every render reads exactly one
//! snapshot, so renders never observe a half-applied edit.
//!
//! ## Types
//!
//! - [`NormalizedRect`] — crop rectangle in `[0,1]` image-relative coordinates, top-left origin.
//! - [`ShadowSettings`] — drop shadow gate, offset, blur and opacity. Colour is always black.
//! - [`BackgroundType`] — solid fill or linear gradient, picked from the [palette](super::palette).
//! - [`AspectRatio`] — canvas constraint: square, 9:16, 16:9 or free.
//! - [`EditingParameters`] — the whole snapshot, with the session defaults.

use super::palette::{GradientId, SolidId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest crop extent the editor allows, as a fraction of the image.
pub const MIN_CROP_EXTENT: f32 = 0.1;

/// Tolerance used when deciding whether a crop is the identity.
const FULL_FRAME_EPSILON: f32 = 1e-4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown aspect ratio '{0}' (expected square, portrait, landscape or free)")]
    AspectRatio(String),
    #[error("unknown background type '{0}' (expected solid or gradient)")]
    BackgroundType(String),
    #[error("invalid rectangle '{0}' (expected x,y,width,height)")]
    Rect(String),
}

/// Rectangle in normalized image coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_full_frame(&self) -> bool {
        self.x.abs() < FULL_FRAME_EPSILON
            && self.y.abs() < FULL_FRAME_EPSILON
            && (self.width - 1.0).abs() < FULL_FRAME_EPSILON
            && (self.height - 1.0).abs() < FULL_FRAME_EPSILON
    }

    /// Clamp into the unit square with each extent at least `min_extent`.
    ///
    /// Extents are fixed first, then the origin is pulled back so the rect
    /// stays inside `[0,1]`. Non-finite values fall back to the full frame.
    pub fn clamped(&self, min_extent: f32) -> Self {
        let min_extent = min_extent.clamp(0.0, 1.0);
        let axis = |origin: f32, extent: f32, full: f32| {
            let extent = if extent.is_finite() { extent } else { full };
            let extent = extent.clamp(min_extent, 1.0);
            let origin = if origin.is_finite() { origin } else { 0.0 };
            (origin.clamp(0.0, 1.0 - extent), extent)
        };
        let (x, width) = axis(self.x, self.width, 1.0);
        let (y, height) = axis(self.y, self.height, 1.0);
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl FromStr for NormalizedRect {
    type Err = ParseError;

    /// Parses `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = s
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseError::Rect(s.to_string()))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(ParseError::Rect(s.to_string())),
        }
    }
}

/// Largest shadow blur sigma, in pixels. Wider shadows are indistinguishable
/// from a flat tint at any canvas size.
pub const MAX_SHADOW_BLUR: f32 = 500.0;

/// Drop shadow settings. The shadow is always black; only its alpha varies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Offset in pixels as `(dx, dy)`; positive y moves the shadow down.
    pub offset: (f32, f32),
    /// Gaussian sigma in pixels, at most [`MAX_SHADOW_BLUR`].
    pub blur: f32,
    /// Shadow alpha in `[0,1]`.
    pub opacity: f32,
}

impl ShadowSettings {
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self {
            enabled: self.enabled,
            offset: (finite_or(self.offset.0, 0.0), finite_or(self.offset.1, 0.0)),
            blur: finite_or(self.blur, 0.0).clamp(0.0, MAX_SHADOW_BLUR),
            opacity: finite_or(self.opacity, 0.0).clamp(0.0, 1.0),
        }
    }
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            offset: (0.0, 10.0),
            blur: 20.0,
            opacity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundType {
    Solid,
    #[default]
    Gradient,
}

impl FromStr for BackgroundType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(Self::Solid),
            "gradient" => Ok(Self::Gradient),
            _ => Err(ParseError::BackgroundType(s.to_string())),
        }
    }
}

impl fmt::Display for BackgroundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackgroundType::Solid => "solid",
            BackgroundType::Gradient => "gradient",
        })
    }
}

/// Canvas aspect constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 1:1
    Square,
    /// 9:16
    Portrait,
    /// 16:9
    Landscape,
    #[default]
    Free,
}

impl AspectRatio {
    /// Width divided by height, or `None` when unconstrained.
    pub fn ratio(self) -> Option<f32> {
        match self {
            AspectRatio::Square => Some(1.0),
            AspectRatio::Portrait => Some(9.0 / 16.0),
            AspectRatio::Landscape => Some(16.0 / 9.0),
            AspectRatio::Free => None,
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" | "1:1" => Ok(Self::Square),
            "portrait" | "9:16" => Ok(Self::Portrait),
            "landscape" | "16:9" => Ok(Self::Landscape),
            "free" => Ok(Self::Free),
            _ => Err(ParseError::AspectRatio(s.to_string())),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AspectRatio::Square => "square",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Landscape => "landscape",
            AspectRatio::Free => "free",
        })
    }
}

/// Everything a render needs besides the source pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingParameters {
    pub crop_rect: NormalizedRect,
    /// Corner radius in source pixels; 0 disables rounding.
    pub corner_radius: f32,
    /// Padding in output pixels on every side.
    pub padding: f32,
    pub shadow: ShadowSettings,
    pub background: BackgroundType,
    pub solid_color: SolidId,
    pub gradient: GradientId,
    pub aspect_ratio: AspectRatio,
}

impl EditingParameters {
    /// Copy with every field forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let non_negative = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            crop_rect: self.crop_rect.clamped(MIN_CROP_EXTENT),
            corner_radius: non_negative(self.corner_radius),
            padding: non_negative(self.padding),
            shadow: self.shadow.sanitized(),
            ..self.clone()
        }
    }
}

impl Default for EditingParameters {
    fn default() -> Self {
        Self {
            crop_rect: NormalizedRect::FULL,
            corner_radius: 0.0,
            padding: 24.0,
            shadow: ShadowSettings::default(),
            background: BackgroundType::Gradient,
            solid_color: SolidId::default(),
            gradient: GradientId::default(),
            aspect_ratio: AspectRatio::Free,
        }
    }
}
