//! Shared test utilities for the shotframe test suite.
//!
//! Synthetic sources and pixel readers used by the imaging and editor tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = checkerboard(64, 48, 8);
//! let out = render_export(&src, &EditingParameters::default(), false);
//!
//! let pixmap = opaque_pixmap(10, 10, [255, 0, 0]);
//! assert_eq!(premul_at(&pixmap, 3, 3), [255, 0, 0, 255]);
//! ```

use image::{Rgba, RgbaImage};
use tiny_skia::{Color, Pixmap};

// =========================================================================
// Source images (caller-side, straight alpha)
// =========================================================================

/// Opaque single-colour image.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Opaque black and white checkerboard with `cell`-pixel squares.
///
/// Every pixel is either pure black or pure white, so any resampling or
/// offset shows up as an exact mismatch.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Opaque image whose red channel encodes x and green encodes y.
pub fn coordinate_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

// =========================================================================
// Working rasters (premultiplied)
// =========================================================================

/// Opaque single-colour pixmap.
pub fn opaque_pixmap(width: u32, height: u32, rgb: [u8; 3]) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).unwrap();
    pixmap.fill(Color::from_rgba8(rgb[0], rgb[1], rgb[2], 255));
    pixmap
}

/// Premultiplied RGBA at `(x, y)`. Panics when out of bounds.
pub fn premul_at(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
    let px = pixmap
        .pixel(x, y)
        .unwrap_or_else(|| panic!("({x}, {y}) outside {}x{}", pixmap.width(), pixmap.height()));
    [px.red(), px.green(), px.blue(), px.alpha()]
}
