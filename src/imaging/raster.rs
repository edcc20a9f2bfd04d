//! Working raster for the compositing pipeline.
//!
//! Callers hand in and get back `image::RgbaImage` (straight alpha). Inside
//! the pipeline every stage works on a `tiny_skia::Pixmap`: premultiplied
//! RGBA8, top-left origin, which is what tiny-skia's masks, gradients and
//! `draw_pixmap` compositing expect.
//!
//! | Concern | Implementation |
//! |---|---|
//! | Decode to working raster | [`to_pixmap`] (premultiply) |
//! | Back to caller raster | [`to_rgba_image`] (demultiply) |
//! | Gaussian blur | [`blur`]: three running-sum box passes per axis, rows in parallel via `rayon` |

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;
use tiny_skia::{ColorU8, IntSize, Pixmap};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },
    #[error("degenerate geometry: {0}")]
    Geometry(String),
    #[error("font error: {0}")]
    Font(String),
}

/// Longest side any working raster may have.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Allocate a transparent pixmap.
pub fn blank(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    if width > MAX_RASTER_SIDE || height > MAX_RASTER_SIDE {
        return Err(RenderError::Allocation { width, height });
    }
    Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })
}

/// Convert a straight-alpha image into a premultiplied working raster.
pub fn to_pixmap(image: &RgbaImage) -> Result<Pixmap, RenderError> {
    let mut pixmap = blank(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Convert a working raster back into a straight-alpha image.
pub fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

/// Widths of the three box passes that approximate a Gaussian of `sigma`.
///
/// Odd widths whose combined variance is as close to `sigma²` as whole
/// pixels allow. A width of 1 is a no-op pass.
fn box_sizes(sigma: f32) -> [u32; 3] {
    if !sigma.is_finite() || sigma <= 0.0 {
        return [1; 3];
    }
    let s = f64::from(sigma);
    let passes = 3.0;
    let ideal = (12.0 * s * s / passes + 1.0).sqrt();
    let mut lower = ideal.floor() as u32;
    if lower % 2 == 0 {
        lower -= 1;
    }
    let upper = lower.saturating_add(2);
    let wl = f64::from(lower);
    let lower_count =
        ((12.0 * s * s - passes * wl * wl - 4.0 * passes * wl - 3.0 * passes) / (-4.0 * wl - 4.0))
            .round();

    let mut sizes = [upper; 3];
    for (i, size) in sizes.iter_mut().enumerate() {
        if (i as f64) < lower_count {
            *size = lower;
        }
    }
    sizes
}

/// How far, in pixels, [`blur`] spreads a single pixel.
pub fn blur_radius(sigma: f32) -> u32 {
    box_sizes(sigma)
        .iter()
        .fold(0u32, |acc, size| acc.saturating_add(size / 2))
}

/// Gaussian blur of a premultiplied raster, approximated by three box passes
/// in each direction.
///
/// Each pass is a running sum, so the cost per pixel does not depend on
/// `sigma`. Edges clamp to the nearest pixel. A sigma of zero returns a copy.
pub fn blur(src: &Pixmap, sigma: f32) -> Result<Pixmap, RenderError> {
    let sizes = box_sizes(sigma);
    if sizes.iter().all(|&size| size <= 1) {
        return Ok(src.clone());
    }
    let (width, height) = (src.width(), src.height());

    let mut data = src.data().to_vec();
    box_passes(&mut data, width as usize, &sizes);
    let mut columns = transpose(&data, width as usize, height as usize);
    box_passes(&mut columns, height as usize, &sizes);
    let out = transpose(&columns, height as usize, width as usize);

    let size = IntSize::from_wh(width, height).ok_or(RenderError::Allocation { width, height })?;
    Pixmap::from_vec(out, size).ok_or(RenderError::Allocation { width, height })
}

/// Run every box pass along the rows of `data`, rows in parallel.
fn box_passes(data: &mut Vec<u8>, row_len: usize, sizes: &[u32; 3]) {
    let row_bytes = row_len * 4;
    let mut scratch = vec![0u8; data.len()];
    for &size in sizes {
        let radius = (size / 2) as usize;
        if radius == 0 {
            continue;
        }
        scratch
            .par_chunks_mut(row_bytes)
            .zip(data.par_chunks(row_bytes))
            .for_each(|(out_row, in_row)| box_row(in_row, out_row, radius));
        std::mem::swap(data, &mut scratch);
    }
}

/// Box average of one RGBA row with a sliding window of `2 * radius + 1`.
///
/// Every channel uses the same weights, so colour stays <= alpha and the
/// row stays premultiplied.
fn box_row(src: &[u8], dst: &mut [u8], radius: usize) {
    let last = src.len() / 4 - 1;
    let window = 2 * radius as u64 + 1;
    let at = |i: usize, c: usize| u64::from(src[i.min(last) * 4 + c]);

    for c in 0..4 {
        let mut acc = (radius as u64 + 1) * at(0, c)
            + (1..=radius.min(last)).map(|k| at(k, c)).sum::<u64>()
            + radius.saturating_sub(last) as u64 * at(last, c);
        for x in 0..=last {
            dst[x * 4 + c] = ((acc + window / 2) / window) as u8;
            acc += at(x.saturating_add(radius + 1), c);
            acc -= at(x.saturating_sub(radius), c);
        }
    }
}

/// Swap rows and columns of a `width`×`height` RGBA buffer.
fn transpose(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(height * 4)
        .enumerate()
        .for_each(|(x, column)| {
            for y in 0..height {
                let s = (y * width + x) * 4;
                column[y * 4..y * 4 + 4].copy_from_slice(&src[s..s + 4]);
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_opaque_pixels() {
        let img = RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 7, 255]));
        let back = to_rgba_image(&to_pixmap(&img).unwrap());
        assert_eq!(back, img);
    }

    #[test]
    fn to_pixmap_premultiplies() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
        let pixmap = to_pixmap(&img).unwrap();
        let px = pixmap.pixels()[0];
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 100);
    }

    #[test]
    fn empty_image_is_a_decode_failure() {
        let img = RgbaImage::new(0, 10);
        assert_eq!(
            to_pixmap(&img).err(),
            Some(RenderError::Allocation {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn oversized_raster_is_refused() {
        assert!(blank(MAX_RASTER_SIDE + 1, 1).is_err());
        assert!(blank(1, MAX_RASTER_SIDE).is_ok());
    }

    #[test]
    fn box_sizes_approximate_the_gaussian_variance() {
        for sigma in [2.0f32, 5.0, 20.0, 300.0] {
            let sizes = box_sizes(sigma);
            assert!(sizes.iter().all(|s| s % 2 == 1));
            let variance: f64 = sizes.iter().map(|&w| (f64::from(w).powi(2) - 1.0) / 12.0).sum();
            let target = f64::from(sigma).powi(2);
            assert!((variance - target).abs() / target < 0.2, "sigma {sigma}: {variance}");
        }
        assert_eq!(box_sizes(0.0), [1, 1, 1]);
        assert_eq!(blur_radius(2.0), 4);
    }

    #[test]
    fn huge_sigma_does_not_overflow() {
        assert_eq!(blur_radius(f32::MAX), u32::MAX);
        let pixmap = to_pixmap(&RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]))).unwrap();
        assert_eq!(blur(&pixmap, 1e9).unwrap().data(), pixmap.data());
    }

    #[test]
    fn transpose_swaps_axes() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let t = transpose(to_pixmap(&img).unwrap().data(), 3, 2);
        // (x, y) lands at (y, x) in a 2-wide buffer.
        assert_eq!(&t[(2 * 2 + 1) * 4..(2 * 2 + 1) * 4 + 2], &[2, 1]);
        assert_eq!(transpose(&t, 2, 3), to_pixmap(&img).unwrap().data());
    }

    #[test]
    fn blur_zero_sigma_is_identity() {
        let pixmap = to_pixmap(&RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 255]))).unwrap();
        assert_eq!(blur(&pixmap, 0.0).unwrap().data(), pixmap.data());
    }

    #[test]
    fn blur_constant_image_is_identity() {
        let pixmap = to_pixmap(&RgbaImage::from_pixel(6, 5, Rgba([10, 20, 30, 255]))).unwrap();
        assert_eq!(blur(&pixmap, 2.0).unwrap().data(), pixmap.data());
    }

    #[test]
    fn blur_spreads_a_single_pixel() {
        let mut img = RgbaImage::new(9, 9);
        img.put_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let blurred = blur(&to_pixmap(&img).unwrap(), 1.5).unwrap();
        let alpha = |x: u32, y: u32| blurred.pixel(x, y).unwrap().alpha();
        assert!(alpha(4, 4) < 255);
        assert!(alpha(3, 4) > 0);
        assert!(alpha(4, 6) > 0);
        assert_eq!(alpha(4, 4), blurred.pixels().iter().map(|p| p.alpha()).max().unwrap());
    }

    #[test]
    fn blur_output_stays_premultiplied() {
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            Rgba([255, (x * 30) as u8, (y * 30) as u8, if (x + y) % 2 == 0 { 255 } else { 10 }])
        });
        let blurred = blur(&to_pixmap(&img).unwrap(), 1.0).unwrap();
        for px in blurred.pixels() {
            assert!(px.red() <= px.alpha() && px.green() <= px.alpha() && px.blue() <= px.alpha());
        }
    }
}
