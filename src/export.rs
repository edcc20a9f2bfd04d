//! File-level export: decode, render, encode.
//!
//! Wraps [`render_export`] with image I/O for the CLI. Single files go through
//! [`export_file`]; [`export_batch`] fans a list of inputs out over the rayon
//! pool and reports each result on an optional channel as it finishes.
//!
//! ## Output Format
//!
//! The encoder is chosen from the output file extension. Formats without an
//! alpha channel (JPEG) get the export flattened to RGB; the canvas is opaque
//! anyway unless the corner mask cut through a zero-padding export.
//!
//! Batch outputs are written as `<out_dir>/<input stem>.png`.

use crate::editor::Entitlement;
use crate::imaging::{EditingParameters, render_export};
use image::{DynamicImage, ImageFormat, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// What one export produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub source_size: (u32, u32),
    pub canvas_size: (u32, u32),
    pub watermark: bool,
}

/// Progress event emitted by [`export_batch`].
#[derive(Debug, Clone)]
pub enum ExportEvent {
    Exported {
        index: usize,
        report: ExportReport,
    },
    Failed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub exported: usize,
    pub failed: usize,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} exported, {} failed", self.exported, self.failed)
    }
}

/// Decode an image file into the straight-alpha source raster.
pub fn load_source(path: &Path) -> Result<RgbaImage, ExportError> {
    if !path.exists() {
        return Err(ExportError::SourceNotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_rgba8())
}

/// Encode `image` to `path`, picking the format from the extension.
pub fn save_image(image: RgbaImage, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    match ImageFormat::from_path(path)? {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image).to_rgb8().save(path)?,
        _ => image.save(path)?,
    }
    Ok(())
}

/// Render `input` with `params` and write the export to `output`.
pub fn export_file(
    input: &Path,
    output: &Path,
    params: &EditingParameters,
    entitlement: &impl Entitlement,
) -> Result<ExportReport, ExportError> {
    let source = load_source(input)?;
    let watermark = !entitlement.has_premium_access();
    let rendered = render_export(&source, params, watermark);
    let report = ExportReport {
        source: input.to_path_buf(),
        output: output.to_path_buf(),
        source_size: source.dimensions(),
        canvas_size: rendered.dimensions(),
        watermark,
    };
    save_image(rendered, output)?;
    tracing::info!(
        source = %input.display(),
        output = %output.display(),
        width = report.canvas_size.0,
        height = report.canvas_size.1,
        "exported"
    );
    Ok(report)
}

/// Where [`export_batch`] writes the export of `input`.
pub fn batch_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    out_dir.join(format!("{stem}.png"))
}

/// Export every input in parallel. A failed file does not stop the batch.
pub fn export_batch(
    inputs: &[PathBuf],
    out_dir: &Path,
    params: &EditingParameters,
    entitlement: &(impl Entitlement + Sync),
    events: Option<Sender<ExportEvent>>,
) -> BatchSummary {
    let outcomes: Vec<bool> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            let index = i + 1;
            let output = batch_output_path(input, out_dir);
            let event = match export_file(input, &output, params, entitlement) {
                Ok(report) => ExportEvent::Exported { index, report },
                Err(err) => {
                    tracing::warn!(source = %input.display(), %err, "export failed");
                    ExportEvent::Failed {
                        index,
                        source: input.clone(),
                        error: err.to_string(),
                    }
                }
            };
            let ok = matches!(event, ExportEvent::Exported { .. });
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
            ok
        })
        .collect();

    let exported = outcomes.iter().filter(|ok| **ok).count();
    BatchSummary {
        exported,
        failed: outcomes.len() - exported,
    }
}
