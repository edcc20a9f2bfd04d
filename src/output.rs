//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Render / Batch
//!
//! ```text
//! 001 shot.png → out/shot.png
//!     Size: 1000x2000 → 2100x2100
//!     Watermark: yes
//! 002 broken.png
//!     Error: Source image not found: broken.png
//!
//! 1 exported, 1 failed
//! ```
//!
//! ## Palette
//!
//! ```text
//! Solid colors
//!     white       #ffffff
//!     black       #000000
//!
//! Gradients
//!     sunset      #ff5e62 → #ffc371
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::export::{BatchSummary, ExportEvent, ExportReport};
use crate::imaging::palette::{self, PaletteEntry};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ============================================================================
// Render / batch output
// ============================================================================

/// Format one finished export.
pub fn format_export_report(index: usize, report: &ExportReport) -> Vec<String> {
    let (sw, sh) = report.source_size;
    let (cw, ch) = report.canvas_size;
    vec![
        format!(
            "{} {} → {}",
            format_index(index),
            file_name(&report.source),
            report.output.display()
        ),
        format!("    Size: {}x{} → {}x{}", sw, sh, cw, ch),
        format!("    Watermark: {}", yes_no(report.watermark)),
    ]
}

/// Format a batch progress event.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Exported { index, report } => format_export_report(*index, report),
        ExportEvent::Failed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("    Error: {}", error),
        ],
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

/// Print a single export to stdout.
pub fn print_export_report(report: &ExportReport) {
    for line in format_export_report(1, report) {
        println!("{}", line);
    }
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Palette output
// ============================================================================

/// Format the palette catalogue: solids first, then gradients with their
/// stops in order.
pub fn format_palette() -> Vec<String> {
    let entries = palette::entries();
    let mut solids = Vec::new();
    let mut gradients = Vec::new();
    for entry in &entries {
        match entry {
            PaletteEntry::Solid(id) => {
                solids.push(format!("    {:<10}  {}", id.name(), id.color().hex()));
            }
            PaletteEntry::Gradient(id) => {
                let stops: Vec<String> = id.stops().iter().map(|s| s.color.hex()).collect();
                gradients.push(format!("    {:<10}  {}", id.name(), stops.join(" → ")));
            }
        }
    }

    let mut lines = vec!["Solid colors".to_string()];
    lines.extend(solids);
    lines.push(String::new());
    lines.push("Gradients".to_string());
    lines.extend(gradients);
    lines
}

pub fn print_palette() {
    for line in format_palette() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{GradientId, SolidId};
    use std::path::PathBuf;

    fn report() -> ExportReport {
        ExportReport {
            source: PathBuf::from("shots/shot.png"),
            output: PathBuf::from("out/shot.png"),
            source_size: (1000, 2000),
            canvas_size: (2100, 2100),
            watermark: true,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn export_report_lines() {
        assert_eq!(
            format_export_report(1, &report()),
            vec![
                "001 shot.png → out/shot.png",
                "    Size: 1000x2000 → 2100x2100",
                "    Watermark: yes",
            ]
        );
    }

    #[test]
    fn failed_event_shows_error() {
        let lines = format_export_event(&ExportEvent::Failed {
            index: 2,
            source: PathBuf::from("broken.png"),
            error: "boom".into(),
        });
        assert_eq!(lines, vec!["002 broken.png", "    Error: boom"]);
    }

    #[test]
    fn batch_summary_line() {
        let lines = format_batch_summary(&BatchSummary {
            exported: 3,
            failed: 1,
        });
        assert_eq!(lines.last().unwrap(), "3 exported, 1 failed");
    }

    #[test]
    fn palette_lists_every_entry() {
        let lines = format_palette();
        assert_eq!(lines[0], "Solid colors");
        assert_eq!(
            lines.len(),
            SolidId::ALL.len() + GradientId::ALL.len() + 3
        );
        assert!(lines.iter().any(|l| l.trim_start().starts_with("white")));
        let aurora = lines
            .iter()
            .find(|l| l.trim_start().starts_with("aurora"))
            .unwrap();
        assert_eq!(aurora.matches('→').count(), 2);
    }
}
