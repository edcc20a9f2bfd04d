//! # shotframe
//!
//! Non-destructive screenshot framing. A source image plus a set of editing
//! parameters (crop, corner radius, padding, drop shadow, background fill,
//! aspect ratio) deterministically renders into a framed image. The source is
//! never modified; every render is a pure function of
//! `(source, parameters, watermark flag)`.
//!
//! # Architecture: One Pipeline, Two Fidelities
//!
//! ```text
//! crop → round corners → drop shadow → canvas size → background
//!      → composite at centered origin → clip to canvas → watermark
//! ```
//!
//! - **Preview** ([`imaging::render_preview`]) runs while the user edits. With
//!   zero padding it stops after the corner mask.
//! - **Export** ([`imaging::render_export`]) always builds the full canvas and
//!   adds the watermark badge for users without premium access.
//!
//! Both share the geometry in [`imaging::plan_layout`]. They agree on output
//! size whenever padding is above zero or the aspect ratio is free; at zero
//! padding a constrained aspect ratio still shapes the export canvas while
//! the preview keeps the foreground's own size.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Parameters, palette, geometry, compositing stages, preview/export entry points |
//! | [`editor`] | Editing session: parameter state, debounced preview worker, stale-result discard |
//! | [`export`] | File I/O around exports: decode, render, encode, parallel batches |
//! | [`config`] | `shotframe.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Shadow Does Not Size the Canvas
//!
//! The canvas is computed from the cropped foreground, padding and aspect
//! ratio only. A large shadow simply runs off the canvas edge and is clipped.
//! Centering likewise uses the foreground size before the shadow grows it, so
//! turning the shadow on never moves the subject.
//!
//! ## Stage Failures Degrade, Renders Don't Fail
//!
//! A stage that cannot run (an allocation that is too large, degenerate
//! geometry) is logged with `tracing` and skipped; the pipeline carries on
//! with that stage's input. A source that can't be decoded comes back
//! unchanged. Render entry points therefore return an image, never an error.
//!
//! ## Newest Parameters Win
//!
//! Slider drags produce bursts of mutations. The [`editor`] worker collapses a
//! burst into one render of the latest snapshot, and the session drops any
//! result whose generation is no longer current, so an old render can never
//! overwrite a newer one.

pub mod config;
pub mod editor;
pub mod export;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
