//! Editing session: parameter state plus a debounced preview worker.
//!
//! An [`EditorSession`] owns the source image and the current
//! [`EditingParameters`]. Every setter sanitizes its input, updates the
//! parameters, bumps a monotonic generation and hands a snapshot to a single
//! background worker thread.
//!
//! ```text
//! update_*()  ──RenderRequest──▶  worker: drain until `debounce` is quiet
//!                                         render_preview(latest snapshot)
//! poll_preview() ◀──RenderedPreview──────┘
//!   publish iff result.generation == session.generation
//! ```
//!
//! Two things keep stale geometry off the display. The worker coalesces a
//! burst of requests into one render of the newest snapshot, and the owning
//! thread drops any result whose generation is no longer current when it
//! arrives.
//!
//! Exports skip the worker: [`EditorSession::export`] renders synchronously
//! from the current parameters, whatever the preview is doing.

use crate::imaging::{
    AspectRatio, BackgroundType, EditingParameters, GradientId, NormalizedRect, SolidId,
    render_export, render_preview,
};
use image::RgbaImage;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Whether the current user may export without the watermark.
pub trait Entitlement {
    fn has_premium_access(&self) -> bool;
}

impl Entitlement for bool {
    fn has_premium_access(&self) -> bool {
        *self
    }
}

/// An entitlement fixed at construction, e.g. from a CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaticEntitlement {
    premium: bool,
}

impl StaticEntitlement {
    pub const fn premium() -> Self {
        Self { premium: true }
    }

    pub const fn free() -> Self {
        Self { premium: false }
    }
}

impl Entitlement for StaticEntitlement {
    fn has_premium_access(&self) -> bool {
        self.premium
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Quiet period the worker waits for before rendering.
    pub debounce: Duration,
    /// Parameters a new session starts with and `reset` returns to.
    pub defaults: EditingParameters,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            defaults: EditingParameters::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct RenderRequest {
    generation: u64,
    params: EditingParameters,
}

/// A finished preview and the snapshot it was rendered from.
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub generation: u64,
    pub params: EditingParameters,
    pub image: RgbaImage,
}

/// Counters for what happened to worker results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewStats {
    /// Render requests sent to the worker.
    pub requested: u64,
    /// Results that became the displayed preview.
    pub published: u64,
    /// Results that arrived after a newer mutation and were dropped.
    pub discarded: u64,
}

pub struct EditorSession {
    source: Arc<RgbaImage>,
    params: EditingParameters,
    defaults: EditingParameters,
    generation: u64,
    requests: Option<Sender<RenderRequest>>,
    results: Receiver<RenderedPreview>,
    worker: Option<JoinHandle<()>>,
    preview: Option<RenderedPreview>,
    stats: PreviewStats,
}

impl EditorSession {
    /// Start a session on `source` and queue the first preview.
    pub fn new(source: RgbaImage, options: SessionOptions) -> Self {
        let source = Arc::new(source);
        let (request_tx, request_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();

        let worker_source = Arc::clone(&source);
        let debounce = options.debounce;
        let worker = thread::spawn(move || {
            preview_worker(&worker_source, debounce, &request_rx, &result_tx);
        });

        let defaults = options.defaults.sanitized();
        let mut session = Self {
            source,
            params: defaults.clone(),
            defaults,
            generation: 0,
            requests: Some(request_tx),
            results: result_rx,
            worker: Some(worker),
            preview: None,
            stats: PreviewStats::default(),
        };
        info!(
            width = session.source.width(),
            height = session.source.height(),
            debounce_ms = debounce.as_millis() as u64,
            "editing session started"
        );
        session.schedule();
        session
    }

    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    pub fn params(&self) -> &EditingParameters {
        &self.params
    }

    /// Generation of the most recent mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last published preview, if any.
    pub fn preview(&self) -> Option<&RenderedPreview> {
        self.preview.as_ref()
    }

    pub fn stats(&self) -> PreviewStats {
        self.stats
    }

    // ---- parameter mutations ----

    pub fn update_crop_rect(&mut self, rect: NormalizedRect) {
        self.mutate(|p| p.crop_rect = rect);
    }

    pub fn update_corner_radius(&mut self, radius: f32) {
        self.mutate(|p| p.corner_radius = radius);
    }

    pub fn update_padding(&mut self, padding: f32) {
        self.mutate(|p| p.padding = padding);
    }

    pub fn update_shadow_enabled(&mut self, enabled: bool) {
        self.mutate(|p| p.shadow.enabled = enabled);
    }

    pub fn update_shadow_offset(&mut self, dx: f32, dy: f32) {
        self.mutate(|p| p.shadow.offset = (dx, dy));
    }

    pub fn update_shadow_blur(&mut self, blur: f32) {
        self.mutate(|p| p.shadow.blur = blur);
    }

    pub fn update_shadow_opacity(&mut self, opacity: f32) {
        self.mutate(|p| p.shadow.opacity = opacity);
    }

    pub fn update_background_type(&mut self, background: BackgroundType) {
        self.mutate(|p| p.background = background);
    }

    pub fn update_solid_color(&mut self, color: SolidId) {
        self.mutate(|p| p.solid_color = color);
    }

    pub fn update_gradient(&mut self, gradient: GradientId) {
        self.mutate(|p| p.gradient = gradient);
    }

    pub fn update_aspect_ratio(&mut self, aspect: AspectRatio) {
        self.mutate(|p| p.aspect_ratio = aspect);
    }

    /// Return every parameter to the session defaults.
    pub fn reset(&mut self) {
        let defaults = self.defaults.clone();
        self.mutate(|p| *p = defaults);
    }

    fn mutate(&mut self, apply: impl FnOnce(&mut EditingParameters)) {
        apply(&mut self.params);
        // Out-of-range values never outlive the mutation.
        self.params = self.params.sanitized();
        self.schedule();
    }

    fn schedule(&mut self) {
        self.generation += 1;
        let request = RenderRequest {
            generation: self.generation,
            params: self.params.clone(),
        };
        if let Some(tx) = &self.requests
            && tx.send(request).is_ok()
        {
            self.stats.requested += 1;
            trace!(generation = self.generation, "preview requested");
        }
    }

    // ---- publishing ----

    /// Take any finished renders without blocking. Returns `true` when a
    /// new preview was published.
    pub fn poll_preview(&mut self) -> bool {
        let mut published = false;
        while let Ok(result) = self.results.try_recv() {
            published |= self.accept(result);
        }
        published
    }

    /// Block until the preview for the current generation is published or
    /// `timeout` elapses. Returns `true` if the current preview is up to date.
    pub fn wait_for_preview(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_preview();
            if self.is_current() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.results.recv_timeout(deadline - now) {
                Ok(result) => {
                    self.accept(result);
                }
                Err(RecvTimeoutError::Timeout) => return self.is_current(),
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn is_current(&self) -> bool {
        self.preview
            .as_ref()
            .is_some_and(|p| p.generation == self.generation)
    }

    fn accept(&mut self, result: RenderedPreview) -> bool {
        if result.generation != self.generation {
            self.stats.discarded += 1;
            debug!(
                result = result.generation,
                current = self.generation,
                "discarding stale preview"
            );
            return false;
        }
        self.stats.published += 1;
        self.preview = Some(result);
        true
    }

    // ---- export ----

    /// Render the export for the current parameters. Non-premium users get
    /// the watermark.
    pub fn export(&self, entitlement: &impl Entitlement) -> RgbaImage {
        let watermark = !entitlement.has_premium_access();
        info!(generation = self.generation, watermark, "exporting");
        render_export(&self.source, &self.params, watermark)
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("preview worker panicked");
        }
    }
}

fn preview_worker(
    source: &RgbaImage,
    debounce: Duration,
    requests: &Receiver<RenderRequest>,
    results: &Sender<RenderedPreview>,
) {
    while let Ok(mut latest) = requests.recv() {
        let mut coalesced = 0u32;
        loop {
            match requests.recv_timeout(debounce) {
                Ok(newer) => {
                    latest = newer;
                    coalesced += 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        debug!(generation = latest.generation, coalesced, "rendering preview");
        let image = render_preview(source, &latest.params);
        let rendered = RenderedPreview {
            generation: latest.generation,
            params: latest.params,
            image,
        };
        if results.send(rendered).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::MIN_CROP_EXTENT;
    use crate::test_helpers::{checkerboard, coordinate_image};

    const WAIT: Duration = Duration::from_secs(10);

    fn session(w: u32, h: u32) -> EditorSession {
        EditorSession::new(checkerboard(w, h, 4), SessionOptions::default())
    }

    #[test]
    fn new_session_publishes_initial_preview() {
        let mut s = session(40, 30);
        assert!(s.wait_for_preview(WAIT));
        let preview = s.preview().unwrap();
        assert_eq!(preview.generation, 1);
        assert_eq!(preview.image.dimensions(), (40 + 48, 30 + 48));
        assert_eq!(preview.params, EditingParameters::default());
    }

    #[test]
    fn burst_of_mutations_publishes_once_with_latest_params() {
        let mut s = session(40, 30);
        assert!(s.wait_for_preview(WAIT));
        let before = s.stats();

        s.update_padding(10.0); // A
        s.update_padding(0.0); // B

        assert!(s.wait_for_preview(WAIT));
        std::thread::sleep(Duration::from_millis(200));
        s.poll_preview();

        let after = s.stats();
        assert_eq!(after.published - before.published, 1);
        let preview = s.preview().unwrap();
        assert_eq!(preview.params.padding, 0.0);
        assert_eq!(preview.image.dimensions(), (40, 30));
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut s = session(10, 10);
        assert!(s.wait_for_preview(WAIT));
        s.update_corner_radius(3.0);
        let stale = RenderedPreview {
            generation: s.generation() - 1,
            params: EditingParameters::default(),
            image: RgbaImage::new(1, 1),
        };
        assert!(!s.accept(stale));
        assert_eq!(s.stats().discarded, 1);
        assert_ne!(s.preview().unwrap().image.dimensions(), (1, 1));
    }

    #[test]
    fn each_mutation_bumps_generation() {
        let mut s = session(10, 10);
        let g = s.generation();
        s.update_shadow_enabled(true);
        s.update_shadow_offset(2.0, -3.0);
        s.update_shadow_blur(4.0);
        s.update_shadow_opacity(0.5);
        s.update_background_type(BackgroundType::Solid);
        s.update_solid_color(SolidId::Mint);
        s.update_gradient(GradientId::Ocean);
        s.update_aspect_ratio(AspectRatio::Square);
        assert_eq!(s.generation(), g + 8);
        assert_eq!(s.stats().requested, g + 8);
        let p = s.params();
        assert!(p.shadow.enabled);
        assert_eq!(p.shadow.offset, (2.0, -3.0));
        assert_eq!(p.background, BackgroundType::Solid);
        assert_eq!(p.solid_color, SolidId::Mint);
        assert_eq!(p.gradient, GradientId::Ocean);
        assert_eq!(p.aspect_ratio, AspectRatio::Square);
    }

    #[test]
    fn setters_sanitize_values() {
        let mut s = session(10, 10);
        s.update_crop_rect(NormalizedRect::new(0.95, -1.0, 0.01, 3.0));
        let r = s.params().crop_rect;
        assert!(r.width >= MIN_CROP_EXTENT && r.height <= 1.0);
        assert!(r.x + r.width <= 1.0 + 1e-6);
        assert_eq!(r.y, 0.0);

        s.update_corner_radius(-4.0);
        s.update_padding(f32::NAN);
        s.update_shadow_blur(-1.0);
        s.update_shadow_opacity(7.0);
        let p = s.params();
        assert_eq!(p.corner_radius, 0.0);
        assert_eq!(p.padding, 0.0);
        assert_eq!(p.shadow.blur, 0.0);
        assert_eq!(p.shadow.opacity, 1.0);
    }

    #[test]
    fn reset_restores_session_defaults() {
        let defaults = EditingParameters {
            padding: 8.0,
            aspect_ratio: AspectRatio::Landscape,
            ..EditingParameters::default()
        };
        let mut s = EditorSession::new(
            checkerboard(10, 10, 2),
            SessionOptions {
                defaults: defaults.clone(),
                ..SessionOptions::default()
            },
        );
        s.update_padding(99.0);
        s.update_corner_radius(5.0);
        let g = s.generation();
        s.reset();
        assert_eq!(s.params(), &defaults);
        assert_eq!(s.generation(), g + 1);
    }

    #[test]
    fn export_watermark_follows_entitlement() {
        let s = EditorSession::new(coordinate_image(300, 200), SessionOptions::default());
        let free = s.export(&StaticEntitlement::free());
        let premium = s.export(&StaticEntitlement::premium());
        assert_eq!(free.dimensions(), premium.dimensions());
        assert_ne!(free, premium);
        assert_eq!(premium, s.export(&true));
        assert_eq!(free, render_export(s.source(), s.params(), true));
    }

    #[test]
    fn export_uses_current_params_not_preview() {
        let mut s = session(30, 20);
        s.update_padding(0.0);
        s.update_aspect_ratio(AspectRatio::Square);
        // No waiting: the preview may still be pending.
        assert_eq!(s.export(&true).dimensions(), (30, 30));
    }

    #[test]
    fn dropping_session_stops_worker() {
        let mut s = session(20, 20);
        s.update_padding(4.0);
        drop(s);
    }
}
