//! Editing session behaviour through the public API.

use image::{Rgba, RgbaImage};
use shotframe::editor::{EditorSession, SessionOptions, StaticEntitlement};
use shotframe::imaging::{AspectRatio, EditingParameters, render_export, render_preview};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(10);

fn source() -> RgbaImage {
    RgbaImage::from_fn(64, 48, |x, y| Rgba([(x * 4) as u8, (y * 5) as u8, 90, 255]))
}

#[test]
fn mutations_inside_the_window_publish_one_render_of_the_last() {
    let mut session = EditorSession::new(source(), SessionOptions::default());
    assert!(session.wait_for_preview(WAIT));
    let published = session.stats().published;

    session.update_aspect_ratio(AspectRatio::Portrait); // A
    session.update_aspect_ratio(AspectRatio::Landscape); // B

    assert!(session.wait_for_preview(WAIT));
    std::thread::sleep(Duration::from_millis(200));
    session.poll_preview();

    assert_eq!(session.stats().published, published + 1);
    let preview = session.preview().unwrap();
    assert_eq!(preview.params.aspect_ratio, AspectRatio::Landscape);
}

#[test]
fn slider_drag_settles_on_final_value() {
    let mut session = EditorSession::new(
        source(),
        SessionOptions {
            debounce: Duration::from_millis(20),
            ..SessionOptions::default()
        },
    );
    for step in 0..=30 {
        session.update_corner_radius(step as f32);
        session.poll_preview();
    }
    assert!(session.wait_for_preview(WAIT));

    let preview = session.preview().unwrap();
    assert_eq!(preview.generation, session.generation());
    assert_eq!(preview.params.corner_radius, 30.0);
    assert_eq!(preview.image, render_preview(session.source(), session.params()));

    let stats = session.stats();
    assert_eq!(stats.requested, session.generation());
    assert!(stats.published >= 1);
}

#[test]
fn preview_and_export_agree_on_geometry() {
    let mut session = EditorSession::new(source(), SessionOptions::default());
    session.update_padding(12.0);
    session.update_aspect_ratio(AspectRatio::Square);
    assert!(session.wait_for_preview(WAIT));

    let preview = session.preview().unwrap().image.clone();
    let export = session.export(&StaticEntitlement::premium());
    assert_eq!(preview.dimensions(), export.dimensions());
    assert_eq!(preview, export);
}

#[test]
fn free_export_is_watermarked() {
    let session = EditorSession::new(source(), SessionOptions::default());
    let export = session.export(&StaticEntitlement::free());
    assert_eq!(export, render_export(session.source(), session.params(), true));
    assert_ne!(export, session.export(&StaticEntitlement::premium()));
}

#[test]
fn reset_returns_to_defaults() {
    let mut session = EditorSession::new(source(), SessionOptions::default());
    session.update_padding(80.0);
    session.update_shadow_enabled(true);
    session.reset();
    assert_eq!(session.params(), &EditingParameters::default());
    assert!(session.wait_for_preview(WAIT));
    assert_eq!(session.preview().unwrap().image.dimensions(), (64 + 48, 48 + 48));
}
