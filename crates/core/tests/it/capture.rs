use crate::gradient;
use chrono::Utc;
use futures::future::join_all;
use image::GenericImageView;
use roi_cutter_core::capture::{self, capture_async};
use roi_cutter_core::egui::pos2;
use roi_cutter_core::export::collect_exports;
use roi_cutter_core::{Category, Config, RoiDocument, RoiRect};
use std::sync::Arc;

#[test]
fn captured_pixels_match_reference_crop() {
    let source = gradient(200, 150);
    let payload = capture::capture(Some(&source), &RoiRect::new(50.0, 50.0, 40.0, 40.0), 5)
        .expect("capture succeeds");

    assert_eq!((payload.width, payload.height), (40, 40));
    let pixels = payload.decode().unwrap();
    let reference = source.crop_imm(50, 50, 40, 40).to_rgba8();
    assert_eq!(pixels, reference);
}

#[test]
fn padding_outside_the_image_never_leaks_into_the_crop() {
    let source = gradient(64, 64);
    let pixels = capture::capture_pixels(&source, &RoiRect::new(0.0, 0.0, 10.0, 10.0), 5).unwrap();
    assert_eq!(pixels.dimensions(), (10, 10));
    for (x, y, pixel) in pixels.enumerate_pixels() {
        assert_eq!(*pixel, source.get_pixel(x, y));
    }
}

#[test]
fn missing_source_yields_no_payload() {
    assert!(capture::capture(None, &RoiRect::new(0.0, 0.0, 10.0, 10.0), 5).is_none());
}

#[tokio::test]
async fn late_capture_of_old_geometry_is_dropped() {
    let image = Arc::new(gradient(400, 300));
    let mut doc = RoiDocument::new(Config::default(), 400, 300);

    let first = doc.draw(pos2(100.0, 100.0), pos2(200.0, 200.0)).unwrap();
    let id = first.roi;
    doc.select(Some(id));
    doc.pointer_down(pos2(200.0, 200.0));
    doc.pointer_move(pos2(240.0, 220.0));
    let second = doc.pointer_up().unwrap();

    let mut outcomes = join_all([
        capture_async(first, Some(image.clone())),
        capture_async(second, Some(image.clone())),
    ])
    .await;
    let newer = outcomes.pop().unwrap();
    let older = outcomes.pop().unwrap();

    // Completion order is reversed relative to issue order.
    assert!(doc.apply_capture(newer));
    assert!(!doc.apply_capture(older));

    let payload = doc.roi(id).unwrap().payload.clone().unwrap();
    assert_eq!((payload.width, payload.height), (140, 120));
}

#[tokio::test]
async fn resized_roi_is_not_exported_with_its_old_crop() {
    let image = Arc::new(gradient(400, 300));
    let mut doc = RoiDocument::new(Config::default(), 400, 300);

    let job = doc.draw(pos2(100.0, 100.0), pos2(140.0, 140.0)).unwrap();
    let id = job.roi;
    doc.set_category(id, Some(Category::TeamA));
    assert!(doc.apply_capture(capture_async(job, Some(image.clone())).await));
    assert_eq!(collect_exports(&doc, Utc::now()).len(), 1);

    doc.select(Some(id));
    doc.pointer_down(pos2(140.0, 140.0));
    doc.pointer_move(pos2(240.0, 200.0));
    let recapture = doc.pointer_up().unwrap();

    // Recapture still pending.
    assert!(collect_exports(&doc, Utc::now()).is_empty());

    assert!(doc.apply_capture(capture_async(recapture, Some(image.clone())).await));
    let items = collect_exports(&doc, Utc::now());
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!((item.record.width, item.record.height), (140.0, 100.0));
    assert_eq!((item.payload.width, item.payload.height), (140, 100));
}
