use roi_cutter_core::egui::pos2;
use roi_cutter_core::session::Mode;
use roi_cutter_core::{Config, Handle, RoiDocument, RoiRect};

fn document() -> RoiDocument {
    RoiDocument::new(Config::default(), 800, 600)
}

fn assert_within_constraints(doc: &RoiDocument) {
    let config = doc.config();
    let (w, h) = doc.image_size();
    let pad = config.capture_padding;
    for roi in doc.rois() {
        let r = roi.rect;
        assert!(r.width >= config.min_roi_size - 1e-3, "{:?} too narrow", r);
        assert!(r.height >= config.min_roi_size - 1e-3, "{:?} too short", r);
        assert!(r.x >= pad - 1e-3 && r.y >= pad - 1e-3, "{:?} past top/left", r);
        assert!(r.right() <= w as f32 - pad + 1e-3, "{:?} past right", r);
        assert!(r.bottom() <= h as f32 - pad + 1e-3, "{:?} past bottom", r);
    }
}

#[test]
fn drag_draws_one_roi() {
    let mut doc = document();
    doc.pointer_down(pos2(50.0, 50.0));
    doc.pointer_move(pos2(150.0, 120.0));
    let job = doc.pointer_up().expect("release commits the draft");

    assert_eq!(doc.rois().len(), 1);
    assert_eq!(doc.rois()[0].rect, RoiRect::new(50.0, 50.0, 100.0, 70.0));
    assert_eq!(job.rect, doc.rois()[0].rect);
}

#[test]
fn reverse_drag_is_normalized() {
    let mut doc = document();
    doc.draw(pos2(150.0, 120.0), pos2(50.0, 50.0));
    assert_eq!(doc.rois()[0].rect, RoiRect::new(50.0, 50.0, 100.0, 70.0));
}

#[test]
fn click_without_drag_yields_minimum_roi() {
    let mut doc = document();
    doc.draw(pos2(300.0, 300.0), pos2(300.0, 300.0));
    assert_eq!(doc.rois()[0].rect, RoiRect::new(300.0, 300.0, 20.0, 20.0));
}

#[test]
fn draw_past_image_edge_is_clamped() {
    let mut doc = document();
    doc.draw(pos2(780.0, 590.0), pos2(900.0, 700.0));
    assert_within_constraints(&doc);
}

#[test]
fn click_inside_selects_and_corner_drag_resizes() {
    let mut doc = document();
    let id = doc.draw(pos2(100.0, 100.0), pos2(200.0, 200.0)).unwrap().roi;

    doc.pointer_down(pos2(150.0, 150.0));
    doc.pointer_up();
    assert_eq!(doc.session().selected, Some(id));
    assert_eq!(doc.rois().len(), 1);

    doc.pointer_down(pos2(198.0, 198.0));
    assert_eq!(doc.session().active_handle(), Some(Handle::BottomRight));
    doc.pointer_move(pos2(260.0, 230.0));
    let job = doc.pointer_up().expect("resize triggers a recapture");

    let rect = doc.roi(id).unwrap().rect;
    assert_eq!(rect, RoiRect::new(100.0, 100.0, 160.0, 130.0));
    assert_eq!(job.rect, rect);
    assert_eq!(doc.session().mode, Mode::Idle);
}

#[test]
fn resize_cannot_collapse_below_minimum() {
    let mut doc = document();
    let id = doc.draw(pos2(100.0, 100.0), pos2(200.0, 200.0)).unwrap().roi;
    doc.select(Some(id));

    doc.pointer_down(pos2(100.0, 100.0));
    doc.pointer_move(pos2(400.0, 400.0));
    doc.pointer_up();

    assert_eq!(doc.roi(id).unwrap().rect, RoiRect::new(180.0, 180.0, 20.0, 20.0));
}

/// Small deterministic generator so gesture sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn coord(&mut self, max: f32) -> f32 {
        // Reach a little past the image on both sides.
        (self.next() % (max as u64 + 200)) as f32 - 100.0
    }
}

#[test]
fn arbitrary_gestures_keep_every_roi_valid() {
    let mut doc = document();
    let mut rng = Lcg(7);

    for _ in 0..400 {
        let p = pos2(rng.coord(800.0), rng.coord(600.0));
        match rng.next() % 4 {
            0 => {
                doc.pointer_down(p);
            }
            1 | 2 => {
                doc.pointer_move(p);
            }
            _ => {
                doc.pointer_up();
            }
        }
        assert_within_constraints(&doc);
    }

    assert!(!doc.rois().is_empty());
}
