use crate::gradient;
use chrono::{TimeZone, Utc};
use roi_cutter_core::capture::capture_async;
use roi_cutter_core::egui::pos2;
use roi_cutter_core::export::{
    collect_exports, export_rois, DirectorySink, ExportItem, ExportRecord, UploadSink, RECORDS_FILE,
};
use roi_cutter_core::{AppError, Category, Config, RoiDocument};
use std::sync::Arc;

async fn tagged_document() -> RoiDocument {
    let image = Arc::new(gradient(400, 300));
    let mut doc = RoiDocument::new(Config::default(), 400, 300);

    let a = doc.draw(pos2(20.0, 30.0), pos2(80.0, 90.0)).unwrap();
    let b = doc.draw(pos2(200.0, 150.0), pos2(260.0, 200.0)).unwrap();
    let c = doc.draw(pos2(300.0, 20.0), pos2(350.0, 70.0)).unwrap();
    doc.set_category(a.roi, Some(Category::TeamA));
    // `b` stays untagged and is skipped by export.
    doc.set_category(c.roi, Some(Category::Referee));

    for job in [a, b, c] {
        let outcome = capture_async(job, Some(image.clone())).await;
        assert!(doc.apply_capture(outcome));
    }
    doc
}

#[tokio::test]
async fn only_tagged_captured_rois_are_exported() {
    let doc = tagged_document().await;
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 7, 6).unwrap();
    let items = collect_exports(&doc, at);

    let names: Vec<_> = items.iter().map(|i| i.record.image_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["teamA_2024-03-09_08-07-06-000_0", "referee_2024-03-09_08-07-06-000_1"]
    );
    assert_eq!(items[0].record.x, 20.0 / 400.0);
    assert_eq!(items[0].record.width, 60.0);
}

#[tokio::test]
async fn directory_sink_writes_crops_and_records() {
    let doc = tagged_document().await;
    let items = collect_exports(&doc, Utc::now());
    let dir = tempfile::tempdir().unwrap();
    let mut sink = DirectorySink::new(dir.path().join("out")).unwrap();

    let mut progress = Vec::new();
    let report = export_rois(&items, &mut sink, |done, total| progress.push((done, total))).unwrap();

    assert_eq!(report.exported, 2);
    assert_eq!(progress, vec![(1, 2), (2, 2)]);
    for item in &items {
        let path = sink
            .root()
            .join(item.record.category.as_str())
            .join(format!("{}.png", item.record.image_name));
        assert!(path.exists(), "{} missing", path.display());
        let written = image::open(&path).unwrap();
        assert_eq!(
            (written.width(), written.height()),
            (item.payload.width, item.payload.height)
        );
    }

    let records = std::fs::read_to_string(sink.root().join(RECORDS_FILE)).unwrap();
    let parsed: Vec<ExportRecord> = records
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].category, Category::Referee);
}

struct FailingSink {
    calls: usize,
}

impl UploadSink for FailingSink {
    fn upload(&mut self, _item: &ExportItem) -> roi_cutter_core::Result<String> {
        self.calls += 1;
        Err(AppError::export("bucket unavailable"))
    }
}

#[tokio::test]
async fn export_stops_at_first_failure() {
    let doc = tagged_document().await;
    let items = collect_exports(&doc, Utc::now());
    let mut sink = FailingSink { calls: 0 };

    let result = export_rois(&items, &mut sink, |_, _| {});
    assert!(matches!(result, Err(AppError::Export(_))));
    assert_eq!(sink.calls, 1);
}
