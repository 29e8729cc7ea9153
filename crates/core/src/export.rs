//! Export of tagged, captured ROIs to an upload collaborator.
//!
//! The engine does no network I/O. It assembles [`ExportItem`]s (PNG bytes
//! plus a portable [`ExportRecord`]) and hands them one by one to an
//! [`UploadSink`]. [`DirectorySink`] is the bundled sink: it lays crops out
//! on disk the way the storage bucket does (`<category>/<name>.png`) and keeps
//! the records in a JSON-lines file.

use crate::capture::RasterPayload;
use crate::document::RoiDocument;
use crate::error::{AppError, Result};
use crate::roi::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File the directory sink appends records to.
pub const RECORDS_FILE: &str = "rois.jsonl";

/// Geometry and metadata persisted for each exported ROI.
///
/// `x` and `y` are fractions of the image width/height so records stay
/// meaningful across image sizes; `width` and `height` are in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub roi_id: u64,
    pub image_name: String,
    pub category: Category,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One crop ready for upload.
#[derive(Clone, Debug)]
pub struct ExportItem {
    pub record: ExportRecord,
    pub payload: RasterPayload,
}

/// Receives exported crops. Implementations own all I/O and its failures.
pub trait UploadSink {
    /// Stores one crop and returns where it ended up (URL, path, key...).
    fn upload(&mut self, item: &ExportItem) -> Result<String>;
}

/// Summary of a finished export run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportReport {
    pub exported: usize,
    pub locations: Vec<String>,
}

/// `2024-05-01T12:30:45.123Z` becomes `2024-05-01_12-30-45-123`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d_%H-%M-%S-%3f").to_string()
}

pub fn image_name(category: Category, index: usize, timestamp: &str) -> String {
    format!("{}_{}_{}", category, timestamp, index)
}

/// Builds export items for every ROI that has both a category and a payload.
/// Indices in the generated names count exportable ROIs only.
pub fn collect_exports(document: &RoiDocument, at: DateTime<Utc>) -> Vec<ExportItem> {
    let (image_w, image_h) = document.image_size();
    let timestamp = format_timestamp(at);

    document
        .rois()
        .iter()
        .filter_map(|roi| Some((roi, roi.category?, roi.payload.as_ref()?)))
        .enumerate()
        .map(|(index, (roi, category, payload))| ExportItem {
            record: ExportRecord {
                roi_id: roi.id.0,
                image_name: image_name(category, index, &timestamp),
                category,
                x: roi.rect.x / image_w as f32,
                y: roi.rect.y / image_h as f32,
                width: roi.rect.width,
                height: roi.rect.height,
            },
            payload: payload.clone(),
        })
        .collect()
}

/// Uploads items in order, reporting `(done, total)` after each one.
///
/// Stops at the first failing upload.
pub fn export_rois(
    items: &[ExportItem],
    sink: &mut dyn UploadSink,
    mut progress: impl FnMut(usize, usize),
) -> Result<ExportReport> {
    let total = items.len();
    let mut report = ExportReport::default();

    for (index, item) in items.iter().enumerate() {
        let location = sink.upload(item).map_err(|e| {
            tracing::error!(image = %item.record.image_name, "Upload failed: {}", e);
            e
        })?;
        tracing::info!(image = %item.record.image_name, %location, "Exported {}/{}", index + 1, total);
        report.locations.push(location);
        report.exported += 1;
        progress(index + 1, total);
    }

    Ok(report)
}

/// Writes crops under a root directory.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Creates the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn append_record(&self, record: &ExportRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(RECORDS_FILE))?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl UploadSink for DirectorySink {
    fn upload(&mut self, item: &ExportItem) -> Result<String> {
        let dir = self.root.join(item.record.category.as_str());
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.png", item.record.image_name));
        fs::write(&path, &item.payload.png)
            .map_err(|e| AppError::export(format!("{}: {}", path.display(), e)))?;
        self.append_record(&item.record)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_matches_storage_naming() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(format_timestamp(at), "2024-05-01_12-30-45-123");
        assert_eq!(
            image_name(Category::TeamB, 2, "2024-05-01_12-30-45-123"),
            "teamB_2024-05-01_12-30-45-123_2"
        );
    }

    #[test]
    fn record_serializes_category_wire_name() {
        let record = ExportRecord {
            roi_id: 4,
            image_name: "referee_x_0".into(),
            category: Category::Referee,
            x: 0.25,
            y: 0.5,
            width: 40.0,
            height: 30.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["category"], "referee");
        assert_eq!(json["x"], 0.25);
    }
}
