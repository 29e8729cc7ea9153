//! The ROI entity and its category tags.

use crate::capture::RasterPayload;
use crate::error::AppError;
use crate::geometry::RoiRect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a ROI, unique within its document and increasing with
/// creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoiId(pub u64);

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tags a ROI can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "teamA")]
    TeamA,
    #[serde(rename = "teamB")]
    TeamB,
    #[serde(rename = "referee")]
    Referee,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::TeamA, Category::TeamB, Category::Referee];

    /// Stable name used in file paths and exported records.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::TeamA => "teamA",
            Category::TeamB => "teamB",
            Category::Referee => "referee",
        }
    }

    /// Human-readable label for the editor.
    pub fn label(self) -> &'static str {
        match self {
            Category::TeamA => "Team A",
            Category::TeamB => "Team B",
            Category::Referee => "Referee",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::UnknownCategory(s.to_string()))
    }
}

/// A committed region of interest.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    pub id: RoiId,
    pub rect: RoiRect,
    pub category: Option<Category>,
    /// Last accepted capture of `rect`.
    pub payload: Option<RasterPayload>,
    /// Bumped on every geometry change; captures carry the value they were
    /// taken at.
    pub generation: u64,
}

impl Roi {
    pub fn new(id: RoiId, rect: RoiRect) -> Self {
        Self {
            id,
            rect,
            category: None,
            payload: None,
            generation: 0,
        }
    }

    /// Replaces the geometry. The current payload no longer matches and is
    /// dropped, and any capture in flight is invalidated.
    pub fn set_rect(&mut self, rect: RoiRect) {
        if self.rect != rect {
            self.rect = rect;
            self.payload = None;
            self.generation += 1;
        }
    }

    /// Ready for export: tagged and captured.
    pub fn is_exportable(&self) -> bool {
        self.category.is_some() && self.payload.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("teamA".parse::<Category>().unwrap(), Category::TeamA);
        assert_eq!("REFEREE".parse::<Category>().unwrap(), Category::Referee);
        assert!(matches!(
            "goalie".parse::<Category>(),
            Err(AppError::UnknownCategory(_))
        ));
    }

    #[test]
    fn category_serializes_with_wire_names() {
        let json = serde_json::to_string(&Category::TeamB).unwrap();
        assert_eq!(json, "\"teamB\"");
    }

    #[test]
    fn geometry_change_bumps_generation() {
        let mut roi = Roi::new(RoiId(1), RoiRect::new(10.0, 10.0, 30.0, 30.0));
        roi.set_rect(RoiRect::new(10.0, 10.0, 30.0, 30.0));
        assert_eq!(roi.generation, 0);
        roi.set_rect(RoiRect::new(10.0, 10.0, 40.0, 30.0));
        assert_eq!(roi.generation, 1);
    }

    #[test]
    fn geometry_change_drops_payload() {
        let mut roi = Roi::new(RoiId(1), RoiRect::new(10.0, 10.0, 30.0, 30.0));
        roi.category = Some(Category::TeamA);
        roi.payload = Some(RasterPayload {
            width: 30,
            height: 30,
            png: vec![1],
        });

        roi.set_rect(RoiRect::new(10.0, 10.0, 30.0, 30.0));
        assert!(roi.is_exportable());

        roi.set_rect(RoiRect::new(10.0, 10.0, 50.0, 30.0));
        assert!(roi.payload.is_none());
        assert!(!roi.is_exportable());
    }
}
