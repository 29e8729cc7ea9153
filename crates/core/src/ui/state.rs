//! UI state types and event definitions.
//!
//! This module contains the editor's export state machine and the events the
//! background export thread sends back to the UI thread.

use crate::export::ExportReport;

/// Export status shown in the side panel.
///
/// `Idle` -> `Exporting` -> `Exported` (success) or `Error` (failure);
/// starting a new export from either end state goes back to `Exporting`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum UiState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Uploading crops.
    Exporting {
        /// Crops handed to the sink so far.
        done: usize,
        /// Crops in this run.
        total: usize,
    },
    /// The last export finished.
    Exported {
        count: usize,
        destination: String,
    },
    /// The last export (or an action leading to it) failed.
    Error(String),
}

impl UiState {
    pub fn is_busy(&self) -> bool {
        matches!(self, UiState::Exporting { .. })
    }

    /// One-line status for the side panel, if there is anything to say.
    pub fn status_line(&self) -> Option<String> {
        match self {
            UiState::Idle => None,
            UiState::Exporting { done, total } => Some(format!("Exported {}/{}", done, total)),
            UiState::Exported { count, destination } => {
                Some(format!("Export complete: {} crop(s) in {}", count, destination))
            }
            UiState::Error(err) => Some(format!("Export failed: {}", err)),
        }
    }
}

/// Events received from the background export thread.
pub(crate) enum ExportEvent {
    /// `done` of `total` crops have been uploaded.
    Progress { done: usize, total: usize },
    /// All crops were uploaded.
    Finished(ExportReport),
    /// The export stopped with an error.
    Error(String),
}
