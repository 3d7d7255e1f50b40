//! Canonical event union streamed to connected clients.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag that doubles as the SSE event
//! name, with the payload fields flattened alongside it:
//!
//! ```json
//! { "type": "model_download_progress", "download_id": "…", "percent": 42.0, … }
//! ```

use serde::{Deserialize, Serialize};

use crate::download::ProgressEvent;

/// Events published by the download subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Progress, completion or failure of a single download.
    ModelDownloadProgress {
        /// Snapshot of the download's progress fields.
        #[serde(flatten)]
        progress: ProgressEvent,
    },

    /// A finished download's record was reaped and can no longer be queried.
    DownloadRemoved {
        /// Identifier of the reaped download.
        download_id: String,
    },
}

impl AppEvent {
    /// Wrap a progress snapshot.
    #[must_use]
    pub const fn progress(progress: ProgressEvent) -> Self {
        Self::ModelDownloadProgress { progress }
    }

    /// Create a removal event.
    pub fn removed(download_id: impl Into<String>) -> Self {
        Self::DownloadRemoved {
            download_id: download_id.into(),
        }
    }

    /// Name used for the SSE `event:` field.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ModelDownloadProgress { .. } => "model_download_progress",
            Self::DownloadRemoved { .. } => "download_removed",
        }
    }

    /// Serialize to the JSON wire format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadState;

    fn progress() -> ProgressEvent {
        ProgressEvent {
            download_id: "abc".to_string(),
            filename: "m.bin".to_string(),
            folder: "checkpoints".to_string(),
            total_size: 100,
            downloaded: 50,
            percent: 50.0,
            status: DownloadState::InProgress,
            error: None,
            speed_bps: 10.0,
            speed: "10 B/s".to_string(),
            eta_seconds: Some(5),
            eta: Some("5s".to_string()),
        }
    }

    #[test]
    fn progress_event_is_flattened_under_type_tag() {
        let json: serde_json::Value =
            serde_json::from_str(&AppEvent::progress(progress()).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "model_download_progress");
        assert_eq!(json["download_id"], "abc");
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["eta_seconds"], 5);
    }

    #[test]
    fn event_names_match_type_tags() {
        let event = AppEvent::removed("abc");
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], event.event_name());
        assert_eq!(
            AppEvent::progress(progress()).event_name(),
            "model_download_progress"
        );
    }
}
