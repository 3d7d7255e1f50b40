//! Progress event payload published to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::{format_eta, format_speed};
use super::types::{DownloadRecord, DownloadState};

/// Snapshot of a download's externally relevant progress fields.
///
/// Speed is the average since the transfer began. ETA is only present while
/// the percentage is strictly between 0 and 100 and the speed is positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Identifier of the download.
    pub download_id: String,
    /// Current destination file name (after any disambiguation).
    pub filename: String,
    /// Folder class the download was requested into.
    pub folder: String,
    /// Total bytes, `0` when unknown.
    pub total_size: u64,
    /// Bytes written so far.
    pub downloaded: u64,
    /// Progress percentage (0.0 - 100.0).
    pub percent: f64,
    /// Lifecycle state.
    pub status: DownloadState,
    /// Error message when failed.
    pub error: Option<String>,
    /// Average speed in bytes per second.
    pub speed_bps: f64,
    /// Human-readable speed, e.g. `"12.34 MB/s"`.
    pub speed: String,
    /// Estimated seconds remaining.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    /// Human-readable ETA, e.g. `"3m 12s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl ProgressEvent {
    /// Build an event from a record snapshot as of `now`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_record(record: &DownloadRecord, now: DateTime<Utc>) -> Self {
        let elapsed = record.transfer_elapsed(now).num_milliseconds() as f64 / 1000.0;
        let downloaded = record.bytes_transferred();
        let speed_bps = if elapsed > 0.0 && downloaded > 0 {
            downloaded as f64 / elapsed
        } else {
            0.0
        };

        let percent = record.percent_complete();
        let total = record.total_bytes();
        let eta_seconds = (percent > 0.0 && percent < 100.0 && speed_bps > 0.0 && total > 0)
            .then(|| (total.saturating_sub(downloaded) as f64 / speed_bps).ceil() as u64);

        Self {
            download_id: record.id().to_string(),
            filename: record.display_name().to_string(),
            folder: record.folder().to_string(),
            total_size: total,
            downloaded,
            percent,
            status: record.state(),
            error: record.error_message().map(str::to_string),
            speed_bps,
            speed: format_speed(speed_bps),
            eta_seconds,
            eta: eta_seconds.map(format_eta),
        }
    }
}
