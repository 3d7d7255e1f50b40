//! Core domain types for downloads.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for one download's progress record.
///
/// Generated from a random v4 UUID so identifiers never collide, even for
/// requests arriving in the same instant for the same file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(String);

impl DownloadId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DownloadId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for DownloadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a download.
///
/// Transitions only move forward: `Queued → InProgress → {Completed, Failed}`.
/// A queued download may also fail directly (cancelled before a worker
/// picked it up, or the worker could not be scheduled).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Registered, waiting for a transfer slot.
    Queued,
    /// Bytes are being transferred.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl DownloadState {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed or Failed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::InProgress | Self::Failed)
                | (Self::InProgress, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress record for one in-flight or recently finished download.
///
/// Fields are private: every mutation goes through the methods below so the
/// lifecycle invariants hold no matter who holds the `&mut`.
/// Serialized field names match the JSON returned by the HTTP API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    #[serde(rename = "download_id")]
    id: DownloadId,
    #[serde(rename = "url")]
    source_url: String,
    folder: String,
    #[serde(rename = "path")]
    destination_path: PathBuf,
    #[serde(rename = "filename")]
    display_name: String,
    #[serde(rename = "total_size")]
    total_bytes: u64,
    #[serde(rename = "downloaded")]
    bytes_transferred: u64,
    #[serde(rename = "percent")]
    percent_complete: f64,
    #[serde(rename = "status")]
    state: DownloadState,
    #[serde(rename = "error")]
    error_message: Option<String>,
    content_type: Option<String>,
    speed_bps: f64,
    started_at: DateTime<Utc>,
    transfer_started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Create a queued record for a download into `destination_path`.
    pub fn new(
        id: DownloadId,
        source_url: impl Into<String>,
        folder: impl Into<String>,
        destination_path: PathBuf,
    ) -> Self {
        let display_name = file_name_of(&destination_path);
        Self {
            id,
            source_url: source_url.into(),
            folder: folder.into(),
            destination_path,
            display_name,
            total_bytes: 0,
            bytes_transferred: 0,
            percent_complete: 0.0,
            state: DownloadState::Queued,
            error_message: None,
            content_type: None,
            speed_bps: 0.0,
            started_at: Utc::now(),
            transfer_started_at: None,
            finished_at: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &DownloadId {
        &self.id
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Total size in bytes, `0` when the server did not report one.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    #[must_use]
    pub const fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    #[must_use]
    pub const fn percent_complete(&self) -> f64 {
        self.percent_complete
    }

    #[must_use]
    pub const fn state(&self) -> DownloadState {
        self.state
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Average transfer speed recorded at the last progress update.
    #[must_use]
    pub const fn speed_bps(&self) -> f64 {
        self.speed_bps
    }

    /// When the request was accepted.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the record entered a terminal state.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Time spent transferring, measured up to `now` or to the terminal
    /// timestamp if the record has finished.
    #[must_use]
    pub fn transfer_elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        let start = self.transfer_started_at.unwrap_or(self.started_at);
        let end = self.finished_at.unwrap_or(now);
        (end - start).max(chrono::Duration::zero())
    }

    /// Queued → InProgress. Returns `false` if the transition is not legal.
    pub fn begin(&mut self) -> bool {
        if !self.transition(DownloadState::InProgress) {
            return false;
        }
        self.transfer_started_at = Some(Utc::now());
        true
    }

    /// Record the size learned from the server. Ignored once terminal.
    pub fn set_total_bytes(&mut self, total: u64) {
        if self.is_terminal() {
            return;
        }
        self.total_bytes = total.max(self.bytes_transferred);
        self.recompute_percent();
    }

    /// Record the content type learned from the server.
    pub fn set_content_type(&mut self, content_type: Option<String>) {
        if !self.is_terminal() {
            self.content_type = content_type;
        }
    }

    /// Point the record at a disambiguated destination before any bytes are written.
    pub fn relocate(&mut self, destination_path: PathBuf) {
        if self.is_terminal() || self.bytes_transferred > 0 {
            return;
        }
        self.display_name = file_name_of(&destination_path);
        self.destination_path = destination_path;
    }

    /// Record transferred bytes. The counter never moves backwards.
    pub fn record_progress(&mut self, bytes_transferred: u64, speed_bps: f64) {
        if self.state != DownloadState::InProgress {
            return;
        }
        self.bytes_transferred = self.bytes_transferred.max(bytes_transferred);
        if self.total_bytes > 0 && self.bytes_transferred > self.total_bytes {
            // Server under-reported its size; keep transferred <= total.
            self.total_bytes = self.bytes_transferred;
        }
        self.speed_bps = speed_bps;
        self.recompute_percent();
    }

    /// InProgress → Completed with the final on-disk size.
    ///
    /// A clean end of stream makes the written size the true size, so a
    /// known total is replaced by it even if the server advertised more.
    pub fn complete(&mut self, bytes_written: u64) -> bool {
        if !self.state.can_transition_to(DownloadState::Completed) {
            return false;
        }
        self.bytes_transferred = self.bytes_transferred.max(bytes_written);
        if self.total_bytes > 0 {
            self.total_bytes = self.bytes_transferred;
            self.percent_complete = 100.0;
        }
        self.transition(DownloadState::Completed)
    }

    /// Move to Failed with `message`. Returns `false` if already terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.transition(DownloadState::Failed) {
            return false;
        }
        self.error_message = Some(message.into());
        true
    }

    fn transition(&mut self, next: DownloadState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    #[allow(clippy::cast_precision_loss)]
    fn recompute_percent(&mut self) {
        if self.total_bytes > 0 {
            let percent = self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0;
            self.percent_complete = percent.min(100.0);
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DownloadRecord {
        DownloadRecord::new(
            DownloadId::generate(),
            "http://x/model.bin",
            "checkpoints",
            PathBuf::from("/models/checkpoints/m.bin"),
        )
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = DownloadId::generate();
        let b = DownloadId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn new_record_is_queued_with_filename_from_path() {
        let r = record();
        assert_eq!(r.state(), DownloadState::Queued);
        assert_eq!(r.display_name(), "m.bin");
        assert_eq!(r.total_bytes(), 0);
        assert!(r.finished_at().is_none());
    }

    #[test]
    fn state_only_moves_forward() {
        assert!(DownloadState::Queued.can_transition_to(DownloadState::InProgress));
        assert!(DownloadState::Queued.can_transition_to(DownloadState::Failed));
        assert!(!DownloadState::Queued.can_transition_to(DownloadState::Completed));
        assert!(!DownloadState::Completed.can_transition_to(DownloadState::InProgress));
        assert!(!DownloadState::Failed.can_transition_to(DownloadState::Completed));
        assert!(!DownloadState::InProgress.can_transition_to(DownloadState::Queued));
    }

    #[test]
    fn progress_is_monotonic_and_percent_derived() {
        let mut r = record();
        assert!(r.begin());
        r.set_total_bytes(1000);
        r.record_progress(250, 10.0);
        assert!((r.percent_complete() - 25.0).abs() < f64::EPSILON);

        r.record_progress(100, 10.0);
        assert_eq!(r.bytes_transferred(), 250);
    }

    #[test]
    fn unknown_total_leaves_percent_untouched() {
        let mut r = record();
        r.begin();
        r.record_progress(4096, 1.0);
        assert_eq!(r.total_bytes(), 0);
        assert!(r.percent_complete().abs() < f64::EPSILON);

        assert!(r.complete(8192));
        assert_eq!(r.bytes_transferred(), 8192);
        assert!(r.percent_complete().abs() < f64::EPSILON);
    }

    #[test]
    fn complete_pins_percent_when_total_known() {
        let mut r = record();
        r.begin();
        r.set_total_bytes(10_000_000);
        r.record_progress(9_000_000, 1.0);
        assert!(r.complete(10_000_000));
        assert_eq!(r.state(), DownloadState::Completed);
        assert_eq!(r.bytes_transferred(), 10_000_000);
        assert!((r.percent_complete() - 100.0).abs() < f64::EPSILON);
        assert!(r.finished_at().is_some());
    }

    #[test]
    fn complete_replaces_overstated_total_with_written_size() {
        let mut r = record();
        r.begin();
        r.set_total_bytes(1000);
        r.record_progress(500, 1.0);
        assert!(r.complete(500));
        assert_eq!(r.bytes_transferred(), 500);
        assert_eq!(r.total_bytes(), 500);
        assert!((r.percent_complete() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn terminal_records_reject_further_transitions() {
        let mut r = record();
        r.begin();
        assert!(r.fail("HTTP 404 Not Found"));
        assert!(!r.complete(10));
        assert!(!r.begin());
        assert!(!r.fail("again"));
        assert_eq!(r.error_message(), Some("HTTP 404 Not Found"));
    }

    #[test]
    fn transferred_never_exceeds_known_total() {
        let mut r = record();
        r.begin();
        r.set_total_bytes(100);
        r.record_progress(150, 1.0);
        assert_eq!(r.total_bytes(), 150);
        assert!((r.percent_complete() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn relocate_updates_filename_before_transfer() {
        let mut r = record();
        r.begin();
        r.relocate(PathBuf::from("/models/checkpoints/m_1700000000.bin"));
        assert_eq!(r.display_name(), "m_1700000000.bin");

        r.record_progress(1, 1.0);
        r.relocate(PathBuf::from("/elsewhere/x.bin"));
        assert_eq!(r.display_name(), "m_1700000000.bin");
    }

    #[test]
    fn serializes_with_api_field_names() {
        let r = record();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["filename"], "m.bin");
        assert_eq!(json["folder"], "checkpoints");
        assert_eq!(json["url"], "http://x/model.bin");
        assert_eq!(json["total_size"], 0);
        assert_eq!(json["downloaded"], 0);
        assert!(json["error"].is_null());
        assert!(json.get("download_id").is_some());
    }
}
