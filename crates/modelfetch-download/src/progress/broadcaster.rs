//! Progress broadcaster.
//!
//! Turns record snapshots into [`AppEvent`]s and hands them to the injected
//! emitter. The emitter owns delivery; a subscriber that cannot keep up is
//! its problem, never the transfer's.

use std::sync::Arc;

use chrono::Utc;

use modelfetch_core::download::{DownloadId, DownloadRecord, ProgressEvent};
use modelfetch_core::events::AppEvent;
use modelfetch_core::ports::AppEventEmitter;

/// Publishes progress snapshots to every subscriber of an emitter.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    emitter: Arc<dyn AppEventEmitter>,
}

impl ProgressBroadcaster {
    /// Create a broadcaster on top of `emitter`.
    pub fn new(emitter: Arc<dyn AppEventEmitter>) -> Self {
        Self { emitter }
    }

    /// Publish a snapshot of `record` with speed and ETA computed as of now.
    pub fn publish(&self, record: &DownloadRecord) {
        let event = ProgressEvent::from_record(record, Utc::now());
        tracing::trace!(
            id = %event.download_id,
            status = %event.status,
            downloaded = event.downloaded,
            "Publishing progress"
        );
        self.emitter.emit(AppEvent::progress(event));
    }

    /// Announce that a record was reaped.
    pub fn removed(&self, id: &DownloadId) {
        self.emitter.emit(AppEvent::removed(id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use modelfetch_core::download::DownloadState;

    use super::*;
    use crate::test_support::RecordingEmitter;

    #[test]
    fn publish_emits_progress_snapshot() {
        let emitter = RecordingEmitter::default();
        let broadcaster = ProgressBroadcaster::new(Arc::new(emitter.clone()));

        let mut record = DownloadRecord::new(
            DownloadId::from("abc"),
            "http://x/m.bin",
            "loras",
            PathBuf::from("/m/loras/m.bin"),
        );
        record.begin();
        record.set_total_bytes(10);
        record.record_progress(5, 1.0);
        broadcaster.publish(&record);
        broadcaster.removed(record.id());

        let events = emitter.progress_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].download_id, "abc");
        assert_eq!(events[0].folder, "loras");
        assert_eq!(events[0].status, DownloadState::InProgress);
        assert_eq!(events[0].downloaded, 5);
        assert_eq!(emitter.removed_ids(), vec!["abc".to_string()]);
    }
}
