//! Shared helpers for unit tests.

use std::sync::{Arc, Mutex};

use modelfetch_core::download::ProgressEvent;
use modelfetch_core::events::AppEvent;
use modelfetch_core::ports::AppEventEmitter;

/// Emitter that keeps every event it receives.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_events(&self) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::ModelDownloadProgress { progress } => Some(progress),
                AppEvent::DownloadRemoved { .. } => None,
            })
            .collect()
    }

    pub fn removed_ids(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::DownloadRemoved { download_id } => Some(download_id),
                AppEvent::ModelDownloadProgress { .. } => None,
            })
            .collect()
    }
}

impl AppEventEmitter for RecordingEmitter {
    fn emit(&self, event: AppEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
