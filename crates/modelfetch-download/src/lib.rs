#![doc = include_str!("../README.md")]

// Re-export core types for convenience
pub use modelfetch_core::download::{
    DownloadError, DownloadId, DownloadRecord, DownloadState, ProgressEvent,
};
pub use modelfetch_core::ports::{
    DownloadManagerConfig, DownloadRequest, DownloadServicePort, Submission,
};

mod executor;
mod manager;
mod progress;
mod service;
mod store;

#[cfg(test)]
mod test_support;

pub use executor::{DownloadDestination, TransferExecutor, TransferJob};
pub use manager::DownloadManager;
pub use progress::{ProgressBroadcaster, ProgressThrottle};
pub use service::DownloadService;
pub use store::ProgressStore;

use std::sync::Arc;

use modelfetch_core::ports::{AppEventEmitter, FolderResolver};

/// Wire a store, manager and service together.
///
/// This is the only place the download subsystem's components are composed;
/// adapters call it once at startup.
pub fn build_download_service(
    config: DownloadManagerConfig,
    resolver: Arc<dyn FolderResolver>,
    emitter: Arc<dyn AppEventEmitter>,
) -> Result<DownloadService, DownloadError> {
    let store = ProgressStore::new();
    let broadcaster = ProgressBroadcaster::new(emitter);
    let manager = DownloadManager::new(config, store.clone(), broadcaster)?;
    Ok(DownloadService::new(resolver, store, manager))
}
