#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod download;
pub mod events;
pub mod paths;
pub mod ports;

// Re-export commonly used types for convenience
pub use download::{
    DownloadError, DownloadId, DownloadRecord, DownloadResult, DownloadState, ProgressEvent,
    format_bytes, format_eta, format_speed,
};
pub use events::AppEvent;
pub use paths::{DEFAULT_FOLDER_CLASSES, FolderMap, PathError, default_models_root};
pub use ports::{
    AppEventEmitter, DownloadManagerConfig, DownloadRequest, DownloadServicePort, FolderResolver,
    NoopEmitter, Submission,
};
