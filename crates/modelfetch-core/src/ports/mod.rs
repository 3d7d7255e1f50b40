//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest`, `axum` or runtime types in any signature
//! - Emitters never block and never fail the caller
//! - Folder resolution is synchronous and side-effect free

pub mod download_service;
pub mod event_emitter;
pub mod folder_resolver;

pub use download_service::{DownloadManagerConfig, DownloadRequest, DownloadServicePort, Submission};
pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use folder_resolver::FolderResolver;
