//! HTTP request handlers for the Axum web server.
//!
//! Each submodule contains handlers for a specific API area.
//! Handlers are thin wrappers that delegate to `DownloadServicePort`.

pub mod downloads;
pub mod events;
pub mod folders;
pub mod payload;
