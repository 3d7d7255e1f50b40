//! Download domain: record lifecycle, errors and progress payloads.
//!
//! Pure data types with no I/O dependencies.

mod errors;
mod events;
mod format;
mod types;

pub use errors::{DownloadError, DownloadResult};
pub use events::ProgressEvent;
pub use format::{format_bytes, format_eta, format_speed};
pub use types::{DownloadId, DownloadRecord, DownloadState};
