//! Download service port definition.
//!
//! This port is the public interface of the download subsystem as seen by
//! adapters (HTTP, CLI). It hides the worker tasks, cancellation tokens and
//! HTTP client behind an async API that only speaks domain types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::download::{DownloadError, DownloadId, DownloadRecord, DownloadState};

/// A download request as received from a client.
///
/// Fields are optional because clients may omit them; validation happens in
/// the service so that a missing field becomes a structured rejection rather
/// than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Source URL to fetch.
    pub url: Option<String>,
    /// Folder class to resolve the destination directory from.
    pub folder: Option<String>,
    /// File name to write inside the destination directory.
    pub filename: Option<String>,
}

impl DownloadRequest {
    /// Create a request with all fields present.
    pub fn new(
        url: impl Into<String>,
        folder: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            folder: Some(folder.into()),
            filename: Some(filename.into()),
        }
    }
}

/// Synchronous answer to an accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Identifier to poll or match events against.
    pub download_id: DownloadId,
    /// Intended destination (may be disambiguated once the transfer starts).
    pub path: PathBuf,
    /// State at the time of the answer (always `Queued`).
    pub status: DownloadState,
}

/// Configuration for the download manager and transfer executor.
#[derive(Debug, Clone)]
pub struct DownloadManagerConfig {
    /// How long a terminal record stays queryable before it is reaped.
    pub retention: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for receiving response headers and for each body chunk.
    pub read_timeout: Duration,
    /// Overall timeout for the best-effort HEAD preflight.
    pub preflight_timeout: Duration,
    /// Minimum time between progress broadcasts for one download.
    pub progress_interval: Duration,
    /// Bytes after which a progress broadcast is due regardless of time.
    pub progress_bytes: u64,
    /// Maximum transfers in flight; `None` admits everything immediately.
    pub max_concurrent: Option<usize>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            preflight_timeout: Duration::from_secs(10),
            progress_interval: Duration::from_secs(1),
            progress_bytes: 5 * 1024 * 1024,
            max_concurrent: None,
            user_agent: concat!("modelfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DownloadManagerConfig {
    /// Set the retention delay for terminal records.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the preflight timeout.
    #[must_use]
    pub const fn with_preflight_timeout(mut self, timeout: Duration) -> Self {
        self.preflight_timeout = timeout;
        self
    }

    /// Set the minimum interval between progress broadcasts.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the byte threshold that forces a progress broadcast.
    #[must_use]
    pub const fn with_progress_bytes(mut self, bytes: u64) -> Self {
        self.progress_bytes = bytes;
        self
    }

    /// Limit the number of concurrent transfers.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Port for submitting and observing downloads.
///
/// # Usage
///
/// ```ignore
/// let service: Arc<dyn DownloadServicePort> = /* ... */;
///
/// let submission = service
///     .submit(DownloadRequest::new("http://x/m.bin", "checkpoints", "m.bin"))
///     .await?;
///
/// let record = service.progress(&submission.download_id).await?;
/// ```
#[async_trait]
pub trait DownloadServicePort: Send + Sync {
    /// Validate and accept a request, returning before any byte is transferred.
    async fn submit(&self, request: DownloadRequest) -> Result<Submission, DownloadError>;

    /// Snapshot of one download's record.
    async fn progress(&self, id: &DownloadId) -> Result<DownloadRecord, DownloadError>;

    /// Snapshots of every record currently held.
    async fn list(&self) -> BTreeMap<DownloadId, DownloadRecord>;

    /// Cancel a queued or in-progress download.
    async fn cancel(&self, id: &DownloadId) -> Result<(), DownloadError>;

    /// Folder classes and the directories they resolve to.
    fn folders(&self) -> BTreeMap<String, Vec<PathBuf>>;
}
