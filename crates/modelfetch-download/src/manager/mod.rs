//! Download manager.
//!
//! Launches one independent task per download and owns everything that
//! happens after the transfer returns: the terminal update, the final
//! broadcast and delayed reaping of the record.
//!
//! # Task layout
//!
//! ```text
//! start(record) ──spawn──▶ supervisor ──spawn──▶ worker (admission → begin → executor)
//!                              │
//!                              └─ awaits worker, finishes record, sleeps retention, reaps
//! ```
//!
//! The supervisor outlives a panicking worker, so a record can never be left
//! in `Queued` or `InProgress` once its task is gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use modelfetch_core::download::{
    DownloadError, DownloadId, DownloadRecord, ProgressEvent, format_bytes,
};
use modelfetch_core::ports::DownloadManagerConfig;

use crate::executor::{TransferExecutor, TransferJob};
use crate::progress::ProgressBroadcaster;
use crate::store::ProgressStore;

/// Orchestrates background transfers.
///
/// Cheap to clone; all clones drive the same set of downloads.
#[derive(Clone)]
pub struct DownloadManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: DownloadManagerConfig,
    store: ProgressStore,
    broadcaster: ProgressBroadcaster,
    executor: TransferExecutor,
    /// Admission limit; `None` admits every download immediately.
    admission: Option<Arc<Semaphore>>,
    /// Tokens for downloads that have not finished yet.
    active: Mutex<HashMap<DownloadId, CancellationToken>>,
    /// Parent of every per-download token.
    shutdown: CancellationToken,
}

impl DownloadManager {
    /// Create a manager writing into `store` and publishing through `broadcaster`.
    pub fn new(
        config: DownloadManagerConfig,
        store: ProgressStore,
        broadcaster: ProgressBroadcaster,
    ) -> Result<Self, DownloadError> {
        let executor = TransferExecutor::new(config.clone(), store.clone(), broadcaster.clone())?;
        let admission = config
            .max_concurrent
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                store,
                broadcaster,
                executor,
                admission,
                active: Mutex::new(HashMap::new()),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Launch the transfer for a registered `Queued` record.
    ///
    /// Returns immediately; the transfer runs as an independent task. If no
    /// task can be spawned the record is marked `Failed` instead.
    pub fn start(&self, record: &DownloadRecord) {
        let id = record.id().clone();

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let err = DownloadError::scheduling(e.to_string());
                tracing::error!(
                    target: "modelfetch.download",
                    id = %id,
                    error = %err,
                    "Cannot launch download outside a runtime"
                );
                self.inner
                    .store
                    .update_blocking(&id, |r| {
                        r.fail(err.to_string());
                    });
                return;
            }
        };

        let cancel = self.inner.shutdown.child_token();
        self.inner.active_map().insert(id.clone(), cancel.clone());

        let job = TransferJob {
            id,
            url: record.source_url().to_string(),
            destination: record.destination_path().to_path_buf(),
            cancel,
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(inner.supervise(job));
    }

    /// Cancel a queued or in-progress download.
    ///
    /// Returns `false` if the id is unknown or already finished.
    pub fn cancel(&self, id: &DownloadId) -> bool {
        let token = self.inner.active_map().get(id).cloned();
        match token {
            Some(token) => {
                tracing::info!(target: "modelfetch.download", id = %id, "Cancelling download");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of downloads that have not reached a terminal state.
    pub fn active_count(&self) -> usize {
        self.inner.active_map().len()
    }

    /// Cancel every running download. Later starts fail immediately.
    pub fn shutdown(&self) {
        let count = self.active_count();
        self.inner.shutdown.cancel();
        tracing::info!(count, "Shutdown: cancelled active downloads");
    }

    /// The store this manager writes into.
    pub fn store(&self) -> &ProgressStore {
        &self.inner.store
    }
}

impl ManagerInner {
    fn active_map(&self) -> std::sync::MutexGuard<'_, HashMap<DownloadId, CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn supervise(self: Arc<Self>, job: TransferJob) {
        let id = job.id.clone();
        let worker = tokio::spawn(Arc::clone(&self).run(job));

        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(e) => Err(DownloadError::scheduling(format!(
                "transfer task ended unexpectedly: {e}"
            ))),
        };

        self.finish(&id, outcome).await;

        tokio::time::sleep(self.config.retention).await;
        if self.store.remove(&id).await.is_some() {
            tracing::debug!(target: "modelfetch.download", id = %id, "Reaped download record");
            self.broadcaster.removed(&id);
        }
    }

    async fn run(self: Arc<Self>, job: TransferJob) -> Result<u64, DownloadError> {
        let _permit = match &self.admission {
            Some(semaphore) => {
                let acquire = Arc::clone(semaphore).acquire_owned();
                tokio::select! {
                    biased;
                    () = job.cancel.cancelled() => return Err(DownloadError::Cancelled),
                    permit = acquire => Some(
                        permit.map_err(|e| DownloadError::scheduling(e.to_string()))?,
                    ),
                }
            }
            None => None,
        };

        if job.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let snapshot = self
            .store
            .update(&job.id, |r| {
                r.begin();
            })
            .await
            .ok_or_else(|| DownloadError::not_found(job.id.as_str()))?;
        self.broadcaster.publish(&snapshot);

        tracing::info!(
            target: "modelfetch.download",
            id = %job.id,
            url = %job.url,
            "Download started"
        );

        self.executor.execute(&job).await
    }

    async fn finish(&self, id: &DownloadId, outcome: Result<u64, DownloadError>) {
        self.active_map().remove(id);

        let snapshot = self
            .store
            .update(id, |r| match &outcome {
                Ok(written) => {
                    r.complete(*written);
                }
                Err(e) => {
                    r.fail(e.to_string());
                }
            })
            .await;

        let Some(snapshot) = snapshot else {
            return;
        };

        match &outcome {
            Ok(_) => {
                let summary = ProgressEvent::from_record(&snapshot, Utc::now());
                tracing::info!(
                    target: "modelfetch.download",
                    id = %id,
                    path = %snapshot.destination_path().display(),
                    size = %format_bytes(snapshot.bytes_transferred()),
                    elapsed_ms = snapshot.transfer_elapsed(Utc::now()).num_milliseconds(),
                    speed = %summary.speed,
                    "Download completed"
                );
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!(target: "modelfetch.download", id = %id, "Download cancelled");
            }
            Err(e) => {
                tracing::error!(
                    target: "modelfetch.download",
                    id = %id,
                    error = %e,
                    "Download failed"
                );
            }
        }

        self.broadcaster.publish(&snapshot);
    }
}
