//! Progress store.
//!
//! The store owns every [`DownloadRecord`]. Records are only mutated through
//! [`ProgressStore::update`], which runs the mutator under the write lock, so
//! readers always observe a record as it was between two whole updates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use modelfetch_core::download::{DownloadId, DownloadRecord};

/// Shared, cloneable handle to the download records.
#[derive(Clone, Default)]
pub struct ProgressStore {
    records: Arc<RwLock<HashMap<DownloadId, DownloadRecord>>>,
}

impl ProgressStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new record.
    ///
    /// Returns `false` (and leaves the existing record alone) if the id is
    /// already present.
    pub async fn create(&self, record: DownloadRecord) -> bool {
        let mut records = self.records.write().await;
        if records.contains_key(record.id()) {
            tracing::warn!(id = %record.id(), "Refusing to overwrite existing download record");
            return false;
        }
        records.insert(record.id().clone(), record);
        true
    }

    /// Apply `mutator` to the record and return a snapshot of the result.
    ///
    /// A missing id is a no-op returning `None`; the record may already
    /// have been reaped.
    pub async fn update<F>(&self, id: &DownloadId, mutator: F) -> Option<DownloadRecord>
    where
        F: FnOnce(&mut DownloadRecord),
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id)?;
        mutator(record);
        Some(record.clone())
    }

    /// Snapshot of one record.
    pub async fn get(&self, id: &DownloadId) -> Option<DownloadRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Snapshots of every record, ordered by id.
    pub async fn list_all(&self) -> BTreeMap<DownloadId, DownloadRecord> {
        self.records
            .read()
            .await
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Destroy a record. Missing ids are a no-op.
    pub async fn remove(&self, id: &DownloadId) -> Option<DownloadRecord> {
        self.records.write().await.remove(id)
    }

    /// [`update`](Self::update) for callers outside the async runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn update_blocking<F>(&self, id: &DownloadId, mutator: F) -> Option<DownloadRecord>
    where
        F: FnOnce(&mut DownloadRecord),
    {
        let mut records = self.records.blocking_write();
        let record = records.get_mut(id)?;
        mutator(record);
        Some(record.clone())
    }

    /// [`get`](Self::get) for callers outside the async runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn get_blocking(&self, id: &DownloadId) -> Option<DownloadRecord> {
        self.records.blocking_read().get(id).cloned()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
