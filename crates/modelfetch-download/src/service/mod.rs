//! Request intake.
//!
//! [`DownloadService`] validates incoming requests, registers a `Queued`
//! record and hands it to the [`DownloadManager`]. Everything here completes
//! without touching the network; rejections never reach the store.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use modelfetch_core::download::{DownloadError, DownloadId, DownloadRecord, DownloadState};
use modelfetch_core::ports::{DownloadRequest, DownloadServicePort, FolderResolver, Submission};

use crate::manager::DownloadManager;
use crate::store::ProgressStore;

/// A request that passed validation.
#[derive(Debug)]
struct ValidatedRequest {
    url: String,
    folder: String,
    destination: PathBuf,
}

/// Download service backed by the in-process manager.
#[derive(Clone)]
pub struct DownloadService {
    resolver: Arc<dyn FolderResolver>,
    store: ProgressStore,
    manager: DownloadManager,
}

impl DownloadService {
    /// Wire the service to its collaborators.
    pub fn new(
        resolver: Arc<dyn FolderResolver>,
        store: ProgressStore,
        manager: DownloadManager,
    ) -> Self {
        Self {
            resolver,
            store,
            manager,
        }
    }

    /// The manager running this service's transfers.
    pub const fn manager(&self) -> &DownloadManager {
        &self.manager
    }

    fn validate(&self, request: &DownloadRequest) -> Result<ValidatedRequest, DownloadError> {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (Some(url), Some(folder), Some(filename)) = (
            field(&request.url),
            field(&request.folder),
            field(&request.filename),
        ) else {
            tracing::warn!(
                url = ?request.url,
                folder = ?request.folder,
                filename = ?request.filename,
                "Missing required parameters"
            );
            return Err(DownloadError::invalid_request("Missing required parameters"));
        };

        let parsed = Url::parse(&url)
            .map_err(|e| DownloadError::invalid_request(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_request(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        if !is_plain_file_name(&filename) {
            return Err(DownloadError::invalid_request(format!(
                "Invalid filename: {filename}"
            )));
        }

        let Some(dir) = self.resolver.resolve(&folder).into_iter().next() else {
            tracing::warn!(folder = %folder, "Invalid folder");
            return Err(DownloadError::invalid_request(format!(
                "Invalid folder: {folder}"
            )));
        };

        Ok(ValidatedRequest {
            url,
            folder,
            destination: dir.join(filename),
        })
    }
}

/// A single normal path component with no separators.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl DownloadServicePort for DownloadService {
    async fn submit(&self, request: DownloadRequest) -> Result<Submission, DownloadError> {
        let valid = self.validate(&request)?;

        let id = DownloadId::generate();
        let record = DownloadRecord::new(
            id.clone(),
            valid.url,
            valid.folder,
            valid.destination.clone(),
        );
        if !self.store.create(record.clone()).await {
            return Err(DownloadError::scheduling(format!(
                "identifier collision for {id}"
            )));
        }

        tracing::info!(
            target: "modelfetch.download",
            id = %id,
            url = %record.source_url(),
            folder = %record.folder(),
            path = %valid.destination.display(),
            "Download accepted"
        );

        self.manager.start(&record);

        Ok(Submission {
            download_id: id,
            path: valid.destination,
            status: DownloadState::Queued,
        })
    }

    async fn progress(&self, id: &DownloadId) -> Result<DownloadRecord, DownloadError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| DownloadError::not_found(id.as_str()))
    }

    async fn list(&self) -> BTreeMap<DownloadId, DownloadRecord> {
        self.store.list_all().await
    }

    async fn cancel(&self, id: &DownloadId) -> Result<(), DownloadError> {
        if self.manager.cancel(id) {
            Ok(())
        } else {
            Err(DownloadError::not_found(id.as_str()))
        }
    }

    fn folders(&self) -> BTreeMap<String, Vec<PathBuf>> {
        self.resolver
            .known_classes()
            .into_iter()
            .map(|class| {
                let dirs = self.resolver.resolve(&class);
                (class, dirs)
            })
            .collect()
    }
}
