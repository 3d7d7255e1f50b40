//! Download endpoint response bodies.

use std::collections::BTreeMap;
use std::path::PathBuf;

use modelfetch_core::{DownloadId, DownloadRecord, DownloadState, Submission};
use serde::Serialize;

/// Answer to `POST /api/download-model`.
#[derive(Debug, Serialize)]
pub struct SubmitDownloadResponse {
    pub success: bool,
    pub download_id: DownloadId,
    /// Size is learned once the transfer starts; `0` here means unknown.
    pub total_size: u64,
    pub path: PathBuf,
    pub status: DownloadState,
    pub message: String,
}

impl From<Submission> for SubmitDownloadResponse {
    fn from(submission: Submission) -> Self {
        Self {
            success: true,
            download_id: submission.download_id,
            total_size: 0,
            path: submission.path,
            status: submission.status,
            message: "Download started".to_string(),
        }
    }
}

/// Answer to `GET /api/download-progress/{download_id}`.
#[derive(Debug, Serialize)]
pub struct DownloadProgressResponse {
    pub success: bool,
    pub download: DownloadRecord,
}

/// Answer to `GET /api/downloads`.
#[derive(Debug, Serialize)]
pub struct DownloadListResponse {
    pub success: bool,
    pub downloads: BTreeMap<DownloadId, DownloadRecord>,
}

/// Answer to `GET /api/folders`.
#[derive(Debug, Serialize)]
pub struct FoldersResponse {
    pub success: bool,
    pub folders: BTreeMap<String, Vec<PathBuf>>,
}

/// Bare acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const fn ok() -> Self {
        Self { success: true }
    }
}
