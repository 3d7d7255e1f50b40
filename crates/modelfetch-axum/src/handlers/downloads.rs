//! Download handlers - intake, status queries and cancellation.

use axum::Json;
use axum::extract::{Path, State};
use modelfetch_core::DownloadId;

use crate::dto::{
    DownloadListResponse, DownloadProgressResponse, SubmitDownloadResponse, SuccessResponse,
};
use crate::error::HttpError;
use crate::handlers::payload::DownloadPayload;
use crate::state::AppState;

/// Accept a download and answer before any byte is transferred.
pub async fn download_model(
    State(state): State<AppState>,
    DownloadPayload(request): DownloadPayload,
) -> Result<Json<SubmitDownloadResponse>, HttpError> {
    let submission = state.downloads.submit(request).await?;
    Ok(Json(submission.into()))
}

/// Snapshot of one download.
pub async fn progress(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> Result<Json<DownloadProgressResponse>, HttpError> {
    let download = state
        .downloads
        .progress(&DownloadId::from(download_id.as_str()))
        .await?;
    Ok(Json(DownloadProgressResponse {
        success: true,
        download,
    }))
}

/// Every download currently held.
pub async fn list(State(state): State<AppState>) -> Json<DownloadListResponse> {
    let downloads = state.downloads.list().await;

    tracing::debug!(
        target: "modelfetch.download",
        total_items = downloads.len(),
        "Download list returned from /api/downloads",
    );

    Json(DownloadListResponse {
        success: true,
        downloads,
    })
}

/// Cancel a queued or running download.
pub async fn cancel(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> Result<Json<SuccessResponse>, HttpError> {
    state
        .downloads
        .cancel(&DownloadId::from(download_id.as_str()))
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
