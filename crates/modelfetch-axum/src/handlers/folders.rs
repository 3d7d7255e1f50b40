//! Folder class listing.

use axum::Json;
use axum::extract::State;

use crate::dto::FoldersResponse;
use crate::state::AppState;

/// Folder classes and the directories they resolve to.
pub async fn list(State(state): State<AppState>) -> Json<FoldersResponse> {
    Json(FoldersResponse {
        success: true,
        folders: state.downloads.folders(),
    })
}
