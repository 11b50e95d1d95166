//! Upload history and destructive admin operations.

use crate::error::Result;
use crate::state::AppState;
use axum::extract::Path;
use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// The 20 most recent non-deleted uploads, newest first.
pub async fn upload_history(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    let uploads = state.warehouse.recent_uploads().await?;

    Ok(Json(json!({ "count": uploads.len(), "data": uploads })))
}

/// Idempotent soft delete: a missing or already-deleted id still reports
/// success.
pub async fn delete_upload(
    Extension(state): Extension<Arc<AppState>>,
    Path(upload_id): Path<String>,
) -> Result<Json<Value>> {
    state.warehouse.soft_delete_upload(&upload_id).await?;

    Ok(Json(json!({ "status": "deleted", "upload_id": upload_id })))
}

/// Wipes operations, utility bills and the upload log. No confirmation and
/// no rollback across the three deletes.
pub async fn reset_all(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    state.warehouse.clear_all_data().await?;
    log::info!("cleared operations, utility bills and upload log");

    Ok(Json(json!({ "status": "all_data_cleared" })))
}
