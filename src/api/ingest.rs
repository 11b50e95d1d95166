//! Upload handlers: bulk CSV ingest and manual bill entry.

use crate::error::{Result, ServiceError};
use crate::factors::bill_emission_factor;
use crate::ingestion::{self, parse_month_key};
use crate::state::AppState;
use axum::extract::Multipart;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Multipart CSV upload. Ingest failures come back as a 200 payload naming
/// the stage that failed; only a missing or malformed `file` field is a
/// client error.
pub async fn upload_csv(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .unwrap_or(ingestion::FALLBACK_FILE_NAME)
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            upload = Some((file_name, bytes.to_vec()));
            break;
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        ServiceError::Validation("multipart field 'file' is required".to_string())
    })?;

    match ingestion::run_ingest(&state.warehouse, &state.store, &file_name, &bytes).await {
        Ok(receipt) => {
            log::info!(
                "loaded {} rows from '{}' as {}",
                receipt.rows_loaded,
                file_name,
                receipt.object_name
            );
            Ok(Json(json!({
                "message": "Upload successful",
                "rows": receipt.rows_loaded,
            })))
        }
        Err(err) => {
            log::warn!(
                "upload of '{}' failed at the {} stage: {}",
                file_name,
                err.stage(),
                err.details()
            );
            Ok(Json(json!({
                "error": "Upload failed",
                "stage": err.stage(),
                "details": err.details(),
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BillEntry {
    pub bill_type: String,
    pub amount: f64,
    pub units: f64,
    pub region: String,
    /// `"YYYY-MM"`; stored as the first day of that month.
    pub month: String,
}

/// Records one utility bill and echoes back its estimated CO2.
pub async fn upload_bill(
    Extension(state): Extension<Arc<AppState>>,
    Json(entry): Json<BillEntry>,
) -> Result<Json<Value>> {
    let month = parse_month_key(&entry.month)?;

    let bill_id = Uuid::new_v4();
    let estimated_co2 = entry.units * bill_emission_factor(&entry.bill_type);

    state
        .warehouse
        .insert_bill(
            bill_id,
            &entry.bill_type,
            entry.amount,
            entry.units,
            &entry.region,
            month,
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "bill_id": bill_id.to_string(),
        "estimated_co2": estimated_co2,
    })))
}
