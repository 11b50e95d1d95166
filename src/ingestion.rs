//! CSV ingestion and manual bill entry.
//!
//! The upload pipeline runs three stages in order (object storage, warehouse
//! load, upload log) and reports the stage that failed instead of raising a
//! server error, so a partial ingest is visible to the client as data rather
//! than as a 500.

use crate::error::{Result, ServiceError};
use crate::storage::ObjectStore;
use crate::warehouse::Warehouse;
use chrono::NaiveDate;
use std::path::Path;
use uuid::Uuid;

/// File name recorded when the client supplies none, or a name with no
/// usable final component.
pub const FALLBACK_FILE_NAME: &str = "upload.csv";

/// One parsed row of the operations CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub product_id: String,
    pub units_sold: i32,
    pub energy_kwh: f64,
    pub transport_km: f64,
    pub record_date: NaiveDate,
}

/// Successful ingest: where the raw file landed and how many rows loaded.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub object_name: String,
    pub rows_loaded: usize,
}

/// Ingest failure labelled with the pipeline stage that raised it.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Load(String),
    #[error("{0}")]
    Log(String),
}

impl IngestError {
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Storage(_) => "storage",
            IngestError::Load(_) => "load",
            IngestError::Log(_) => "log",
        }
    }

    pub fn details(&self) -> &str {
        match self {
            IngestError::Storage(details) | IngestError::Load(details) | IngestError::Log(details) => {
                details
            }
        }
    }
}

/// Parses operations CSV bytes. The header row is skipped and the first five
/// columns are read positionally (product_id, units_sold, energy_kwh,
/// transport_km, record_date); extra columns are tolerated and quoted fields
/// may contain newlines.
pub fn parse_operations_csv(bytes: &[u8]) -> Result<Vec<OperationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        // 1-based data rows, after the header
        let line = idx + 2;
        let row = row.map_err(|e| ServiceError::Validation(format!("row {line}: {e}")))?;

        let field = |col: usize, name: &str| -> Result<&str> {
            row.get(col).map(str::trim).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "row {line}: missing column '{name}' (found {} columns)",
                    row.len()
                ))
            })
        };

        let product_id = field(0, "product_id")?.to_string();

        let units_sold = field(1, "units_sold")?.parse::<i32>().map_err(|_| {
            ServiceError::Validation(format!(
                "row {line}: invalid units_sold '{}'",
                row.get(1).unwrap_or_default()
            ))
        })?;

        let energy_kwh = field(2, "energy_kwh")?.parse::<f64>().map_err(|_| {
            ServiceError::Validation(format!(
                "row {line}: invalid energy_kwh '{}'",
                row.get(2).unwrap_or_default()
            ))
        })?;

        let transport_km = field(3, "transport_km")?.parse::<f64>().map_err(|_| {
            ServiceError::Validation(format!(
                "row {line}: invalid transport_km '{}'",
                row.get(3).unwrap_or_default()
            ))
        })?;

        let record_date =
            NaiveDate::parse_from_str(field(4, "record_date")?, "%Y-%m-%d").map_err(|_| {
                ServiceError::Validation(format!(
                    "row {line}: invalid record_date '{}', expected YYYY-MM-DD",
                    row.get(4).unwrap_or_default()
                ))
            })?;

        records.push(OperationRecord {
            product_id,
            units_sold,
            energy_kwh,
            transport_km,
            record_date,
        });
    }

    Ok(records)
}

/// Reduces a client-supplied file name to its final path component, so
/// directory segments and `..` never reach the object name.
fn base_file_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(FALLBACK_FILE_NAME)
}

/// Runs the staged pipeline for one uploaded CSV: retain the raw bytes under
/// a fresh object name built from the file's base name, parse and
/// bulk-append the rows, then record the upload. Parse failures count as
/// load-stage failures since nothing reached the warehouse.
pub async fn run_ingest(
    warehouse: &Warehouse,
    store: &ObjectStore,
    file_name: &str,
    bytes: &[u8],
) -> std::result::Result<IngestReceipt, IngestError> {
    let file_name = base_file_name(file_name);
    let object_name = format!("{}_{}", Uuid::new_v4(), file_name);

    store
        .put(&object_name, bytes)
        .await
        .map_err(|e| IngestError::Storage(e.to_string()))?;

    let records = parse_operations_csv(bytes).map_err(|e| IngestError::Load(e.to_string()))?;

    warehouse
        .append_operations(&records)
        .await
        .map_err(|e| IngestError::Load(e.to_string()))?;

    warehouse
        .log_upload(&object_name, file_name, records.len() as i32)
        .await
        .map_err(|e| IngestError::Log(e.to_string()))?;

    Ok(IngestReceipt {
        object_name,
        rows_loaded: records.len(),
    })
}

/// Validates a `"YYYY-MM"` month key and returns the first day of that
/// month. The shape check (length 7, dash at index 4) rejects with a
/// client-facing validation error; a string that passes the shape check but
/// is not a real month fails the date parse and surfaces as a server error.
pub fn parse_month_key(month: &str) -> Result<NaiveDate> {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err(ServiceError::Validation(format!(
            "Invalid month format: '{month}'. Use YYYY-MM"
        )));
    }

    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|e| ServiceError::Date(format!("month '{month}': {e}")))
}
