//! Report downloads. Both exports run the unfiltered product totals at the
//! fixed default factors, with no per-region resolution.

use crate::error::Result;
use crate::factors::ResolvedFactors;
use crate::metrics::product_emissions;
use crate::reports::{self, ReportCharts};
use crate::state::AppState;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use std::sync::Arc;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn excel_report(Extension(state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let rows = state.warehouse.product_totals(None).await?;
    let products = product_emissions(&rows, &ResolvedFactors::fixed_defaults());
    let bytes = reports::product_workbook(&products)?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sustainability_report.xlsx\"",
            ),
        ],
        bytes,
    ))
}

/// The request body is optional; when present it carries base64 chart
/// images to embed.
pub async fn pdf_report(
    Extension(state): Extension<Arc<AppState>>,
    charts: Option<Json<ReportCharts>>,
) -> Result<impl IntoResponse> {
    let charts = charts.map(|Json(inner)| inner).unwrap_or_default();

    let rows = state.warehouse.product_totals(None).await?;
    let products = product_emissions(&rows, &ResolvedFactors::fixed_defaults());
    let bytes = reports::emissions_report(&products, &charts)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sustainability_report.pdf\"",
            ),
        ],
        bytes,
    ))
}
