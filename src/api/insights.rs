//! Read-side aggregation endpoints.

use crate::error::Result;
use crate::factors;
use crate::metrics;
use crate::state::AppState;
use axum::extract::Query;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    pub since: Option<NaiveDate>,
}

/// Per-product emissions at factors resolved for the configured region,
/// optionally restricted to records on or after `since`.
pub async fn product_metrics(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<MetricsParams>,
) -> Result<Json<Value>> {
    let resolved =
        factors::resolve_product_factors(&state.warehouse, &state.config.region).await?;
    let rows = state.warehouse.product_totals(params.since).await?;
    let data = metrics::product_emissions(&rows, &resolved);

    Ok(Json(json!({ "count": data.len(), "data": data })))
}

pub async fn trends(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    let rows = state.warehouse.monthly_operation_totals().await?;

    Ok(Json(json!({ "data": metrics::monthly_trend(&rows) })))
}

pub async fn bill_insights(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    let rows = state.warehouse.bill_breakdown().await?;

    Ok(Json(json!({ "data": metrics::bill_insights(&rows) })))
}

pub async fn company_kpis(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    let total = state.warehouse.company_co2_total().await?;

    Ok(Json(json!({ "total_company_co2": total })))
}

/// Product and utility CO2 per month, outer-joined so one-sided months
/// still appear.
pub async fn total_footprint(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>> {
    let operations = state.warehouse.monthly_operation_totals().await?;
    let bills = state.warehouse.bill_breakdown().await?;

    Ok(Json(json!({ "data": metrics::combine_footprint(&operations, &bills) })))
}
