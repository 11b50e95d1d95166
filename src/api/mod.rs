//! HTTP surface: route table and shared-state wiring.

pub mod admin;
pub mod export;
pub mod ingest;
pub mod insights;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Builds the service router. `/static` is only mounted when the directory
/// exists, so the API stays usable without bundled assets.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route_service("/", ServeFile::new("static/index.html"))
        .route("/upload", post(ingest::upload_csv))
        .route("/upload-bill", post(ingest::upload_bill))
        .route("/metrics", get(insights::product_metrics))
        .route("/trends", get(insights::trends))
        .route("/bill-insights", get(insights::bill_insights))
        .route("/company-kpis", get(insights::company_kpis))
        .route("/total-footprint", get(insights::total_footprint))
        .route("/uploads", get(admin::upload_history))
        .route("/uploads/:upload_id", delete(admin::delete_upload))
        .route("/reset-all", delete(admin::reset_all))
        .route("/export/excel", get(export::excel_report))
        .route("/export/pdf", post(export::pdf_report));

    if Path::new("static").is_dir() {
        router = router.nest_service("/static", ServeDir::new("static"));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(state))
}
