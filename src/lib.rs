//! # GreenMetrics
//!
//! A web backend that turns uploaded operational data and utility bills into
//! CO2-equivalent metrics, trend series and exportable reports.
//!
//! ## Core concepts
//!
//! - **Operations**: per-product daily rows (units sold, energy used,
//!   transport distance) bulk-loaded from CSV uploads
//! - **Utility bills**: manually entered monthly bills (electricity, fuel,
//!   courier) with CO2 estimated from a fixed factor table
//! - **Emission factors**: kg-CO2e per unit of activity, resolved from the
//!   warehouse per region with documented defaults as fallback
//! - **Warehouse**: the external analytics database; this process owns no
//!   persisted state of its own
//!
//! ## Example
//!
//! ```rust,ignore
//! use greenmetrics::{api, AppState, Config, ObjectStore, Warehouse};
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! let warehouse = Warehouse::connect(&config.database_url)?;
//! let store = ObjectStore::open(&config.bucket_dir)?;
//!
//! let app = api::router(Arc::new(AppState::new(config, warehouse, store)));
//! // serve `app` with axum
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod factors;
pub mod ingestion;
pub mod metrics;
pub mod reports;
pub mod state;
pub mod storage;
pub mod warehouse;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use factors::{bill_emission_factor, EmissionFactor, ResolvedFactors};
pub use ingestion::{
    parse_month_key, parse_operations_csv, run_ingest, IngestError, IngestReceipt, OperationRecord,
};
pub use metrics::{BillInsight, FootprintPoint, ProductEmissions, TrendPoint};
pub use reports::{emissions_report, product_workbook, ReportCharts};
pub use state::AppState;
pub use storage::ObjectStore;
pub use warehouse::Warehouse;
