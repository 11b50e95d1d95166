//! Downloadable report documents.

pub mod excel;
pub mod pdf;

pub use excel::product_workbook;
pub use pdf::{emissions_report, ReportCharts};
