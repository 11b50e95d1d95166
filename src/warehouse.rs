//! Parameterized access to the analytics warehouse.
//!
//! Every SQL statement the service issues lives here. Aggregates come back
//! as `Option` sums so the zero-defaulting invariant is applied visibly in
//! the post-processing layer rather than hidden inside queries.

use crate::error::Result;
use crate::ingestion::OperationRecord;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use uuid::Uuid;

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_DELETED: &str = "DELETED";

const UPLOAD_HISTORY_LIMIT: i64 = 20;

/// Per-product sums joined against the catalogue; missing catalogue entries
/// fall back to the product id and an "Unknown" category in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct ProductTotalsRow {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub units: Option<i64>,
    pub energy: Option<f64>,
    pub km: Option<f64>,
}

/// Per-calendar-month sums over the operations table.
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyOperationTotals {
    pub month: String,
    pub energy: Option<f64>,
    pub km: Option<f64>,
    pub units: Option<i64>,
}

/// Summed billing units per (month, region, bill_type).
#[derive(Debug, Clone, FromRow)]
pub struct BillBreakdownRow {
    pub month: String,
    pub region: String,
    pub bill_type: String,
    pub units: Option<f64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadLogRow {
    pub upload_id: String,
    pub upload_time: DateTime<Utc>,
    pub file_name: String,
    pub rows_loaded: i32,
    pub status: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct EmissionFactorRow {
    pub factor: f64,
    pub reference: String,
}

/// Handle on the warehouse connection pool. Constructed once at startup and
/// shared across requests; cloning shares the underlying pool.
#[derive(Clone)]
pub struct Warehouse {
    pool: PgPool,
}

impl Warehouse {
    /// Builds the pool without touching the network; the first query pays
    /// the connection cost, mirroring the per-request clients this replaces.
    pub fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    pub async fn append_operations(&self, rows: &[OperationRecord]) -> Result<u64> {
        let mut product_ids = Vec::with_capacity(rows.len());
        let mut units = Vec::with_capacity(rows.len());
        let mut energy = Vec::with_capacity(rows.len());
        let mut km = Vec::with_capacity(rows.len());
        let mut dates = Vec::with_capacity(rows.len());

        for row in rows {
            product_ids.push(row.product_id.clone());
            units.push(row.units_sold);
            energy.push(row.energy_kwh);
            km.push(row.transport_km);
            dates.push(row.record_date);
        }

        let result = sqlx::query(
            "INSERT INTO sustainability.operations \
             (product_id, units_sold, energy_kwh, transport_km, record_date) \
             SELECT * FROM UNNEST($1::text[], $2::int4[], $3::float8[], $4::float8[], $5::date[])",
        )
        .bind(&product_ids)
        .bind(&units)
        .bind(&energy)
        .bind(&km)
        .bind(&dates)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn log_upload(&self, upload_id: &str, file_name: &str, rows_loaded: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO sustainability.upload_log \
             (upload_id, upload_time, file_name, rows_loaded, status) \
             VALUES ($1, now(), $2, $3, $4)",
        )
        .bind(upload_id)
        .bind(file_name)
        .bind(rows_loaded)
        .bind(STATUS_SUCCESS)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_bill(
        &self,
        bill_id: Uuid,
        bill_type: &str,
        amount: f64,
        units: f64,
        region: &str,
        month: NaiveDate,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sustainability.utility_bills \
             (bill_id, bill_type, amount, units, region, month, upload_time) \
             VALUES ($1, $2, $3, $4, $5, $6, now())",
        )
        .bind(bill_id)
        .bind(bill_type)
        .bind(amount)
        .bind(units)
        .bind(region)
        .bind(month)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent non-deleted upload-log entries, newest first.
    pub async fn recent_uploads(&self) -> Result<Vec<UploadLogRow>> {
        let rows = sqlx::query_as::<_, UploadLogRow>(
            "SELECT upload_id, upload_time, file_name, rows_loaded, status \
             FROM sustainability.upload_log \
             WHERE status <> $1 \
             ORDER BY upload_time DESC \
             LIMIT $2",
        )
        .bind(STATUS_DELETED)
        .bind(UPLOAD_HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Marks one upload-log entry deleted. A missing id updates zero rows,
    /// which callers treat as success.
    pub async fn soft_delete_upload(&self, upload_id: &str) -> Result<()> {
        sqlx::query("UPDATE sustainability.upload_log SET status = $1 WHERE upload_id = $2")
            .bind(STATUS_DELETED)
            .bind(upload_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Wipes all ingested data. The three deletes are deliberately
    /// independent statements: a failure part-way through leaves the earlier
    /// deletes committed.
    pub async fn clear_all_data(&self) -> Result<()> {
        sqlx::query("DELETE FROM sustainability.operations")
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM sustainability.utility_bills")
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM sustainability.upload_log")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn product_totals(&self, since: Option<NaiveDate>) -> Result<Vec<ProductTotalsRow>> {
        let rows = sqlx::query_as::<_, ProductTotalsRow>(
            "SELECT o.product_id, \
                    COALESCE(p.product_name, o.product_id) AS product_name, \
                    COALESCE(p.category, 'Unknown') AS category, \
                    SUM(o.units_sold) AS units, \
                    SUM(o.energy_kwh) AS energy, \
                    SUM(o.transport_km) AS km \
             FROM sustainability.operations o \
             LEFT JOIN sustainability.product_catalogue p ON o.product_id = p.product_id \
             WHERE ($1::date IS NULL OR o.record_date >= $1::date) \
             GROUP BY o.product_id, p.product_name, p.category \
             ORDER BY product_name",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn monthly_operation_totals(&self) -> Result<Vec<MonthlyOperationTotals>> {
        let rows = sqlx::query_as::<_, MonthlyOperationTotals>(
            "SELECT to_char(record_date, 'YYYY-MM') AS month, \
                    SUM(energy_kwh) AS energy, \
                    SUM(transport_km) AS km, \
                    SUM(units_sold) AS units \
             FROM sustainability.operations \
             GROUP BY month \
             ORDER BY month",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn bill_breakdown(&self) -> Result<Vec<BillBreakdownRow>> {
        let rows = sqlx::query_as::<_, BillBreakdownRow>(
            "SELECT to_char(month, 'YYYY-MM') AS month, \
                    region, \
                    bill_type, \
                    SUM(units) AS units \
             FROM sustainability.utility_bills \
             GROUP BY to_char(month, 'YYYY-MM'), region, bill_type \
             ORDER BY 1, 2, 3",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn company_co2_total(&self) -> Result<f64> {
        let row: (Option<f64>,) = sqlx::query_as("SELECT SUM(co2) FROM sustainability.company_emissions")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0.unwrap_or(0.0))
    }

    /// Factor and citation from the most recent year on record for an exact
    /// (region, activity) match. `None` when no row matches; callers apply
    /// the documented defaults.
    pub async fn latest_emission_factor(
        &self,
        region: &str,
        activity: &str,
    ) -> Result<Option<EmissionFactorRow>> {
        let row = sqlx::query_as::<_, EmissionFactorRow>(
            "SELECT factor, reference \
             FROM sustainability.emission_factors \
             WHERE region = $1 AND activity_type = $2 \
             ORDER BY year DESC \
             LIMIT 1",
        )
        .bind(region)
        .bind(activity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
