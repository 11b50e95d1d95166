//! Post-processing of warehouse aggregates into response series.
//!
//! The warehouse returns plain sums; everything observable (factor
//! multiplication, zero-defaulting, rounding, trend deltas, the
//! cross-source footprint merge) happens here so it can be unit tested
//! without a database.

use crate::factors::{
    bill_emission_factor, ResolvedFactors, DEFAULT_ELECTRICITY_FACTOR, DEFAULT_FREIGHT_FACTOR,
};
use crate::warehouse::{BillBreakdownRow, MonthlyOperationTotals, ProductTotalsRow};
use serde::Serialize;
use std::collections::BTreeMap;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// One product's emissions, with the factor citations that were applied.
#[derive(Debug, Clone, Serialize)]
pub struct ProductEmissions {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub total_units_sold: i64,
    pub energy_co2_kg: f64,
    pub transport_co2_kg: f64,
    pub total_co2_kg: f64,
    pub energy_ref: String,
    pub transport_ref: String,
}

/// Multiplies per-product sums by the supplied factors. Values stay
/// unrounded; clients and exporters format as they need.
pub fn product_emissions(rows: &[ProductTotalsRow], factors: &ResolvedFactors) -> Vec<ProductEmissions> {
    rows.iter()
        .map(|row| {
            let energy_co2 = row.energy.unwrap_or(0.0) * factors.electricity.factor;
            let transport_co2 = row.km.unwrap_or(0.0) * factors.freight.factor;

            ProductEmissions {
                product_id: row.product_id.clone(),
                product_name: row.product_name.clone(),
                category: row.category.clone(),
                total_units_sold: row.units.unwrap_or(0),
                energy_co2_kg: energy_co2,
                transport_co2_kg: transport_co2,
                total_co2_kg: energy_co2 + transport_co2,
                energy_ref: factors.electricity.reference.clone(),
                transport_ref: factors.freight.reference.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub month: String,
    pub total_co2: f64,
    pub co2_per_unit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_change: Option<f64>,
}

/// Derives the monthly trend series from per-month operation sums, always
/// on the fixed default factors.
///
/// `co2_per_unit` is 0 for a month with no units; `efficiency_change` is the
/// percentage change of `co2_per_unit` against the previous month, absent
/// for the first month and for any month whose predecessor sat at 0.
pub fn monthly_trend(rows: &[MonthlyOperationTotals]) -> Vec<TrendPoint> {
    let mut points = Vec::with_capacity(rows.len());
    let mut prev_cpu: Option<f64> = None;

    for row in rows {
        let total = row.energy.unwrap_or(0.0) * DEFAULT_ELECTRICITY_FACTOR
            + row.km.unwrap_or(0.0) * DEFAULT_FREIGHT_FACTOR;
        let units = row.units.unwrap_or(0);

        let cpu = if units > 0 {
            round4(total / units as f64)
        } else {
            0.0
        };

        let efficiency_change = match prev_cpu {
            Some(prev) if prev != 0.0 => Some(round2((cpu - prev) / prev * 100.0)),
            _ => None,
        };

        points.push(TrendPoint {
            month: row.month.clone(),
            total_co2: round2(total),
            co2_per_unit: cpu,
            efficiency_change,
        });

        prev_cpu = Some(cpu);
    }

    points
}

#[derive(Debug, Clone, Serialize)]
pub struct BillInsight {
    pub month: String,
    pub region: String,
    pub bill_type: String,
    pub estimated_co2: f64,
}

/// Applies the fixed bill factor table to summed billing units.
pub fn bill_insights(rows: &[BillBreakdownRow]) -> Vec<BillInsight> {
    rows.iter()
        .map(|row| BillInsight {
            month: row.month.clone(),
            region: row.region.clone(),
            bill_type: row.bill_type.clone(),
            estimated_co2: row.units.unwrap_or(0.0) * bill_emission_factor(&row.bill_type),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct FootprintPoint {
    pub month: String,
    pub product_co2: f64,
    pub utility_co2: f64,
    pub total_co2: f64,
}

/// Outer-joins monthly product CO2 against monthly utility CO2 on the month
/// key. A month present in only one source still appears, with the missing
/// side at zero. `BTreeMap` ordering keeps the series chronological since
/// the keys are `"YYYY-MM"` strings.
pub fn combine_footprint(
    operations: &[MonthlyOperationTotals],
    bills: &[BillBreakdownRow],
) -> Vec<FootprintPoint> {
    let mut merged: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for row in operations {
        let co2 = row.energy.unwrap_or(0.0) * DEFAULT_ELECTRICITY_FACTOR
            + row.km.unwrap_or(0.0) * DEFAULT_FREIGHT_FACTOR;
        merged.entry(row.month.clone()).or_default().0 += co2;
    }

    for row in bills {
        let co2 = row.units.unwrap_or(0.0) * bill_emission_factor(&row.bill_type);
        merged.entry(row.month.clone()).or_default().1 += co2;
    }

    merged
        .into_iter()
        .map(|(month, (product_co2, utility_co2))| FootprintPoint {
            month,
            product_co2,
            utility_co2,
            total_co2: product_co2 + utility_co2,
        })
        .collect()
}
