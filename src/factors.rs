//! Emission factor resolution.
//!
//! Product metrics resolve factors from the warehouse at request time and
//! fall back to fixed defaults when no row matches. Utility bills use a
//! fixed per-unit table and never hit the warehouse.

use crate::error::Result;
use crate::warehouse::Warehouse;

pub const DEFAULT_ELECTRICITY_FACTOR: f64 = 0.82;
pub const DEFAULT_FREIGHT_FACTOR: f64 = 0.0525;
pub const DEFAULT_REFERENCE: &str = "Default";

pub const ACTIVITY_ELECTRICITY: &str = "electricity";
pub const ACTIVITY_FREIGHT: &str = "freight_truck";

/// Freight factors are published per tonne-km without a regional split, so
/// lookups always use this region regardless of the configured one.
pub const REGION_GLOBAL: &str = "Global";

/// A kg-CO2e-per-unit factor together with the citation it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactor {
    pub factor: f64,
    pub reference: String,
}

impl EmissionFactor {
    fn fallback(factor: f64) -> Self {
        Self {
            factor,
            reference: DEFAULT_REFERENCE.to_string(),
        }
    }
}

/// The pair of factors a product-metrics request runs on.
#[derive(Debug, Clone)]
pub struct ResolvedFactors {
    pub electricity: EmissionFactor,
    pub freight: EmissionFactor,
}

impl ResolvedFactors {
    /// The documented defaults, used by the endpoints that skip warehouse
    /// resolution entirely.
    pub fn fixed_defaults() -> Self {
        Self {
            electricity: EmissionFactor::fallback(DEFAULT_ELECTRICITY_FACTOR),
            freight: EmissionFactor::fallback(DEFAULT_FREIGHT_FACTOR),
        }
    }
}

/// Looks up the electricity factor for `region` and the freight factor for
/// [`REGION_GLOBAL`], each from the most recent year on record.
pub async fn resolve_product_factors(warehouse: &Warehouse, region: &str) -> Result<ResolvedFactors> {
    let electricity = lookup(
        warehouse,
        region,
        ACTIVITY_ELECTRICITY,
        DEFAULT_ELECTRICITY_FACTOR,
    )
    .await?;

    let freight = lookup(
        warehouse,
        REGION_GLOBAL,
        ACTIVITY_FREIGHT,
        DEFAULT_FREIGHT_FACTOR,
    )
    .await?;

    Ok(ResolvedFactors { electricity, freight })
}

async fn lookup(
    warehouse: &Warehouse,
    region: &str,
    activity: &str,
    default_factor: f64,
) -> Result<EmissionFactor> {
    let resolved = match warehouse.latest_emission_factor(region, activity).await? {
        Some(row) => EmissionFactor {
            factor: row.factor,
            reference: row.reference,
        },
        None => EmissionFactor::fallback(default_factor),
    };

    Ok(resolved)
}

/// Fixed kg-CO2e-per-unit factors for utility bills. Unrecognised bill
/// types contribute zero emissions rather than failing the insert.
pub fn bill_emission_factor(bill_type: &str) -> f64 {
    match bill_type {
        "electricity" => 0.82,
        "fuel" => 2.68,
        "courier" => 0.18,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_factors_match_fixed_table() {
        assert_eq!(bill_emission_factor("electricity"), 0.82);
        assert_eq!(bill_emission_factor("fuel"), 2.68);
        assert_eq!(bill_emission_factor("courier"), 0.18);
    }

    #[test]
    fn test_unknown_bill_type_contributes_nothing() {
        assert_eq!(bill_emission_factor("water"), 0.0);
        assert_eq!(bill_emission_factor(""), 0.0);
    }

    #[test]
    fn test_fallback_carries_default_reference() {
        let factor = EmissionFactor::fallback(DEFAULT_FREIGHT_FACTOR);
        assert_eq!(factor.factor, 0.0525);
        assert_eq!(factor.reference, "Default");
    }
}
