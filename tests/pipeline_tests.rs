use chrono::NaiveDate;
use greenmetrics::metrics::{bill_insights, combine_footprint, monthly_trend, product_emissions};
use greenmetrics::warehouse::{BillBreakdownRow, MonthlyOperationTotals, ProductTotalsRow};
use greenmetrics::*;
use std::collections::BTreeMap;

fn monthly(month: &str, energy: f64, km: f64, units: i64) -> MonthlyOperationTotals {
    MonthlyOperationTotals {
        month: month.to_string(),
        energy: Some(energy),
        km: Some(km),
        units: Some(units),
    }
}

fn bill(month: &str, region: &str, bill_type: &str, units: f64) -> BillBreakdownRow {
    BillBreakdownRow {
        month: month.to_string(),
        region: region.to_string(),
        bill_type: bill_type.to_string(),
        units: Some(units),
    }
}

/// Sums parsed CSV records per product the way the warehouse query would.
fn totals_by_product(records: &[OperationRecord]) -> Vec<ProductTotalsRow> {
    let mut grouped: BTreeMap<String, (i64, f64, f64)> = BTreeMap::new();

    for record in records {
        let entry = grouped.entry(record.product_id.clone()).or_default();
        entry.0 += i64::from(record.units_sold);
        entry.1 += record.energy_kwh;
        entry.2 += record.transport_km;
    }

    grouped
        .into_iter()
        .map(|(product_id, (units, energy, km))| ProductTotalsRow {
            product_name: product_id.clone(),
            category: "Unknown".to_string(),
            product_id,
            units: Some(units),
            energy: Some(energy),
            km: Some(km),
        })
        .collect()
}

#[test]
fn test_csv_upload_to_product_metrics() -> anyhow::Result<()> {
    let csv = b"product_id,units_sold,energy_kwh,transport_km,record_date,notes\n\
                P1,10,5.0,2.0,2024-01-01,baseline product\n\
                SOLAR-PANEL-A,120,86.4,340.0,2024-01-15,\n\
                SOLAR-PANEL-A,95,71.2,265.5,2024-02-12,restock\n\
                LED-BULB-4PK,400,12.5,88.0,2024-01-20,\n";

    let records = parse_operations_csv(csv)?;
    assert_eq!(records.len(), 4);
    assert_eq!(
        records[0].record_date,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );

    let totals = totals_by_product(&records);
    let products = product_emissions(&totals, &ResolvedFactors::fixed_defaults());

    let p1 = products
        .iter()
        .find(|p| p.product_id == "P1")
        .expect("P1 should be present");
    assert_eq!(p1.total_units_sold, 10);
    assert!(
        (p1.total_co2_kg - 4.205).abs() < 1e-9,
        "P1 total should be 5*0.82 + 2*0.0525 = 4.205, got {}",
        p1.total_co2_kg
    );

    let solar = products
        .iter()
        .find(|p| p.product_id == "SOLAR-PANEL-A")
        .expect("solar panel should be present");
    assert_eq!(solar.total_units_sold, 215);
    assert!((solar.energy_co2_kg - (86.4 + 71.2) * 0.82).abs() < 1e-9);
    assert!((solar.transport_co2_kg - (340.0 + 265.5) * 0.0525).abs() < 1e-9);

    println!("✓ CSV upload to product metrics pipeline test passed");
    Ok(())
}

#[test]
fn test_monthly_trend_series() {
    let rows = vec![
        monthly("2024-01", 100.0, 40.0, 50), // 84.1 total, 1.682 per unit
        monthly("2024-02", 120.0, 40.0, 60), // 100.5 total, 1.675 per unit
        monthly("2024-03", 80.0, 20.0, 0),   // no units sold
    ];

    let trend = monthly_trend(&rows);

    assert_eq!(trend.len(), 3);
    assert_eq!(trend[0].month, "2024-01");
    assert!((trend[0].total_co2 - 84.1).abs() < 1e-9);
    assert!((trend[0].co2_per_unit - 1.682).abs() < 1e-9);
    assert!(
        trend[0].efficiency_change.is_none(),
        "first month has no baseline to compare against"
    );

    assert!((trend[1].total_co2 - 100.5).abs() < 1e-9);
    assert_eq!(trend[1].efficiency_change, Some(-0.42));

    assert_eq!(trend[2].co2_per_unit, 0.0);
    assert_eq!(trend[2].efficiency_change, Some(-100.0));

    println!("✓ Monthly trend series test passed");
}

#[test]
fn test_bill_entry_estimates() {
    // 100 electricity units at 0.82 kg/unit
    assert!((100.0 * bill_emission_factor("electricity") - 82.0).abs() < 1e-9);
    assert_eq!(bill_emission_factor("water"), 0.0);

    let march = parse_month_key("2024-03").unwrap();
    assert_eq!(march, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

    assert!(matches!(
        parse_month_key("03-2024"),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        parse_month_key("2024-00"),
        Err(ServiceError::Date(_))
    ));
}

#[test]
fn test_bill_insights_group_by_type() {
    let rows = vec![
        bill("2024-01", "India", "electricity", 450.0),
        bill("2024-01", "India", "fuel", 60.0),
        bill("2024-02", "India", "electricity", 380.0),
    ];

    let insights = bill_insights(&rows);

    assert_eq!(insights.len(), 3);
    assert!((insights[0].estimated_co2 - 369.0).abs() < 1e-9);
    assert!((insights[1].estimated_co2 - 160.8).abs() < 1e-9);
    assert!((insights[2].estimated_co2 - 311.6).abs() < 1e-9);
}

#[test]
fn test_total_footprint_outer_join() {
    let operations = vec![
        monthly("2024-01", 100.0, 0.0, 40), // 82.0
        monthly("2024-02", 50.0, 0.0, 20),  // 41.0
    ];
    let bills = vec![
        bill("2024-02", "India", "electricity", 200.0), // 164.0
        bill("2024-03", "India", "fuel", 25.0),         // 67.0
    ];

    let series = combine_footprint(&operations, &bills);

    assert_eq!(series.len(), 3, "three distinct months should appear");

    assert_eq!(series[0].month, "2024-01");
    assert!((series[0].product_co2 - 82.0).abs() < 1e-9);
    assert_eq!(series[0].utility_co2, 0.0);

    assert_eq!(series[1].month, "2024-02");
    assert!((series[1].product_co2 - 41.0).abs() < 1e-9);
    assert!((series[1].utility_co2 - 164.0).abs() < 1e-9);
    assert!((series[1].total_co2 - 205.0).abs() < 1e-9);

    assert_eq!(series[2].month, "2024-03");
    assert_eq!(series[2].product_co2, 0.0);
    assert!((series[2].utility_co2 - 67.0).abs() < 1e-9);

    println!("✓ Total footprint outer join test passed");
}

#[test]
fn test_reports_render_from_the_same_metrics() {
    let totals = vec![
        ProductTotalsRow {
            product_id: "SOLAR-PANEL-A".to_string(),
            product_name: "Solar Panel A".to_string(),
            category: "Energy".to_string(),
            units: Some(215),
            energy: Some(157.6),
            km: Some(605.5),
        },
        ProductTotalsRow {
            product_id: "LED-BULB-4PK".to_string(),
            product_name: "LED Bulb 4-Pack".to_string(),
            category: "Lighting".to_string(),
            units: Some(400),
            energy: Some(12.5),
            km: Some(88.0),
        },
    ];
    let products = product_emissions(&totals, &ResolvedFactors::fixed_defaults());

    let workbook = product_workbook(&products).unwrap();
    assert_eq!(&workbook[..2], b"PK", "xlsx output should be a zip archive");

    // 1x1 PNG standing in for a browser-rendered chart
    let tiny_png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    let charts = ReportCharts {
        trend_chart: Some(format!("data:image/png;base64,{tiny_png}")),
        footprint_chart: None,
        bill_chart: Some(tiny_png.to_string()),
    };

    let document = emissions_report(&products, &charts).unwrap();
    assert_eq!(&document[..4], b"%PDF");

    println!("✓ Report rendering test passed");
}

#[tokio::test]
async fn test_object_store_retains_raw_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let store = ObjectStore::open(dir.path().join("bucket")).unwrap();

    let csv = b"product_id,units_sold,energy_kwh,transport_km,record_date\nP1,1,1.0,1.0,2024-01-01\n";
    let object_name = format!("{}_operations.csv", uuid::Uuid::new_v4());

    store.put(&object_name, csv).await.unwrap();

    let written = std::fs::read(dir.path().join("bucket").join(&object_name)).unwrap();
    assert_eq!(written, csv);
}
