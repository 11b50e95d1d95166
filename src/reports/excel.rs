//! Single-sheet workbook of per-product emissions.

use crate::error::{Result, ServiceError};
use crate::metrics::ProductEmissions;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

const HEADERS: [&str; 7] = [
    "product_id",
    "product_name",
    "category",
    "total_units_sold",
    "energy_co2_kg",
    "transport_co2_kg",
    "total_co2_kg",
];

fn xlsx_err(e: XlsxError) -> ServiceError {
    ServiceError::Report(e.to_string())
}

/// Renders the product table as xlsx bytes: a bold header row, one row per
/// product, numbers written as numbers so spreadsheet formulas work on them.
pub fn product_workbook(rows: &[ProductEmissions]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Product Emissions").map_err(xlsx_err)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_err)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet
            .write_string(r, 0, row.product_id.as_str())
            .map_err(xlsx_err)?;
        worksheet
            .write_string(r, 1, row.product_name.as_str())
            .map_err(xlsx_err)?;
        worksheet
            .write_string(r, 2, row.category.as_str())
            .map_err(xlsx_err)?;
        worksheet
            .write_number(r, 3, row.total_units_sold as f64)
            .map_err(xlsx_err)?;
        worksheet
            .write_number(r, 4, row.energy_co2_kg)
            .map_err(xlsx_err)?;
        worksheet
            .write_number(r, 5, row.transport_co2_kg)
            .map_err(xlsx_err)?;
        worksheet
            .write_number(r, 6, row.total_co2_kg)
            .map_err(xlsx_err)?;
    }

    worksheet.set_column_width(1, 24).map_err(xlsx_err)?;
    worksheet.set_column_width(2, 16).map_err(xlsx_err)?;
    for col in 3..7u16 {
        worksheet.set_column_width(col, 18).map_err(xlsx_err)?;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
