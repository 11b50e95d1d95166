//! Paginated emissions report with optional embedded chart images.
//!
//! Clients render charts in the browser and post them as base64 PNGs; the
//! document keeps its three section headings whether or not the matching
//! image arrived.

use crate::error::{Result, ServiceError};
use crate::metrics::ProductEmissions;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use printpdf::image_crate::{DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use serde::Deserialize;
use std::cmp::Ordering;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const FOOTER_Y: f32 = 10.0;
const CONTENT_BOTTOM: f32 = 22.0;
const LINE_GAP: f32 = 6.0;
const MAX_CHART_HEIGHT: f32 = 110.0;

const FOOTER_TEXT: &str = "Generated by the GreenMetrics sustainability service";

const TABLE_HEADERS: [&str; 6] = [
    "Product",
    "Category",
    "Units",
    "Energy CO2",
    "Transport CO2",
    "Total CO2",
];
const COL_X: [f32; 6] = [18.0, 62.0, 92.0, 112.0, 136.0, 164.0];

/// Chart images for the report, each a data-URI or bare base64 PNG string.
/// The whole request body may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportCharts {
    #[serde(default)]
    pub trend_chart: Option<String>,
    #[serde(default)]
    pub footprint_chart: Option<String>,
    #[serde(default)]
    pub bill_chart: Option<String>,
}

fn pdf_err(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Report(e.to_string())
}

/// Strips an optional `data:image/png;base64,` prefix and decodes.
fn decode_chart(value: &str) -> Result<Vec<u8>> {
    let encoded = match value.split_once("base64,") {
        Some((_, rest)) => rest,
        None => value,
    };

    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServiceError::Report(format!("invalid chart image: {e}")))
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{clipped}...")
    }
}

/// Cells for one product table row; every numeric column renders at two
/// decimal places.
fn table_cells(product: &ProductEmissions) -> [String; 6] {
    [
        clip(&product.product_name, 26),
        clip(&product.category, 16),
        format!("{:.2}", product.total_units_sold as f64),
        format!("{:.2}", product.energy_co2_kg),
        format!("{:.2}", product.transport_co2_kg),
        format!("{:.2}", product.total_co2_kg),
    ]
}

/// Top-down page cursor. Every page gets its footer when created; content
/// that would cross the bottom margin moves to a fresh page first.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    font: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    page_no: usize,
}

impl<'a> PageWriter<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        first_layer: PdfLayerReference,
        font: &'a IndirectFontRef,
        bold: &'a IndirectFontRef,
    ) -> Self {
        let writer = Self {
            doc,
            font,
            bold,
            layer: first_layer,
            y: PAGE_HEIGHT - MARGIN,
            page_no: 1,
        };
        writer.footer();
        writer
    }

    fn footer(&self) {
        self.layer.use_text(
            format!("{FOOTER_TEXT} - page {}", self.page_no),
            8.0,
            Mm(MARGIN),
            Mm(FOOTER_Y),
            self.font,
        );
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.page_no += 1;
        self.footer();
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < CONTENT_BOTTOM {
            self.new_page();
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, advance: f32) {
        self.ensure_room(advance);
        let font = if bold { self.bold } else { self.font };
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= advance;
    }

    /// Embeds a PNG scaled to the content width (capped in height), moving
    /// the cursor below it.
    fn image(&mut self, png: &[u8]) -> Result<()> {
        let decoded = printpdf::image_crate::load_from_memory(png)
            .map_err(|e| ServiceError::Report(format!("unreadable chart image: {e}")))?;
        let (px_w, px_h) = decoded.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(ServiceError::Report("empty chart image".to_string()));
        }

        let mut width_mm = PAGE_WIDTH - 2.0 * MARGIN;
        let mut height_mm = px_h as f32 * width_mm / px_w as f32;
        if height_mm > MAX_CHART_HEIGHT {
            width_mm *= MAX_CHART_HEIGHT / height_mm;
            height_mm = MAX_CHART_HEIGHT;
        }

        self.ensure_room(height_mm + LINE_GAP);

        // alpha channels render as garbage, so flatten to RGB first
        let flattened = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let image = Image::from_dynamic_image(&flattened);

        // dpi that makes px_w pixels span width_mm on the page
        let dpi = px_w as f32 * 25.4 / width_mm;

        self.y -= height_mm;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y -= LINE_GAP;

        Ok(())
    }

    fn table_header(&mut self) {
        self.ensure_room(7.0);
        for (x, header) in COL_X.iter().zip(TABLE_HEADERS) {
            self.layer.use_text(header, 9.0, Mm(*x), Mm(self.y), self.bold);
        }
        self.y -= 6.0;
    }

    fn table_row(&mut self, product: &ProductEmissions) {
        if self.y - 5.0 < CONTENT_BOTTOM {
            self.new_page();
            self.table_header();
        }

        for (x, cell) in COL_X.iter().zip(table_cells(product)) {
            self.layer.use_text(cell, 9.0, Mm(*x), Mm(self.y), self.font);
        }
        self.y -= 5.0;
    }
}

/// Builds the report: title, generation timestamp, the three chart sections,
/// then the product table ranked by total CO2 descending.
pub fn emissions_report(products: &[ProductEmissions], charts: &ReportCharts) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Sustainability Emissions Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "content",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let first_layer = doc.get_page(page).get_layer(layer);
    let mut writer = PageWriter::new(&doc, first_layer, &font, &bold);

    writer.line("Sustainability Emissions Report", 18.0, true, 10.0);
    writer.line(
        &format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC")),
        10.0,
        false,
        10.0,
    );

    let sections = [
        ("Monthly CO2 Trend", charts.trend_chart.as_deref()),
        ("Total Footprint by Month", charts.footprint_chart.as_deref()),
        ("Utility Bill Emissions", charts.bill_chart.as_deref()),
    ];
    for (heading, chart) in sections {
        writer.line(heading, 13.0, true, 8.0);
        if let Some(encoded) = chart {
            let png = decode_chart(encoded)?;
            writer.image(&png)?;
        }
    }

    writer.line("Product Emissions (highest impact first)", 13.0, true, 8.0);
    writer.table_header();

    let mut ranked: Vec<&ProductEmissions> = products.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_co2_kg
            .partial_cmp(&a.total_co2_kg)
            .unwrap_or(Ordering::Equal)
    });
    for product in ranked {
        writer.table_row(product);
    }

    doc.save_to_bytes().map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::ResolvedFactors;
    use crate::metrics::product_emissions;
    use crate::warehouse::ProductTotalsRow;

    // 1x1 PNG
    const TINY_PNG: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn sample_products() -> Vec<ProductEmissions> {
        let rows = vec![
            ProductTotalsRow {
                product_id: "SKU-1".to_string(),
                product_name: "Widget".to_string(),
                category: "Hardware".to_string(),
                units: Some(10),
                energy: Some(5.0),
                km: Some(2.0),
            },
            ProductTotalsRow {
                product_id: "SKU-2".to_string(),
                product_name: "Gadget".to_string(),
                category: "Hardware".to_string(),
                units: Some(4),
                energy: Some(50.0),
                km: Some(10.0),
            },
        ];
        product_emissions(&rows, &ResolvedFactors::fixed_defaults())
    }

    #[test]
    fn test_decode_accepts_bare_and_data_uri_base64() {
        let bare = decode_chart(TINY_PNG).unwrap();
        let uri = decode_chart(&format!("data:image/png;base64,{TINY_PNG}")).unwrap();

        assert_eq!(bare, uri);
        // PNG signature
        assert_eq!(&bare[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_chart("definitely not base64!!!").is_err());
    }

    #[test]
    fn test_report_without_charts_has_pdf_magic() {
        let bytes = emissions_report(&sample_products(), &ReportCharts::default()).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn test_report_embeds_supplied_charts() {
        let charts = ReportCharts {
            trend_chart: Some(format!("data:image/png;base64,{TINY_PNG}")),
            footprint_chart: Some(TINY_PNG.to_string()),
            bill_chart: None,
        };

        let bytes = emissions_report(&sample_products(), &charts).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn test_report_paginates_large_tables() {
        let rows: Vec<ProductTotalsRow> = (0..120)
            .map(|i| ProductTotalsRow {
                product_id: format!("SKU-{i}"),
                product_name: format!("Product {i}"),
                category: "Bulk".to_string(),
                units: Some(i),
                energy: Some(i as f64),
                km: Some(1.0),
            })
            .collect();
        let products = product_emissions(&rows, &ResolvedFactors::fixed_defaults());

        let bytes = emissions_report(&products, &ReportCharts::default()).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn test_clip_shortens_long_names() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a very long product name", 10), "a very ...");
    }

    #[test]
    fn test_table_cells_format_every_number_to_two_decimals() {
        let product = ProductEmissions {
            product_id: "SKU-1".to_string(),
            product_name: "Widget".to_string(),
            category: "Hardware".to_string(),
            total_units_sold: 10,
            energy_co2_kg: 4.1,
            transport_co2_kg: 0.2,
            total_co2_kg: 4.3,
            energy_ref: "Default".to_string(),
            transport_ref: "Default".to_string(),
        };

        let cells = table_cells(&product);

        assert_eq!(cells[2], "10.00");
        assert_eq!(cells[3], "4.10");
        assert_eq!(cells[4], "0.20");
        assert_eq!(cells[5], "4.30");
    }
}
