//! Order report and receipt documents.
//!
//! Every emitter takes orders that were already filtered and sorted, and
//! returns the whole file in memory. A failure anywhere aborts the export.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::info;

use crate::models::{OrderDetail, OrderSummary};

/// Content type of generated spreadsheets.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: f32 = 280.0;
const BOTTOM: f32 = 18.0;
const LAYER: &str = "Conteudo";

/// Errors from document generation.
#[derive(Debug, Error)]
pub enum ExportError {
    /// PDF generation failed.
    #[error("pdf error: {0}")]
    Pdf(#[from] printpdf::Error),

    /// Spreadsheet generation failed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] XlsxError),

    /// The report has more rows than a worksheet holds.
    #[error("too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

/// A PDF being written top to bottom, breaking pages as needed.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, LAYER);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
        })
    }

    /// Write one line of cells `(x, text)` and move down by `height`.
    fn row(&mut self, cells: &[(f32, &str)], size: f32, bold: bool, height: f32) {
        if self.y - height < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
        let font = if bold { &self.bold } else { &self.regular };
        for (x, text) in cells {
            self.layer.use_text(*text, size, Mm(*x), Mm(self.y), font);
        }
        self.y -= height;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

/// Cut long names so they don't run into the next column.
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

const REPORT_COLUMNS: [f32; 5] = [15.0, 32.0, 100.0, 135.0, 172.0];

/// Tabular PDF report: ID, customer, status, date, total.
///
/// # Errors
///
/// Returns `ExportError::Pdf` if the document cannot be written.
pub fn orders_pdf(orders: &[OrderSummary]) -> Result<Vec<u8>, ExportError> {
    let mut pdf = PdfWriter::new("Relatório de Pedidos")?;
    let [id_x, customer_x, status_x, date_x, total_x] = REPORT_COLUMNS;

    pdf.row(&[(15.0, "Relatório de Pedidos")], 16.0, true, 12.0);
    pdf.row(
        &[
            (id_x, "ID"),
            (customer_x, "Cliente"),
            (status_x, "Status"),
            (date_x, "Data"),
            (total_x, "Total"),
        ],
        11.0,
        true,
        8.0,
    );

    for summary in orders {
        let id = summary.order.id.to_string();
        let customer = clip(&summary.order.customer_name, 32);
        let date = summary.order.created_display();
        let total = summary.total.to_string();
        pdf.row(
            &[
                (id_x, id.as_str()),
                (customer_x, customer.as_str()),
                (status_x, summary.order.status.label()),
                (date_x, date.as_str()),
                (total_x, total.as_str()),
            ],
            10.0,
            false,
            7.0,
        );
    }

    if orders.is_empty() {
        pdf.row(&[(id_x, "Nenhum pedido encontrado.")], 10.0, false, 7.0);
    }

    let bytes = pdf.finish()?;
    info!(orders = orders.len(), bytes = bytes.len(), "Generated orders PDF");
    Ok(bytes)
}

/// Spreadsheet report with one `Pedidos` sheet: ID, customer, status, date, total.
///
/// # Errors
///
/// Returns `ExportError::Spreadsheet` if the workbook cannot be written.
pub fn orders_xlsx(orders: &[OrderSummary]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("\"R$\" #,##0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Pedidos")?;
    for (col, title) in (0u16..).zip(["ID", "Cliente", "Status", "Data", "Total (R$)"]) {
        sheet.write_string_with_format(0, col, title, &header)?;
    }
    sheet.set_column_width(1, 32)?;
    sheet.set_column_width(2, 14)?;
    sheet.set_column_width(3, 18)?;
    sheet.set_column_width(4, 14)?;

    for (index, summary) in orders.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(orders.len()))?;
        let order = &summary.order;
        sheet.write_number(row, 0, f64::from(order.id.as_i32()))?;
        sheet.write_string(row, 1, &order.customer_name)?;
        sheet.write_string(row, 2, order.status.label())?;
        sheet.write_string(row, 3, order.created_display())?;
        sheet.write_number_with_format(row, 4, summary.total.as_f64(), &money)?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!(orders = orders.len(), bytes = bytes.len(), "Generated orders spreadsheet");
    Ok(bytes)
}

const RECEIPT_COLUMNS: [f32; 4] = [15.0, 110.0, 135.0, 170.0];

/// Single-order receipt: header, customer, status and priced lines.
///
/// # Errors
///
/// Returns `ExportError::Pdf` if the document cannot be written.
pub fn order_pdf(detail: &OrderDetail) -> Result<Vec<u8>, ExportError> {
    let order = &detail.order;
    let mut pdf = PdfWriter::new(&format!("Pedido #{}", order.id))?;
    let [item_x, qty_x, unit_x, subtotal_x] = RECEIPT_COLUMNS;

    pdf.row(&[(85.0, format!("Pedido #{}", order.id).as_str())], 16.0, true, 12.0);
    pdf.row(&[(item_x, format!("Cliente: {}", order.customer_name).as_str())], 12.0, false, 6.0);
    pdf.row(&[(item_x, format!("E-mail: {}", order.customer_email).as_str())], 12.0, false, 6.0);
    pdf.row(&[(item_x, format!("Data: {}", order.created_display()).as_str())], 12.0, false, 6.0);
    pdf.row(&[(item_x, format!("Status: {}", order.status).as_str())], 12.0, false, 6.0);
    pdf.gap(6.0);

    pdf.row(
        &[
            (item_x, "Item"),
            (qty_x, "Qtd"),
            (unit_x, "Unitário"),
            (subtotal_x, "Subtotal"),
        ],
        12.0,
        true,
        8.0,
    );

    for line in &detail.lines {
        let name = clip(&line.cupcake_name, 48);
        let quantity = line.quantity.to_string();
        let unit = line.unit_price.to_string();
        let subtotal = line.subtotal().to_string();
        pdf.row(
            &[
                (item_x, name.as_str()),
                (qty_x, quantity.as_str()),
                (unit_x, unit.as_str()),
                (subtotal_x, subtotal.as_str()),
            ],
            11.0,
            false,
            8.0,
        );
    }

    pdf.gap(5.0);
    pdf.row(&[(150.0, format!("Total: {}", detail.total).as_str())], 12.0, true, 8.0);

    let bytes = pdf.finish()?;
    info!(order_id = %order.id, bytes = bytes.len(), "Generated order PDF");
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use cupcake_core::{CupcakeId, OrderId, OrderStatus, Price, UserId};

    use super::*;
    use crate::models::{Order, OrderLine};

    fn order(id: i32, name: &str) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: UserId::new(1),
            customer_name: name.to_string(),
            customer_email: "ana@example.com".to_string(),
            finalized: true,
            status: OrderStatus::Pronto,
            created_at: Utc.with_ymd_and_hms(2024, 5, 4, 15, 30, 0).unwrap(),
            rating: None,
        }
    }

    fn summaries(count: i32) -> Vec<OrderSummary> {
        (1..=count)
            .map(|id| OrderSummary {
                order: order(id, "Ana Maria"),
                total: Price::from_cents(2750),
            })
            .collect()
    }

    #[test]
    fn test_orders_pdf_is_a_pdf() {
        let bytes = orders_pdf(&summaries(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_orders_pdf_breaks_pages() {
        let short = orders_pdf(&summaries(2)).unwrap();
        let long = orders_pdf(&summaries(120)).unwrap();
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_empty_report_still_renders() {
        assert!(orders_pdf(&[]).unwrap().starts_with(b"%PDF"));
        assert!(orders_xlsx(&[]).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_orders_xlsx_is_a_zip() {
        let bytes = orders_xlsx(&summaries(5)).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_order_pdf() {
        let detail = OrderDetail::new(
            order(7, "Ana"),
            vec![OrderLine {
                cupcake_id: CupcakeId::new(1),
                cupcake_name: "Baunilha".to_string(),
                quantity: 3,
                unit_price: Price::from_cents(500),
            }],
            Vec::new(),
        );
        assert!(order_pdf(&detail).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("Ana", 10), "Ana");
        assert_eq!(clip("Maria Aparecida da Silva", 10), "Maria A...");
    }
}
