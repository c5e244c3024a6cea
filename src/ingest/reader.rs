//! CSV ingestion and normalization.
//!
//! Maps arbitrary source column headers onto the canonical nine-field
//! schema, coerces numeric columns, and fills missing values with the
//! schema defaults. Values that fail numeric coercion are treated as
//! missing, never as errors; structurally broken rows fail the whole
//! ingest.

use crate::models::{CanonicalRecord, PipelineError};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// The nine canonical columns, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    ProductCategory,
    ProductPurchased,
    Quantity,
    SalesPrice,
    Discount,
    TotalPrice,
    CustomerId,
    InvoiceId,
    PurchaseDate,
}

/// Resolve a trimmed header to a canonical column.
///
/// Accepts both the source spelling ("Product Category") and the
/// canonical spelling ("productCategory"). Unknown headers map to `None`
/// and are ignored.
fn canonical_column(header: &str) -> Option<Column> {
    match header {
        "Product Category" | "productCategory" => Some(Column::ProductCategory),
        "Product Purchased" | "productPurchased" => Some(Column::ProductPurchased),
        "Quantity" | "quantity" => Some(Column::Quantity),
        "Sales Price" | "salesPrice" => Some(Column::SalesPrice),
        "Discount" | "discount" => Some(Column::Discount),
        "Total Price" | "totalPrice" => Some(Column::TotalPrice),
        "Customer Id" | "customerId" => Some(Column::CustomerId),
        "Invoice Id" | "invoiceId" => Some(Column::InvoiceId),
        "Purchase Date" | "purchaseDate" => Some(Column::PurchaseDate),
        _ => None,
    }
}

/// Coerce a raw cell to a number, `None` when missing or unparseable.
fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// A raw string cell; only truly empty cells count as missing.
fn coerce_string(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Validate the upload before any processing is attempted.
///
/// The file must exist, be a regular file, carry a `.csv` extension, and
/// be non-empty.
pub fn validate_input(path: &Path) -> Result<(), PipelineError> {
    if path.as_os_str().is_empty() {
        return Err(PipelineError::InvalidInput("no file selected".to_string()));
    }
    if !path.exists() {
        return Err(PipelineError::InvalidInput(format!(
            "file does not exist: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(PipelineError::InvalidInput(format!(
            "not a file: {}",
            path.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(PipelineError::InvalidInput(
            "file must be a CSV".to_string(),
        ));
    }
    let size = path
        .metadata()
        .map_err(|e| PipelineError::InvalidInput(format!("cannot stat file: {}", e)))?
        .len();
    if size == 0 {
        return Err(PipelineError::InvalidInput("file is empty".to_string()));
    }
    Ok(())
}

/// Read and normalize a CSV file into canonical records.
pub fn read_records(path: &Path) -> Result<Vec<CanonicalRecord>, PipelineError> {
    validate_input(path)?;

    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::InvalidInput(format!("cannot open file: {}", e)))?;

    let records = read_records_from(file)?;
    info!(
        "Ingested {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Read and normalize CSV data from any reader.
///
/// Output order is file row order. A header-only file yields an empty
/// batch; the empty-batch failure then belongs to the aggregation stage.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<CanonicalRecord>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PipelineError::Csv {
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    // Column index -> canonical column, built once from the header row.
    let mapping: Vec<Option<Column>> = headers.iter().map(canonical_column).collect();
    debug!(
        "Mapped {} of {} columns to the canonical schema",
        mapping.iter().flatten().count(),
        headers.len()
    );

    let mut records = Vec::new();
    for (row_index, result) in csv_reader.records().enumerate() {
        let row = result.map_err(|e| PipelineError::Csv {
            line: row_index + 2,
            message: e.to_string(),
        })?;

        let mut record = CanonicalRecord::default();
        for (cell_index, raw) in row.iter().enumerate() {
            let Some(column) = mapping.get(cell_index).copied().flatten() else {
                continue;
            };
            match column {
                Column::ProductCategory => {
                    if let Some(value) = coerce_string(raw) {
                        record.product_category = value;
                    }
                }
                Column::ProductPurchased => {
                    if let Some(value) = coerce_string(raw) {
                        record.product_purchased = value;
                    }
                }
                Column::Quantity => {
                    if let Some(value) = coerce_number(raw) {
                        record.quantity = value;
                    }
                }
                Column::SalesPrice => {
                    if let Some(value) = coerce_number(raw) {
                        record.sales_price = value;
                    }
                }
                Column::Discount => {
                    if let Some(value) = coerce_number(raw) {
                        record.discount = value;
                    }
                }
                Column::TotalPrice => {
                    if let Some(value) = coerce_number(raw) {
                        record.total_price = value;
                    }
                }
                Column::CustomerId => {
                    if let Some(value) = coerce_string(raw) {
                        record.customer_id = value;
                    }
                }
                Column::InvoiceId => {
                    if let Some(value) = coerce_string(raw) {
                        record.invoice_id = value;
                    }
                }
                Column::PurchaseDate => {
                    if let Some(value) = coerce_string(raw) {
                        record.purchase_date = value;
                    }
                }
            }
        }
        records.push(record);
    }

    Ok(records)
}
