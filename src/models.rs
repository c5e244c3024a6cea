//! Data models for the sales analytics pipeline.
//!
//! This module contains the canonical record schema produced by ingestion,
//! the derived dataset structures consumed by dashboard widgets, and the
//! pipeline error taxonomy.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the ingestion and aggregation stages.
///
/// Coercion failures are never errors; they are silently defaulted during
/// normalization. Everything here is a whole-request failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload itself is unusable (missing file, wrong type, empty).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A CSV row could not be read at all (structural error, not a bad value).
    #[error("failed to read CSV record at line {line}: {message}")]
    Csv { line: usize, message: String },

    /// An aggregation was asked to run over zero records.
    #[error("cannot compute {0} from an empty record batch")]
    EmptyBatch(&'static str),
}

/// One normalized sales line item.
///
/// Every field is guaranteed present after normalization; numeric fields
/// that failed coercion and string fields that were missing carry the
/// defaults below. `total_price` is trusted as given and never recomputed
/// from quantity, price, and discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalRecord {
    /// Product category label.
    pub product_category: String,
    /// Product name.
    pub product_purchased: String,
    /// Units sold on this line item.
    pub quantity: f64,
    /// Unit selling price.
    pub sales_price: f64,
    /// Discount as a fraction, expected in [0, 1].
    pub discount: f64,
    /// Line item total as recorded in the source data.
    pub total_price: f64,
    /// Customer identifier.
    pub customer_id: String,
    /// Invoice identifier; several line items may share one invoice.
    pub invoice_id: String,
    /// Purchase date label, kept opaque (not parsed as a date).
    pub purchase_date: String,
}

impl Default for CanonicalRecord {
    fn default() -> Self {
        Self {
            product_category: "Uncategorized".to_string(),
            product_purchased: "Unknown Product".to_string(),
            quantity: 0.0,
            sales_price: 0.0,
            discount: 0.0,
            total_price: 0.0,
            customer_id: "Unknown".to_string(),
            invoice_id: "Unknown".to_string(),
            purchase_date: "Unknown".to_string(),
        }
    }
}

/// Revenue by product category, index-aligned across the four sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Category labels, revenue-descending.
    pub categories: Vec<String>,
    /// Summed total price per category.
    pub revenue: Vec<f64>,
    /// Summed quantity per category.
    pub quantity: Vec<f64>,
    /// Share of total revenue per category, rounded to one decimal.
    pub percentage: Vec<f64>,
}

/// One labeled series of per-range counts for the order value chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSeries {
    /// Category label, or "Other Categories" for the overflow series.
    pub label: String,
    /// Invoice count per value range, aligned with the range labels.
    pub data: Vec<u64>,
}

/// Distribution of per-invoice order values across fixed ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderValueDistribution {
    /// The five range labels.
    pub ranges: Vec<String>,
    /// Overall invoice count per range, independent of category.
    pub range_counts: Vec<u64>,
    /// Top categories first, "Other Categories" last when present.
    pub datasets: Vec<RangeSeries>,
}

/// One bubble on the discount impact scatter chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPoint {
    /// Discount as a percentage.
    pub x: f64,
    /// Line item total price.
    pub y: f64,
    /// Bubble radius: sqrt(quantity) * 5, clamped to [3, 20].
    pub r: f64,
    /// Product category.
    pub category: String,
    /// Unit selling price.
    pub sales_price: f64,
    /// Units sold, as a whole number.
    pub quantity: i64,
    /// Product name.
    pub product: String,
}

/// Scatter points plus per-range discount rollups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountAnalysis {
    /// One point per record, in row order.
    pub scatter_data: Vec<DiscountPoint>,
    /// The same points grouped by category, categories in row order.
    pub category_scatter_data: IndexMap<String, Vec<DiscountPoint>>,
    /// The five discount range labels.
    pub discount_ranges: Vec<String>,
    /// Record count per discount range.
    pub discount_counts: Vec<u64>,
    /// Total discount amount (price x quantity x discount) per range.
    pub discount_impact: Vec<f64>,
    /// Total revenue per range.
    pub discount_revenue: Vec<f64>,
}

/// One product on the performance scatter chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPoint {
    /// Total quantity sold, as a whole number.
    pub x: i64,
    /// Total revenue.
    pub y: f64,
    /// Product name.
    pub name: String,
    /// First-seen category for the product.
    pub category: String,
    /// Quantity-weighted average selling price.
    pub avg_price: f64,
    /// Number of distinct invoices touching the product.
    pub transactions: u64,
}

/// Top products ranked by revenue, flat and grouped by category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    /// Top products, revenue-descending.
    pub scatter_data: Vec<ProductPoint>,
    /// The same points grouped by category, in point order.
    pub category_data: IndexMap<String, Vec<ProductPoint>>,
}

/// One row of the top customers table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    /// Customer identifier.
    pub customer_id: String,
    /// Total spend across all line items.
    pub total_price: f64,
    /// Number of distinct invoices.
    pub order_count: u64,
    /// Average order value: spend / distinct invoices.
    pub aov: f64,
    /// Most recent purchase date label seen for this customer.
    pub last_purchase: String,
}

/// The narrative interpretation, wrapped for JSON delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    /// Rendered Markdown text.
    pub markdown: String,
}

/// Metadata about one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// Path of the ingested CSV file.
    pub source_file: String,
    /// When the datasets were generated.
    pub generated_at: DateTime<Utc>,
    /// Number of canonical records in the batch.
    pub record_count: usize,
    /// Pipeline duration in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard document: all six derived datasets plus run
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// Metadata about the run.
    pub metadata: RunMetadata,
    /// Revenue by category.
    pub categories: CategoryBreakdown,
    /// Order value distribution.
    pub order_values: OrderValueDistribution,
    /// Discount impact analysis.
    pub discounts: DiscountAnalysis,
    /// Product performance ranking.
    pub products: ProductPerformance,
    /// Top customers table.
    pub customers: Vec<TopCustomer>,
    /// Narrative interpretation in Markdown.
    pub interpretation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_matches_fill_table() {
        let record = CanonicalRecord::default();
        assert_eq!(record.product_category, "Uncategorized");
        assert_eq!(record.product_purchased, "Unknown Product");
        assert_eq!(record.quantity, 0.0);
        assert_eq!(record.sales_price, 0.0);
        assert_eq!(record.discount, 0.0);
        assert_eq!(record.total_price, 0.0);
        assert_eq!(record.customer_id, "Unknown");
        assert_eq!(record.invoice_id, "Unknown");
        assert_eq!(record.purchase_date, "Unknown");
    }

    #[test]
    fn test_record_deserializes_sparse_json_with_defaults() {
        let record: CanonicalRecord =
            serde_json::from_str(r#"{"productCategory": "Electronics", "totalPrice": 99.5}"#)
                .unwrap();
        assert_eq!(record.product_category, "Electronics");
        assert_eq!(record.total_price, 99.5);
        assert_eq!(record.product_purchased, "Unknown Product");
        assert_eq!(record.invoice_id, "Unknown");
        assert_eq!(record.quantity, 0.0);
    }

    #[test]
    fn test_record_serializes_camel_case_keys() {
        let json = serde_json::to_string(&CanonicalRecord::default()).unwrap();
        assert!(json.contains("\"productCategory\""));
        assert!(json.contains("\"salesPrice\""));
        assert!(json.contains("\"invoiceId\""));
        assert!(json.contains("\"purchaseDate\""));
    }

    #[test]
    fn test_order_value_distribution_keys() {
        let dist = OrderValueDistribution {
            ranges: vec!["0-50".to_string()],
            range_counts: vec![1],
            datasets: vec![RangeSeries {
                label: "Electronics".to_string(),
                data: vec![1],
            }],
        };
        let json = serde_json::to_string(&dist).unwrap();
        assert!(json.contains("\"rangeCounts\""));
        assert!(json.contains("\"datasets\""));
        assert!(json.contains("\"label\""));
    }

    #[test]
    fn test_discount_analysis_keys() {
        let analysis = DiscountAnalysis {
            scatter_data: Vec::new(),
            category_scatter_data: IndexMap::new(),
            discount_ranges: Vec::new(),
            discount_counts: Vec::new(),
            discount_impact: Vec::new(),
            discount_revenue: Vec::new(),
        };
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("\"scatterData\""));
        assert!(json.contains("\"categoryScatterData\""));
        assert!(json.contains("\"discountImpact\""));
        assert!(json.contains("\"discountRevenue\""));
    }

    #[test]
    fn test_top_customer_keys() {
        let customer = TopCustomer {
            customer_id: "C-1".to_string(),
            total_price: 120.0,
            order_count: 2,
            aov: 60.0,
            last_purchase: "2024-05-01".to_string(),
        };
        let json = serde_json::to_string(&customer).unwrap();
        assert!(json.contains("\"customerId\""));
        assert!(json.contains("\"orderCount\""));
        assert!(json.contains("\"aov\""));
        assert!(json.contains("\"lastPurchase\""));
    }

    #[test]
    fn test_pipeline_error_messages() {
        let err = PipelineError::InvalidInput("file must be a CSV".to_string());
        assert!(err.to_string().contains("file must be a CSV"));

        let err = PipelineError::EmptyBatch("category breakdown");
        assert!(err.to_string().contains("category breakdown"));
        assert!(err.to_string().contains("empty record batch"));
    }
}
