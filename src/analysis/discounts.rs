//! Discount impact analysis.
//!
//! Produces one bubble per record for the discount scatter chart and
//! rolls count, discount amount, and revenue up into five fixed discount
//! ranges.

use crate::models::{CanonicalRecord, DiscountAnalysis, DiscountPoint, PipelineError};
use indexmap::IndexMap;
use tracing::debug;

/// Fixed discount range labels.
const RANGES: [&str; 5] = ["0%", "1-10%", "11-20%", "21-30%", "31%+"];

/// Bubble radius bounds.
const MIN_RADIUS: f64 = 3.0;
const MAX_RADIUS: f64 = 20.0;

/// Range index for a discount fraction. Zero is its own range; the rest
/// are closed above on the percentage.
fn discount_range_index(discount: f64) -> usize {
    let pct = discount * 100.0;
    if pct == 0.0 {
        0
    } else if pct <= 10.0 {
        1
    } else if pct <= 20.0 {
        2
    } else if pct <= 30.0 {
        3
    } else {
        4
    }
}

/// Build one scatter point from a record.
fn scatter_point(record: &CanonicalRecord) -> DiscountPoint {
    DiscountPoint {
        x: record.discount * 100.0,
        y: record.total_price,
        r: (record.quantity.sqrt() * 5.0).clamp(MIN_RADIUS, MAX_RADIUS),
        category: record.product_category.clone(),
        sales_price: record.sales_price,
        quantity: record.quantity as i64,
        product: record.product_purchased.clone(),
    }
}

/// Derive scatter points and per-range discount rollups from the batch.
///
/// Normalization guarantees every record carries discount, total price,
/// and quantity, so every record yields a point and lands in exactly one
/// range. The discount amount per record is price x quantity x discount.
pub fn discount_analysis(records: &[CanonicalRecord]) -> Result<DiscountAnalysis, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("discount analysis"));
    }

    let scatter_data: Vec<DiscountPoint> = records.iter().map(scatter_point).collect();

    // Category keys in row order; every category gets a group even before
    // its points are pushed.
    let mut category_scatter_data: IndexMap<String, Vec<DiscountPoint>> = IndexMap::new();
    for record in records {
        category_scatter_data
            .entry(record.product_category.clone())
            .or_default();
    }
    for point in &scatter_data {
        if let Some(points) = category_scatter_data.get_mut(&point.category) {
            points.push(point.clone());
        }
    }

    let mut discount_counts = [0u64; 5];
    let mut discount_impact = [0.0f64; 5];
    let mut discount_revenue = [0.0f64; 5];
    for record in records {
        let index = discount_range_index(record.discount);
        discount_counts[index] += 1;
        discount_revenue[index] += record.total_price;
        discount_impact[index] += record.sales_price * record.quantity * record.discount;
    }
    debug!(
        "Built {} scatter points across {} categories",
        scatter_data.len(),
        category_scatter_data.len()
    );

    Ok(DiscountAnalysis {
        scatter_data,
        category_scatter_data,
        discount_ranges: RANGES.iter().map(|r| r.to_string()).collect(),
        discount_counts: discount_counts.to_vec(),
        discount_impact: discount_impact.to_vec(),
        discount_revenue: discount_revenue.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, discount: f64, total: f64, quantity: f64) -> CanonicalRecord {
        CanonicalRecord {
            product_category: category.to_string(),
            discount,
            total_price: total,
            quantity,
            sales_price: 10.0,
            ..CanonicalRecord::default()
        }
    }

    #[test]
    fn test_scatter_point_fields() {
        let records = vec![record("A", 0.15, 85.0, 4.0)];

        let analysis = discount_analysis(&records).unwrap();
        let point = &analysis.scatter_data[0];
        assert_eq!(point.x, 15.0);
        assert_eq!(point.y, 85.0);
        assert_eq!(point.r, 10.0); // sqrt(4) * 5
        assert_eq!(point.category, "A");
        assert_eq!(point.sales_price, 10.0);
        assert_eq!(point.quantity, 4);
        assert_eq!(point.product, "Unknown Product");
    }

    #[test]
    fn test_bubble_radius_is_clamped() {
        let records = vec![record("A", 0.0, 1.0, 0.0), record("A", 0.0, 1.0, 100.0)];

        let analysis = discount_analysis(&records).unwrap();
        assert_eq!(analysis.scatter_data[0].r, 3.0);
        assert_eq!(analysis.scatter_data[1].r, 20.0);
    }

    #[test]
    fn test_zero_discount_lands_in_zero_bucket() {
        let records = vec![
            record("A", 0.0, 10.0, 1.0),
            record("A", 0.0, 20.0, 1.0),
            record("B", 0.0, 30.0, 1.0),
        ];

        let analysis = discount_analysis(&records).unwrap();
        assert_eq!(analysis.discount_counts, vec![3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bucket_boundaries_are_closed_above() {
        let records = vec![
            record("A", 0.10, 10.0, 1.0),
            record("A", 0.101, 10.0, 1.0),
            record("A", 0.30, 10.0, 1.0),
            record("A", 0.31, 10.0, 1.0),
        ];

        let analysis = discount_analysis(&records).unwrap();
        assert_eq!(analysis.discount_counts, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_counts_sum_to_record_count() {
        let records = vec![
            record("A", 0.0, 10.0, 1.0),
            record("A", 0.05, 10.0, 1.0),
            record("B", 0.25, 10.0, 1.0),
            record("B", 0.50, 10.0, 1.0),
        ];

        let analysis = discount_analysis(&records).unwrap();
        let total: u64 = analysis.discount_counts.iter().sum();
        assert_eq!(total as usize, records.len());
    }

    #[test]
    fn test_discount_amount_and_revenue_rollups() {
        // price 10, quantity 2, discount 0.2 -> amount 4, bucket 11-20%.
        let records = vec![record("A", 0.2, 16.0, 2.0)];

        let analysis = discount_analysis(&records).unwrap();
        assert_eq!(analysis.discount_impact[2], 4.0);
        assert_eq!(analysis.discount_revenue[2], 16.0);
    }

    #[test]
    fn test_points_grouped_by_category_in_row_order() {
        let records = vec![
            record("B", 0.0, 10.0, 1.0),
            record("A", 0.0, 20.0, 1.0),
            record("B", 0.0, 30.0, 1.0),
        ];

        let analysis = discount_analysis(&records).unwrap();
        let keys: Vec<&String> = analysis.category_scatter_data.keys().collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(analysis.category_scatter_data["B"].len(), 2);
        assert_eq!(analysis.category_scatter_data["A"].len(), 1);
    }

    #[test]
    fn test_empty_batch_fails() {
        let err = discount_analysis(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyBatch(_)));
    }
}
