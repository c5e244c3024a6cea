//! Product performance ranking.

use crate::models::{CanonicalRecord, PipelineError, ProductPerformance, ProductPoint};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Per-product totals accumulated across the batch.
struct ProductGroup {
    /// Summed quantity.
    quantity: f64,
    /// Summed total price.
    revenue: f64,
    /// First-seen category.
    category: String,
    /// Sum of price x quantity, for the weighted average price.
    weighted_price: f64,
    /// Distinct invoices touching the product.
    invoices: HashSet<String>,
}

/// Rank products by total revenue and keep the top `top_n`.
///
/// Average selling price is the quantity-weighted price sum divided by
/// total quantity; a product with zero total quantity gets 0.0 rather
/// than an undefined value. Ties keep first-seen order.
pub fn product_performance(
    records: &[CanonicalRecord],
    top_n: usize,
) -> Result<ProductPerformance, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("product performance"));
    }

    let mut groups: IndexMap<&str, ProductGroup> = IndexMap::new();
    for record in records {
        let group = groups
            .entry(record.product_purchased.as_str())
            .or_insert_with(|| ProductGroup {
                quantity: 0.0,
                revenue: 0.0,
                category: record.product_category.clone(),
                weighted_price: 0.0,
                invoices: HashSet::new(),
            });
        group.quantity += record.quantity;
        group.revenue += record.total_price;
        group.weighted_price += record.sales_price * record.quantity;
        group.invoices.insert(record.invoice_id.clone());
    }
    debug!("Grouped {} products, keeping top {}", groups.len(), top_n);

    let mut ranked: Vec<(&str, ProductGroup)> = groups.into_iter().collect();
    // Stable sort keeps insertion order for equal revenue.
    ranked.sort_by(|a, b| b.1.revenue.partial_cmp(&a.1.revenue).unwrap_or(Ordering::Equal));
    ranked.truncate(top_n);

    let scatter_data: Vec<ProductPoint> = ranked
        .into_iter()
        .map(|(name, group)| {
            let avg_price = if group.quantity == 0.0 {
                0.0
            } else {
                group.weighted_price / group.quantity
            };
            ProductPoint {
                x: group.quantity as i64,
                y: group.revenue,
                name: name.to_string(),
                category: group.category,
                avg_price,
                transactions: group.invoices.len() as u64,
            }
        })
        .collect();

    let mut category_data: IndexMap<String, Vec<ProductPoint>> = IndexMap::new();
    for point in &scatter_data {
        category_data
            .entry(point.category.clone())
            .or_default()
            .push(point.clone());
    }

    Ok(ProductPerformance {
        scatter_data,
        category_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        product: &str,
        category: &str,
        invoice: &str,
        quantity: f64,
        price: f64,
        total: f64,
    ) -> CanonicalRecord {
        CanonicalRecord {
            product_purchased: product.to_string(),
            product_category: category.to_string(),
            invoice_id: invoice.to_string(),
            quantity,
            sales_price: price,
            total_price: total,
            ..CanonicalRecord::default()
        }
    }

    #[test]
    fn test_product_totals_and_weighted_average_price() {
        let records = vec![
            record("Widget", "Tools", "I1", 2.0, 10.0, 20.0),
            record("Widget", "Tools", "I2", 3.0, 20.0, 60.0),
        ];

        let perf = product_performance(&records, 15).unwrap();
        let point = &perf.scatter_data[0];
        assert_eq!(point.name, "Widget");
        assert_eq!(point.x, 5);
        assert_eq!(point.y, 80.0);
        // (10*2 + 20*3) / 5 = 16
        assert_eq!(point.avg_price, 16.0);
        assert_eq!(point.transactions, 2);
    }

    #[test]
    fn test_transactions_count_distinct_invoices() {
        let records = vec![
            record("Widget", "Tools", "I1", 1.0, 10.0, 10.0),
            record("Widget", "Tools", "I1", 1.0, 10.0, 10.0),
            record("Widget", "Tools", "I2", 1.0, 10.0, 10.0),
        ];

        let perf = product_performance(&records, 15).unwrap();
        assert_eq!(perf.scatter_data[0].transactions, 2);
    }

    #[test]
    fn test_ranked_by_revenue_and_truncated() {
        let records = vec![
            record("Low", "A", "I1", 1.0, 5.0, 5.0),
            record("High", "A", "I2", 1.0, 100.0, 100.0),
            record("Mid", "A", "I3", 1.0, 50.0, 50.0),
        ];

        let perf = product_performance(&records, 2).unwrap();
        let names: Vec<&String> = perf.scatter_data.iter().map(|p| &p.name).collect();
        assert_eq!(names, vec!["High", "Mid"]);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let records = vec![
            record("A", "X", "I1", 1.0, 30.0, 30.0),
            record("B", "X", "I2", 1.0, 30.0, 30.0),
            record("C", "X", "I3", 1.0, 80.0, 80.0),
            record("D", "Y", "I4", 1.0, 30.0, 30.0),
        ];

        let first = product_performance(&records, 15).unwrap();
        let second = product_performance(&records, 15).unwrap();
        let order_a: Vec<&String> = first.scatter_data.iter().map(|p| &p.name).collect();
        let order_b: Vec<&String> = second.scatter_data.iter().map(|p| &p.name).collect();
        assert_eq!(order_a, order_b);
        assert_eq!(order_a, vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_zero_quantity_product_gets_zero_avg_price() {
        let records = vec![record("Ghost", "A", "I1", 0.0, 10.0, 10.0)];

        let perf = product_performance(&records, 15).unwrap();
        assert_eq!(perf.scatter_data[0].avg_price, 0.0);
    }

    #[test]
    fn test_first_seen_category_is_kept() {
        let records = vec![
            record("Widget", "First", "I1", 1.0, 10.0, 10.0),
            record("Widget", "Second", "I2", 1.0, 10.0, 10.0),
        ];

        let perf = product_performance(&records, 15).unwrap();
        assert_eq!(perf.scatter_data[0].category, "First");
    }

    #[test]
    fn test_points_grouped_by_category() {
        let records = vec![
            record("P1", "A", "I1", 1.0, 10.0, 100.0),
            record("P2", "B", "I2", 1.0, 10.0, 50.0),
            record("P3", "A", "I3", 1.0, 10.0, 25.0),
        ];

        let perf = product_performance(&records, 15).unwrap();
        assert_eq!(perf.category_data["A"].len(), 2);
        assert_eq!(perf.category_data["B"].len(), 1);
        // Group keys follow point (ranking) order, not row order.
        let keys: Vec<&String> = perf.category_data.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_batch_fails() {
        let err = product_performance(&[], 15).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyBatch(_)));
    }
}
