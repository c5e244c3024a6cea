//! Revenue by product category.

use crate::models::{CanonicalRecord, CategoryBreakdown, PipelineError};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Round to one decimal place.
fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sum revenue and quantity per category and compute each category's
/// share of total revenue.
///
/// Output sequences are index-aligned and sorted by revenue descending;
/// ties keep first-seen order. With zero total revenue every percentage
/// is 0.0 rather than undefined.
pub fn category_breakdown(
    records: &[CanonicalRecord],
) -> Result<CategoryBreakdown, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("category breakdown"));
    }

    // (revenue, quantity) per category, keyed in row order.
    let mut groups: IndexMap<&str, (f64, f64)> = IndexMap::new();
    for record in records {
        let entry = groups
            .entry(record.product_category.as_str())
            .or_insert((0.0, 0.0));
        entry.0 += record.total_price;
        entry.1 += record.quantity;
    }

    let mut rows: Vec<(&str, f64, f64)> = groups
        .into_iter()
        .map(|(category, (revenue, quantity))| (category, revenue, quantity))
        .collect();
    // Stable sort keeps insertion order for equal revenue.
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let total_revenue: f64 = rows.iter().map(|(_, revenue, _)| revenue).sum();
    debug!(
        "Aggregated {} categories, total revenue {:.2}",
        rows.len(),
        total_revenue
    );

    let mut breakdown = CategoryBreakdown {
        categories: Vec::with_capacity(rows.len()),
        revenue: Vec::with_capacity(rows.len()),
        quantity: Vec::with_capacity(rows.len()),
        percentage: Vec::with_capacity(rows.len()),
    };
    for (category, revenue, quantity) in rows {
        let percentage = if total_revenue == 0.0 {
            0.0
        } else {
            round_one(revenue / total_revenue * 100.0)
        };
        breakdown.categories.push(category.to_string());
        breakdown.revenue.push(revenue);
        breakdown.quantity.push(quantity);
        breakdown.percentage.push(percentage);
    }

    Ok(breakdown)
}
