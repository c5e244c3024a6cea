//! Order value distribution.
//!
//! Rolls line items up to invoices, bins each invoice's summed total into
//! one of five fixed value ranges, and produces per-category series with
//! a top-5 + "Other Categories" overflow policy.

use crate::models::{CanonicalRecord, OrderValueDistribution, PipelineError, RangeSeries};
use indexmap::IndexMap;
use std::cmp::Reverse;
use tracing::debug;

/// Fixed order value range labels.
const RANGES: [&str; 5] = ["0-50", "51-100", "101-200", "201-500", "501+"];

/// How many categories get an individually labeled series.
const TOP_CATEGORIES: usize = 5;

/// Series label for the merged remainder.
const OVERFLOW_LABEL: &str = "Other Categories";

/// One invoice rolled up from its line items.
struct InvoiceAggregate {
    /// Summed total price across the invoice's line items.
    total: f64,
    /// First-seen category for the invoice.
    category: String,
    /// First-seen customer for the invoice.
    #[allow(dead_code)] // Carried by the rollup, unused by the binning itself
    customer: String,
}

/// Range index for a summed invoice total. Ranges are closed above.
fn range_index(total: f64) -> usize {
    if total <= 50.0 {
        0
    } else if total <= 100.0 {
        1
    } else if total <= 200.0 {
        2
    } else if total <= 500.0 {
        3
    } else {
        4
    }
}

/// Bin invoices into value ranges and build the per-category series.
///
/// Candidate categories are the unique record categories in row order, so
/// a category that owns no invoice still appears with zero counts. The 5
/// categories with the highest total invoice count keep their own series;
/// the rest are merged element-wise into "Other Categories".
pub fn order_value_distribution(
    records: &[CanonicalRecord],
) -> Result<OrderValueDistribution, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("order value distribution"));
    }

    // Invoice rollup: summed total, first-seen category and customer.
    let mut invoices: IndexMap<&str, InvoiceAggregate> = IndexMap::new();
    for record in records {
        invoices
            .entry(record.invoice_id.as_str())
            .and_modify(|invoice| invoice.total += record.total_price)
            .or_insert_with(|| InvoiceAggregate {
                total: record.total_price,
                category: record.product_category.clone(),
                customer: record.customer_id.clone(),
            });
    }

    // Candidate categories in row order, all starting at zero counts.
    let mut category_counts: IndexMap<&str, [u64; 5]> = IndexMap::new();
    for record in records {
        category_counts
            .entry(record.product_category.as_str())
            .or_insert([0; 5]);
    }

    let mut range_counts = [0u64; 5];
    for invoice in invoices.values() {
        let index = range_index(invoice.total);
        range_counts[index] += 1;
        if let Some(counts) = category_counts.get_mut(invoice.category.as_str()) {
            counts[index] += 1;
        }
    }
    debug!(
        "Binned {} invoices across {} categories",
        invoices.len(),
        category_counts.len()
    );

    // Rank categories by total invoice count; stable sort keeps row order
    // for ties.
    let mut ranked: Vec<(&str, [u64; 5])> = category_counts.into_iter().collect();
    ranked.sort_by_key(|(_, counts)| Reverse(counts.iter().sum::<u64>()));

    let split = ranked.len().min(TOP_CATEGORIES);
    let mut datasets: Vec<RangeSeries> = ranked[..split]
        .iter()
        .map(|(category, counts)| RangeSeries {
            label: category.to_string(),
            data: counts.to_vec(),
        })
        .collect();

    if ranked.len() > split {
        let mut overflow = [0u64; 5];
        for (_, counts) in &ranked[split..] {
            for (slot, count) in overflow.iter_mut().zip(counts) {
                *slot += count;
            }
        }
        datasets.push(RangeSeries {
            label: OVERFLOW_LABEL.to_string(),
            data: overflow.to_vec(),
        });
    }

    Ok(OrderValueDistribution {
        ranges: RANGES.iter().map(|r| r.to_string()).collect(),
        range_counts: range_counts.to_vec(),
        datasets,
    })
}
