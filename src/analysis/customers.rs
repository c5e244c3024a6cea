//! Top customer ranking.

use crate::models::{CanonicalRecord, PipelineError, TopCustomer};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Per-customer totals accumulated across the batch.
struct CustomerGroup {
    /// Summed total price.
    spend: f64,
    /// Distinct invoices.
    invoices: HashSet<String>,
    /// Maximum purchase date label seen (raw label ordering).
    last_purchase: String,
}

/// Rank customers by total spend and keep the top `top_n`.
///
/// Average order value is spend divided by distinct invoice count,
/// guarded to 0.0 for an empty count. Ties keep first-seen order.
pub fn top_customers(
    records: &[CanonicalRecord],
    top_n: usize,
) -> Result<Vec<TopCustomer>, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("top customers"));
    }

    let mut groups: IndexMap<&str, CustomerGroup> = IndexMap::new();
    for record in records {
        let group = groups
            .entry(record.customer_id.as_str())
            .or_insert_with(|| CustomerGroup {
                spend: 0.0,
                invoices: HashSet::new(),
                last_purchase: record.purchase_date.clone(),
            });
        group.spend += record.total_price;
        group.invoices.insert(record.invoice_id.clone());
        if record.purchase_date > group.last_purchase {
            group.last_purchase = record.purchase_date.clone();
        }
    }
    debug!("Grouped {} customers, keeping top {}", groups.len(), top_n);

    let mut ranked: Vec<(&str, CustomerGroup)> = groups.into_iter().collect();
    // Stable sort keeps insertion order for equal spend.
    ranked.sort_by(|a, b| b.1.spend.partial_cmp(&a.1.spend).unwrap_or(Ordering::Equal));
    ranked.truncate(top_n);

    Ok(ranked
        .into_iter()
        .map(|(customer_id, group)| {
            let order_count = group.invoices.len() as u64;
            let aov = if order_count == 0 {
                0.0
            } else {
                group.spend / order_count as f64
            };
            TopCustomer {
                customer_id: customer_id.to_string(),
                total_price: group.spend,
                order_count,
                aov,
                last_purchase: group.last_purchase,
            }
        })
        .collect())
}
