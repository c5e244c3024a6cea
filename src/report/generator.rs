//! Narrative interpretation and dashboard serialization.
//!
//! Computes the headline metrics over the full batch and renders them
//! into a fixed Markdown template with currency-formatted numbers.

use crate::models::{CanonicalRecord, DashboardReport, PipelineError};
use anyhow::Result;
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Format a value with two decimals and thousands separators: 1234567.8
/// becomes "1,234,567.80".
fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Sum a metric per key, keyed in row order.
fn sum_by<'a, K, M>(records: &'a [CanonicalRecord], key: K, metric: M) -> IndexMap<&'a str, f64>
where
    K: Fn(&'a CanonicalRecord) -> &'a str,
    M: Fn(&CanonicalRecord) -> f64,
{
    let mut groups: IndexMap<&str, f64> = IndexMap::new();
    for record in records {
        *groups.entry(key(record)).or_insert(0.0) += metric(record);
    }
    groups
}

/// First maximum in iteration order, matching first-seen tie-breaks.
fn first_max<'a>(groups: &IndexMap<&'a str, f64>) -> Option<(&'a str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (&key, &value) in groups {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((key, value)),
        }
    }
    best
}

/// Descending by value with stable ties, truncated to `n`.
fn top_n<'a>(groups: IndexMap<&'a str, f64>, n: usize) -> Vec<(&'a str, f64)> {
    let mut entries: Vec<(&str, f64)> = groups.into_iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries.truncate(n);
    entries
}

/// Render the narrative interpretation for the batch.
///
/// Fails explicitly on an empty batch; no partially filled template is
/// ever produced.
pub fn generate_interpretation(
    records: &[CanonicalRecord],
    currency: &str,
) -> Result<String, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyBatch("dashboard interpretation"));
    }

    let mut output = String::new();
    output.push_str("# Dashboard Interpretation\n\n");
    output.push_str(&generate_headline_section(records, currency));
    output.push_str(&generate_top_days_section(records, currency));
    output.push_str(&generate_max_order_section(records, currency));
    output.push_str(&generate_best_sellers_section(records, currency));
    output.push_str(
        "This dashboard provides insights into sales performance, order distribution, \
         discount impact, and product performance.\n",
    );

    debug!("Rendered interpretation for {} records", records.len());
    Ok(output)
}

/// Total revenue, top category, and mean discount.
fn generate_headline_section(records: &[CanonicalRecord], currency: &str) -> String {
    let total_revenue: f64 = records.iter().map(|r| r.total_price).sum();

    let category_revenue = sum_by(records, |r| r.product_category.as_str(), |r| r.total_price);
    let top_category = first_max(&category_revenue)
        .map(|(category, _)| category)
        .unwrap_or("Uncategorized");

    let avg_discount =
        records.iter().map(|r| r.discount).sum::<f64>() / records.len() as f64 * 100.0;

    let mut section = String::new();
    section.push_str(&format!(
        "- Total Revenue: {}{}\n",
        currency,
        format_amount(total_revenue)
    ));
    section.push_str(&format!(
        "- Top Product Category by Revenue: {}\n",
        top_category
    ));
    section.push_str(&format!("- Average Discount Rate: {:.2}%\n\n", avg_discount));

    section
}

/// The three purchase-date labels with the highest summed revenue.
fn generate_top_days_section(records: &[CanonicalRecord], currency: &str) -> String {
    let revenue_by_day = sum_by(records, |r| r.purchase_date.as_str(), |r| r.total_price);
    let top_days = top_n(revenue_by_day, 3);

    let mut section = String::new();
    section.push_str("## Top 3 Days with Highest Sales\n");
    for (day, revenue) in top_days {
        section.push_str(&format!(
            "  - {}: {}{}\n",
            day,
            currency,
            format_amount(revenue)
        ));
    }
    section.push('\n');

    section
}

/// The single invoice with the highest summed value.
fn generate_max_order_section(records: &[CanonicalRecord], currency: &str) -> String {
    let order_values = sum_by(records, |r| r.invoice_id.as_str(), |r| r.total_price);
    let (order_id, order_value) = first_max(&order_values).unwrap_or(("Unknown", 0.0));

    let mut section = String::new();
    section.push_str("## Order with Highest Value\n");
    section.push_str(&format!("- Order ID: {}\n", order_id));
    section.push_str(&format!(
        "- Order Value: {}{}\n\n",
        currency,
        format_amount(order_value)
    ));

    section
}

/// The three products with the highest summed quantity.
fn generate_best_sellers_section(records: &[CanonicalRecord], currency: &str) -> String {
    let quantity_by_product = sum_by(records, |r| r.product_purchased.as_str(), |r| r.quantity);
    let revenue_by_product = sum_by(records, |r| r.product_purchased.as_str(), |r| r.total_price);
    let best_sellers = top_n(quantity_by_product, 3);

    let mut section = String::new();
    section.push_str("## 3 Best Seller Products\n");
    for (product, quantity) in best_sellers {
        let revenue = revenue_by_product.get(product).copied().unwrap_or(0.0);
        section.push_str(&format!(
            "  - {}: {} units, {}{}\n",
            product,
            quantity,
            currency,
            format_amount(revenue)
        ));
    }
    section.push('\n');

    section
}

/// Serialize the full dashboard document as pretty JSON.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        category: &str,
        product: &str,
        invoice: &str,
        date: &str,
        quantity: f64,
        discount: f64,
        total: f64,
    ) -> CanonicalRecord {
        CanonicalRecord {
            product_category: category.to_string(),
            product_purchased: product.to_string(),
            invoice_id: invoice.to_string(),
            purchase_date: date.to_string(),
            quantity,
            discount,
            total_price: total,
            ..CanonicalRecord::default()
        }
    }

    fn sample_records() -> Vec<CanonicalRecord> {
        vec![
            record("Electronics", "Headphones", "I1", "2024-05-01", 2.0, 0.1, 1200.0),
            record("Electronics", "Charger", "I2", "2024-05-02", 5.0, 0.0, 150.0),
            record("Clothing", "T-Shirt", "I3", "2024-05-01", 3.0, 0.2, 60.0),
        ]
    }

    #[test]
    fn test_format_amount_grouping() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
    }

    #[test]
    fn test_interpretation_headlines() {
        let text = generate_interpretation(&sample_records(), "AED").unwrap();

        assert!(text.starts_with("# Dashboard Interpretation"));
        assert!(text.contains("- Total Revenue: AED1,410.00"));
        assert!(text.contains("- Top Product Category by Revenue: Electronics"));
        assert!(text.contains("- Average Discount Rate: 10.00%"));
    }

    #[test]
    fn test_interpretation_sections() {
        let text = generate_interpretation(&sample_records(), "AED").unwrap();

        assert!(text.contains("## Top 3 Days with Highest Sales"));
        assert!(text.contains("  - 2024-05-01: AED1,260.00"));
        assert!(text.contains("## Order with Highest Value"));
        assert!(text.contains("- Order ID: I1"));
        assert!(text.contains("- Order Value: AED1,200.00"));
        assert!(text.contains("## 3 Best Seller Products"));
        assert!(text.contains("  - Charger: 5 units, AED150.00"));
    }

    #[test]
    fn test_currency_label_is_configurable() {
        let text = generate_interpretation(&sample_records(), "USD").unwrap();
        assert!(text.contains("- Total Revenue: USD1,410.00"));
        assert!(!text.contains("AED"));
    }

    #[test]
    fn test_top_category_tie_keeps_first_seen() {
        let records = vec![
            record("B", "P1", "I1", "2024-01-01", 1.0, 0.0, 50.0),
            record("A", "P2", "I2", "2024-01-01", 1.0, 0.0, 50.0),
        ];
        let text = generate_interpretation(&records, "AED").unwrap();
        assert!(text.contains("- Top Product Category by Revenue: B"));
    }

    #[test]
    fn test_empty_batch_fails() {
        let err = generate_interpretation(&[], "AED").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyBatch(_)));
    }
}
