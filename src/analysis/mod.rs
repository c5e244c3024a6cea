//! Analysis modules.
//!
//! Five independent aggregations over the same canonical record batch.
//! Each is a pure function: no shared state, no I/O, and every grouping
//! follows original row order so first-seen and tie-break semantics are
//! reproducible.

pub mod categories;
pub mod customers;
pub mod discounts;
pub mod orders;
pub mod products;

pub use categories::category_breakdown;
pub use customers::top_customers;
pub use discounts::discount_analysis;
pub use orders::order_value_distribution;
pub use products::product_performance;
