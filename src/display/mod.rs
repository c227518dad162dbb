//! Display formatting for terminal output
//!
//! List views are rendered with `tabled`; detail views and the invoice
//! document are plain formatted strings.

pub mod customer;
pub mod invoice;
pub mod product;

pub use customer::{format_customer_details, format_customer_list};
pub use invoice::{format_document, format_invoice_details, format_invoice_list, format_summary};
pub use product::{format_product_details, format_product_list};

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a monetary value with two decimals, rounding half away from zero
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Format a percentage without trailing zeros
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}
