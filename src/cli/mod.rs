//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod customer;
pub mod invoice;
pub mod product;

pub use customer::{handle_customer_command, CustomerCommands};
pub use invoice::{handle_invoice_command, InvoiceCommands};
pub use product::{handle_product_command, ProductCommands};

use chrono::{Datelike, Local, NaiveDate};

use crate::error::InvoiceResult;
use crate::models::LineSpec;

/// Parse a date argument: `YYYY-MM-DD`, `today` or `last-month`
///
/// `last-month` is the last day of the previous month.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match value.trim() {
        "today" => Ok(today),
        "last-month" => today
            .with_day(1)
            .and_then(|first| first.pred_opt())
            .ok_or_else(|| format!("No date before {}", today)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date (expected YYYY-MM-DD): {}", other)),
    }
}

/// Parse trailing `CODE,AMOUNT[,...]` arguments
pub fn parse_line_specs(specs: &[String]) -> InvoiceResult<Vec<LineSpec>> {
    specs.iter().map(|spec| LineSpec::parse(spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(parse_date("today").unwrap(), Local::now().date_naive());

        let last_month = parse_date("last-month").unwrap();
        assert!(last_month < Local::now().date_naive());
        assert_eq!(last_month.succ_opt().unwrap().day(), 1);

        assert!(parse_date("31.01.2024").is_err());
    }

    #[test]
    fn test_parse_line_specs() {
        let specs = parse_line_specs(&["WEB,3".to_string(), "CONS,1.5,vat=8".to_string()]).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].vat, Some(dec!(8)));

        assert!(parse_line_specs(&["WEB".to_string()]).is_err());
    }
}
