//! Invoice display formatting
//!
//! List and detail views for the terminal, plus the plain-text invoice
//! document written by `invoice render`.

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use super::{format_money, format_percent};
use crate::config::Settings;
use crate::models::invoice::feature_description;
use crate::models::{Customer, Invoice, Priced};
use crate::services::InvoiceSummary;

const DOCUMENT_WIDTH: usize = 96;

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Issued")]
    issued: String,
    #[tabled(rename = "Cur")]
    currency: String,
    #[tabled(rename = "Net")]
    netto: String,
    #[tabled(rename = "Gross")]
    brutto: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<&Invoice> for InvoiceRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            number: invoice.number.to_string(),
            customer: invoice.customer.clone(),
            issued: invoice.issued.to_string(),
            currency: invoice.currency.to_string(),
            netto: format_money(invoice.netto()),
            brutto: format_money(invoice.brutto()),
            status: status(invoice),
        }
    }
}

fn status(invoice: &Invoice) -> &'static str {
    if invoice.finalised {
        "final"
    } else {
        "draft"
    }
}

/// Format a list of invoices as a table
pub fn format_invoice_list(invoices: &[Invoice]) -> String {
    if invoices.is_empty() {
        return "No invoices found.".to_string();
    }

    let rows: Vec<InvoiceRow> = invoices.iter().map(InvoiceRow::from).collect();
    Table::new(rows)
        .with(Style::psql())
        .modify(Columns::new(4..6), Alignment::right())
        .to_string()
}

/// Numbered line table shared by the detail view and the document
fn format_lines(invoice: &Invoice) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:>3}  {:<30} {:>8} {:<6} {:>10} {:>5} {:>11} {:>10} {:>11}\n",
        "#", "Item", "Qty", "Unit", "Price", "VAT", "Net", "Tax", "Gross"
    ));
    output.push_str(&format!("{}\n", "-".repeat(DOCUMENT_WIDTH)));

    for (index, line) in invoice.lines.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}  {:<30} {:>8} {:<6} {:>10} {:>5} {:>11} {:>10} {:>11}\n",
            index + 1,
            truncate(&line.name, 30),
            line.amount().normalize(),
            truncate(&line.unit, 6),
            format_money(line.price()),
            format_percent(line.vat()),
            format_money(line.netto()),
            format_money(line.tax()),
            format_money(line.brutto()),
        ));
    }

    output.push_str(&format!("{}\n", "-".repeat(DOCUMENT_WIDTH)));
    output.push_str(&format!(
        "{:>69} {:>11} {:>10} {:>11}\n",
        format!("Total ({})", invoice.currency),
        format_money(invoice.netto()),
        format_money(invoice.tax()),
        format_money(invoice.brutto()),
    ));

    output
}

/// Format an invoice with its lines and totals
pub fn format_invoice_details(invoice: &Invoice) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {} [{}]\n", invoice.number, status(invoice)));
    output.push_str(&format!("  Customer:  {}\n", invoice.customer));
    output.push_str(&format!("  Currency:  {}\n", invoice.currency));
    output.push_str(&format!("  Issued:    {}\n", invoice.issued));
    output.push_str(&format!("  Delivered: {}\n", invoice.delivered));
    output.push_str(&format!(
        "  Deadline:  {} ({} days)\n",
        invoice.deadline(),
        invoice.grace
    ));
    if !invoice.features.is_empty() {
        let features: Vec<&str> = invoice.features.iter().map(String::as_str).collect();
        output.push_str(&format!("  Features:  {}\n", features.join(", ")));
    }
    output.push('\n');

    if invoice.lines.is_empty() {
        output.push_str("No lines.\n");
    } else {
        output.push_str(&format_lines(invoice));
    }

    output
}

/// Format totals with the tax in the home currency
pub fn format_summary(summary: &InvoiceSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice {}\n", summary.number));
    output.push_str(&format!(
        "  Net:   {:>12} {}\n",
        format_money(summary.netto),
        summary.currency
    ));
    output.push_str(&format!(
        "  Tax:   {:>12} {}\n",
        format_money(summary.tax),
        summary.currency
    ));
    output.push_str(&format!(
        "  Gross: {:>12} {}\n",
        format_money(summary.brutto),
        summary.currency
    ));

    if let Some(rate) = &summary.rate {
        output.push_str(&format!(
            "  Tax:   {:>12} {} (1 {} = {} {}, table {} of {})\n",
            format_money(summary.tax_home),
            summary.home_currency,
            rate.currency,
            rate.rate,
            summary.home_currency,
            rate.table,
            rate.effective,
        ));
    }

    output
}

/// Render the invoice as a plain-text document
pub fn format_document(
    invoice: &Invoice,
    customer: &Customer,
    summary: &InvoiceSummary,
    settings: &Settings,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("INVOICE {}\n", invoice.number));
    output.push_str(&format!("{}\n\n", "=".repeat(DOCUMENT_WIDTH)));

    output.push_str("Seller:\n");
    for line in settings.seller.lines().filter(|l| !l.trim().is_empty()) {
        output.push_str(&format!("  {}\n", line.trim()));
    }
    output.push('\n');

    output.push_str("Buyer:\n");
    output.push_str(&format!("  {}\n", customer.short));
    for line in customer.address_lines() {
        output.push_str(&format!("  {}\n", line));
    }
    output.push('\n');

    output.push_str(&format!("Issue date:    {}\n", invoice.issued));
    output.push_str(&format!("Delivery date: {}\n", invoice.delivered));
    output.push_str(&format!(
        "Payment due:   {} ({} days)\n\n",
        invoice.deadline(),
        invoice.grace
    ));

    output.push_str(&format_lines(invoice));
    output.push('\n');

    output.push_str(&format!(
        "Amount due: {} {}\n",
        format_money(summary.brutto),
        summary.currency
    ));

    if let Some(rate) = &summary.rate {
        output.push_str(&format!(
            "VAT in {}: {} (exchange rate {} {}/{}, table {} of {})\n",
            summary.home_currency,
            format_money(summary.tax_home),
            rate.rate,
            summary.home_currency,
            rate.currency,
            rate.table,
            rate.effective,
        ));
    }

    let notes: Vec<String> = invoice
        .features
        .iter()
        .map(|feature| match feature_description(feature) {
            Some(description) => format!("{} ({})", description, feature),
            None => feature.clone(),
        })
        .collect();
    if !notes.is_empty() {
        output.push('\n');
        output.push_str("Notes:\n");
        for note in notes {
            output.push_str(&format!("  {}\n", note));
        }
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{ExchangeRate, FixedRates};
    use crate::models::{CurrencyCode, InvoiceLine, InvoiceNumber};
    use crate::services::summarize;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(currency: &str) -> Invoice {
        let mut invoice = Invoice::new(
            InvoiceNumber::new(2024, 7),
            CurrencyCode::parse(currency).unwrap(),
            "ACME",
            date(2024, 1, 31),
            date(2024, 1, 31),
            15,
        );
        invoice.add_line(
            InvoiceLine::new("WEB", "Web hosting", "szt.", dec!(3), dec!(23), dec!(10)).unwrap(),
        );
        invoice
    }

    fn customer() -> Customer {
        Customer::new("ACME", "Acme", "ul. Prosta 1\n00-001 Warszawa")
    }

    #[test]
    fn test_list() {
        let output = format_invoice_list(&[invoice("PLN")]);
        assert!(output.contains("2024/07"));
        assert!(output.contains("36.90"));
        assert!(output.contains("draft"));
        assert_eq!(format_invoice_list(&[]), "No invoices found.");
    }

    #[test]
    fn test_details() {
        let mut invoice = invoice("PLN");
        invoice.finalised = true;
        let output = format_invoice_details(&invoice);
        assert!(output.starts_with("Invoice: 2024/07 [final]"));
        assert!(output.contains("Deadline:  2024-02-15 (15 days)"));
        assert!(output.contains("Web hosting"));
        assert!(output.contains("30.00"));
        assert!(output.contains("6.90"));
        assert!(output.contains("36.90"));
    }

    #[test]
    fn test_document_in_home_currency() {
        let invoice = invoice("PLN");
        let rates = FixedRates::new(14);
        let summary = summarize(&invoice, &rates, &CurrencyCode::home()).unwrap();
        let settings = Settings {
            seller: "Jan Kowalski\nul. Długa 5\nKraków".to_string(),
            ..Settings::default()
        };

        let output = format_document(&invoice, &customer(), &summary, &settings);
        assert!(output.starts_with("INVOICE 2024/07"));
        assert!(output.contains("  ul. Długa 5\n"));
        assert!(output.contains("  00-001 Warszawa\n"));
        assert!(output.contains("Amount due: 36.90 PLN"));
        assert!(!output.contains("VAT in"));
    }

    #[test]
    fn test_document_in_foreign_currency() {
        let mut invoice = invoice("EUR");
        invoice.features.insert("28b".to_string());
        let rates = FixedRates::new(14).with_rate(
            CurrencyCode::parse("EUR").unwrap(),
            date(2024, 1, 30),
            dec!(4.3),
        );
        let summary = summarize(&invoice, &rates, &CurrencyCode::home()).unwrap();

        let output = format_document(&invoice, &customer(), &summary, &Settings::default());
        assert!(output.contains("VAT in PLN: 29.67"));
        assert!(output.contains("table offline of 2024-01-30"));
        assert!(output.contains("Odwrotne obciążenie (28b)"));
    }

    #[test]
    fn test_summary_with_rate() {
        let summary = InvoiceSummary {
            number: InvoiceNumber::new(2024, 1),
            currency: CurrencyCode::parse("EUR").unwrap(),
            netto: dec!(100),
            tax: dec!(23),
            brutto: dec!(123),
            home_currency: CurrencyCode::home(),
            rate: Some(ExchangeRate {
                currency: CurrencyCode::parse("EUR").unwrap(),
                rate: dec!(4.5),
                effective: date(2024, 1, 30),
                table: "a021z240130".to_string(),
            }),
            tax_home: dec!(103.5),
        };

        let output = format_summary(&summary);
        assert!(output.contains("Gross:       123.00 EUR"));
        assert!(output.contains("103.50 PLN (1 EUR = 4.5 PLN, table a021z240130 of 2024-01-30)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 10), "a much ...");
    }
}
