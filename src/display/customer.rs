//! Customer display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Customer;

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    short: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "City")]
    city: String,
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            code: customer.code.clone(),
            short: customer.short.clone(),
            email: customer.email.clone().unwrap_or_default(),
            city: customer.address_lines().last().unwrap_or("").to_string(),
        }
    }
}

/// Format a list of customers as a table
pub fn format_customer_list(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers found.".to_string();
    }

    let rows: Vec<CustomerRow> = customers.iter().map(CustomerRow::from).collect();
    Table::new(rows).with(Style::psql()).to_string()
}

/// Format a single customer with its full address
pub fn format_customer_details(customer: &Customer) -> String {
    let mut output = String::new();

    output.push_str(&format!("Customer: {}\n", customer.short));
    output.push_str(&format!("  Code:    {}\n", customer.code));
    if let Some(email) = &customer.email {
        output.push_str(&format!("  Email:   {}\n", email));
    }
    output.push_str("  Address:\n");
    for line in customer.address_lines() {
        output.push_str(&format!("    {}\n", line));
    }
    output.push_str(&format!(
        "  Created: {}\n",
        customer.created_at.format("%Y-%m-%d")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Customer {
        Customer::new("ACME", "Acme", "ul. Prosta 1\n00-001 Warszawa").with_email("a@acme.example")
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_customer_list(&[]), "No customers found.");
    }

    #[test]
    fn test_list_shows_city() {
        let output = format_customer_list(&[acme()]);
        assert!(output.contains("Code"));
        assert!(output.contains("ACME"));
        assert!(output.contains("00-001 Warszawa"));
        assert!(output.contains("a@acme.example"));
    }

    #[test]
    fn test_details_list_every_address_line() {
        let output = format_customer_details(&acme());
        assert!(output.starts_with("Customer: Acme"));
        assert!(output.contains("    ul. Prosta 1\n"));
        assert!(output.contains("    00-001 Warszawa\n"));
    }
}
