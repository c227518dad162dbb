//! Product display formatting

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use super::{format_money, format_percent};
use crate::models::{Priced, Product};

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "VAT")]
    vat: String,
    #[tabled(rename = "Prices (net)")]
    prices: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        let prices = product
            .prices
            .iter()
            .map(|(currency, price)| format!("{} {}", format_money(*price), currency))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            vat: format_percent(product.vat),
            prices,
        }
    }
}

/// Format the catalog as a table
pub fn format_product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }

    let rows: Vec<ProductRow> = products.iter().map(ProductRow::from).collect();
    Table::new(rows)
        .with(Style::psql())
        .modify(Columns::single(3), Alignment::right())
        .to_string()
}

/// Format a product with net and gross prices per currency
pub fn format_product_details(product: &Product) -> String {
    let mut output = String::new();

    output.push_str(&format!("Product: {}\n", product.name));
    output.push_str(&format!("  Code: {}\n", product.code));
    output.push_str(&format!("  Unit: {}\n", product.unit));
    output.push_str(&format!("  VAT:  {}\n", format_percent(product.vat)));

    if product.prices.is_empty() {
        output.push_str("  No prices set\n");
        return output;
    }

    output.push_str(&format!("  {:<8} {:>12} {:>12}\n", "Currency", "Net", "Gross"));
    for currency in product.prices.keys() {
        if let Some(price) = product.price_in(currency) {
            output.push_str(&format!(
                "  {:<8} {:>12} {:>12}\n",
                currency.as_str(),
                format_money(price.price()),
                format_money(price.bprice()),
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrencyCode, PriceInput};
    use rust_decimal_macros::dec;

    fn web() -> Product {
        let mut product = Product::new("WEB", "Web hosting", "szt.", dec!(23));
        product
            .set_price(CurrencyCode::home(), PriceInput::Price(dec!(10)))
            .unwrap();
        product
            .set_price(CurrencyCode::parse("EUR").unwrap(), PriceInput::Price(dec!(2.5)))
            .unwrap();
        product
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_product_list(&[]), "No products found.");
    }

    #[test]
    fn test_list_joins_prices() {
        let output = format_product_list(&[web()]);
        assert!(output.contains("WEB"));
        assert!(output.contains("23%"));
        assert!(output.contains("2.50 EUR, 10.00 PLN"));
    }

    #[test]
    fn test_details_show_gross() {
        let output = format_product_details(&web());
        assert!(output.contains("Code: WEB"));
        assert!(output.contains("10.00"));
        assert!(output.contains("12.30"));
        assert!(output.contains("3.08"));
    }

    #[test]
    fn test_details_without_prices() {
        let product = Product::new("NEW", "New thing", "h", dec!(8));
        assert!(format_product_details(&product).contains("No prices set"));
    }
}
