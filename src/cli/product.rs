//! Product CLI commands

use clap::{Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::config::Settings;
use crate::display::{format_money, format_product_details, format_product_list};
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{CurrencyCode, PriceInput, ProductUpdate};
use crate::services::ProductService;
use crate::storage::Storage;

/// Editable product fields
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProductField {
    Name,
    Unit,
    Vat,
}

/// Product subcommands
#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product to the catalog
    Add {
        /// Product code (up to 8 characters)
        code: String,
        /// Name printed on invoice lines
        name: String,
        /// Unit of measure (defaults to the configured unit)
        #[arg(short, long)]
        unit: Option<String>,
        /// VAT rate in percent (defaults to the configured rate)
        #[arg(long)]
        vat: Option<Decimal>,
    },
    /// List the catalog
    List,
    /// Show product details
    Show {
        /// Product code
        code: String,
    },
    /// Change the name, unit or VAT rate
    Set {
        /// Product code
        code: String,
        /// Field to change
        #[arg(value_enum)]
        field: ProductField,
        /// New value
        value: String,
    },
    /// Set the net unit price in a currency
    Price {
        /// Product code
        code: String,
        /// Currency code, e.g. PLN
        currency: CurrencyCode,
        /// Net unit price
        price: Decimal,
    },
    /// Set the price in a currency from a gross unit price
    Bprice {
        /// Product code
        code: String,
        /// Currency code, e.g. PLN
        currency: CurrencyCode,
        /// Gross unit price
        bprice: Decimal,
    },
    /// Delete a product that no invoice uses
    Delete {
        /// Product code
        code: String,
    },
}

/// Handle a product command
pub fn handle_product_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ProductCommands,
) -> InvoiceResult<()> {
    let service = ProductService::new(storage);

    match cmd {
        ProductCommands::Add {
            code,
            name,
            unit,
            vat,
        } => {
            let unit = unit.unwrap_or_else(|| settings.default_unit.clone());
            let vat = vat.unwrap_or(settings.default_vat);
            let product = service.create(&code, &name, &unit, vat)?;
            println!("Created product: {} ({})", product.code, product.name);
        }
        ProductCommands::List => {
            let products = service.list()?;
            println!("{}", format_product_list(&products));
        }
        ProductCommands::Show { code } => {
            let product = service.require(&code)?;
            print!("{}", format_product_details(&product));
        }
        ProductCommands::Set { code, field, value } => {
            let update = match field {
                ProductField::Name => ProductUpdate::Name(value),
                ProductField::Unit => ProductUpdate::Unit(value),
                ProductField::Vat => ProductUpdate::Vat(parse_decimal(&value)?),
            };
            let product = service.update(&code, update)?;
            println!("Updated product: {}", product.code);
        }
        ProductCommands::Price {
            code,
            currency,
            price,
        } => {
            set_price(&service, &code, currency, PriceInput::Price(price))?;
        }
        ProductCommands::Bprice {
            code,
            currency,
            bprice,
        } => {
            set_price(&service, &code, currency, PriceInput::BPrice(bprice))?;
        }
        ProductCommands::Delete { code } => {
            let product = service.delete(&code)?;
            println!("Deleted product: {}", product.code);
        }
    }

    Ok(())
}

fn set_price(
    service: &ProductService<'_>,
    code: &str,
    currency: CurrencyCode,
    input: PriceInput,
) -> InvoiceResult<()> {
    let product = service.set_price(code, currency.clone(), input)?;
    if let Some(price) = product.prices.get(&currency) {
        println!(
            "Price of {} set to {} {} net",
            product.code,
            format_money(*price),
            currency
        );
    }
    Ok(())
}

/// Parse a decimal argument given as free text
fn parse_decimal(value: &str) -> InvoiceResult<Decimal> {
    value
        .trim()
        .parse()
        .map_err(|_| InvoiceError::Validation(format!("Invalid number: {}", value)))
}
