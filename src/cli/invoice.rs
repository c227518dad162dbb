//! Invoice CLI commands
//!
//! Every command runs inside a session that holds the sequence state lock;
//! `new` allocates from it and `numbers` reports it.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::debug;

use super::{parse_date, parse_line_specs};
use crate::config::Settings;
use crate::display::{format_document, format_invoice_details, format_invoice_list, format_summary};
use crate::error::{InvoiceError, InvoiceResult};
use crate::fx::source_from_settings;
use crate::models::invoice::last_day_of_month;
use crate::models::{CurrencyCode, InvoiceNumber, InvoiceUpdate, LineSpec, PriceInput};
use crate::services::{summarize, CustomerService, InvoiceDraft, InvoiceService};
use crate::storage::{write_new_file, NumberAllocator, Storage};

/// Editable invoice fields
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InvoiceField {
    Currency,
    Customer,
    Deadline,
    Delivered,
    Grace,
    Issued,
}

/// Exactly one way of pricing a line
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct PriceArgs {
    /// Net unit price
    #[arg(long)]
    price: Option<Decimal>,
    /// Gross unit price
    #[arg(long)]
    bprice: Option<Decimal>,
    /// Net line total
    #[arg(long)]
    netto: Option<Decimal>,
    /// Gross line total
    #[arg(long)]
    brutto: Option<Decimal>,
}

impl PriceArgs {
    fn into_input(self) -> Option<PriceInput> {
        self.price
            .map(PriceInput::Price)
            .or(self.bprice.map(PriceInput::BPrice))
            .or(self.netto.map(PriceInput::Netto))
            .or(self.brutto.map(PriceInput::Brutto))
    }
}

/// Invoice subcommands
#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Create an invoice
    New {
        /// Customer code
        #[arg(short, long)]
        customer: String,
        /// Explicit number as YEAR/SEQ (allocated from the sequence otherwise)
        #[arg(short, long)]
        number: Option<String>,
        /// Invoice currency (defaults to the home currency)
        #[arg(long)]
        currency: Option<CurrencyCode>,
        /// Issue date: YYYY-MM-DD, today or last-month (defaults to the end of this month)
        #[arg(short, long, value_parser = parse_date)]
        issued: Option<NaiveDate>,
        /// Delivery date (defaults to the issue date)
        #[arg(short, long, value_parser = parse_date)]
        delivered: Option<NaiveDate>,
        /// Payment term in days
        #[arg(short, long)]
        grace: Option<u32>,
        /// Feature code, e.g. 28b (repeatable)
        #[arg(short, long = "feature")]
        features: Vec<String>,
        /// Lines as CODE,AMOUNT[,price=X|bprice=X|netto=X|brutto=X][,vat=X]
        lines: Vec<String>,
    },
    /// List invoices
    List {
        /// Only invoices numbered in this year
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Show an invoice with its lines
    Show {
        /// Invoice number, e.g. 2024/07
        number: String,
    },
    /// Add a line to a draft invoice
    AddLine {
        /// Invoice number
        number: String,
        /// Product code
        product: String,
        /// Quantity
        amount: Decimal,
        #[command(flatten)]
        price: PriceArgs,
        /// VAT rate override in percent
        #[arg(long)]
        vat: Option<Decimal>,
    },
    /// Remove a line from a draft invoice
    RemoveLine {
        /// Invoice number
        number: String,
        /// Line position as shown by `invoice show` (from 1)
        position: usize,
    },
    /// Change a field of a draft invoice
    Set {
        /// Invoice number
        number: String,
        /// Field to change
        #[arg(value_enum)]
        field: InvoiceField,
        /// New value
        value: String,
    },
    /// Add or remove a feature code on a draft invoice
    Feature {
        /// Invoice number
        number: String,
        /// Feature code, e.g. 28b
        feature: String,
        /// Remove instead of add
        #[arg(short, long)]
        remove: bool,
    },
    /// Lock an invoice against changes
    #[command(alias = "finalize")]
    Finalise {
        /// Invoice number
        number: String,
    },
    /// Reopen a finalised invoice
    #[command(alias = "unfinalize")]
    Unfinalise {
        /// Invoice number
        number: String,
    },
    /// Delete a draft invoice
    Delete {
        /// Invoice number
        number: String,
    },
    /// Show totals with the tax in the home currency
    Summary {
        /// Invoice number
        number: String,
    },
    /// Write the invoice document to the output directory
    Render {
        /// Invoice number
        number: String,
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the last issued sequence number per year
    Numbers,
}

/// Handle an invoice command
pub fn handle_invoice_command(
    storage: &Storage,
    settings: &Settings,
    allocator: &mut NumberAllocator,
    offline: bool,
    cmd: InvoiceCommands,
) -> InvoiceResult<()> {
    let service = InvoiceService::new(storage);

    match cmd {
        InvoiceCommands::New {
            customer,
            number,
            currency,
            issued,
            delivered,
            grace,
            features,
            lines,
        } => {
            let issued = issued.unwrap_or_else(|| last_day_of_month(Local::now().date_naive()));
            let draft = InvoiceDraft {
                number,
                currency: currency.unwrap_or_else(|| settings.home_currency.clone()),
                customer,
                issued,
                delivered: delivered.unwrap_or(issued),
                grace: grace.unwrap_or(settings.default_grace_days),
                features,
                lines: parse_line_specs(&lines)?,
            };

            let invoice = service.create(allocator, draft)?;
            println!("Created invoice: {}", invoice);
        }
        InvoiceCommands::List { year } => {
            let invoices = service.list(year)?;
            println!("{}", format_invoice_list(&invoices));
        }
        InvoiceCommands::Show { number } => {
            let invoice = service.require(InvoiceNumber::parse(&number)?)?;
            print!("{}", format_invoice_details(&invoice));
        }
        InvoiceCommands::AddLine {
            number,
            product,
            amount,
            price,
            vat,
        } => {
            let mut spec = LineSpec::new(product, amount);
            if let Some(input) = price.into_input() {
                spec = spec.with_price(input);
            }
            if let Some(vat) = vat {
                spec = spec.with_vat(vat);
            }

            let invoice = service.add_line(InvoiceNumber::parse(&number)?, &spec)?;
            println!("Added {} to invoice {}", spec, invoice.number);
        }
        InvoiceCommands::RemoveLine { number, position } => {
            let line = service.remove_line(InvoiceNumber::parse(&number)?, position)?;
            println!("Removed line {}: {}", position, line.name);
        }
        InvoiceCommands::Set {
            number,
            field,
            value,
        } => {
            let update = parse_update(field, &value)?;
            let invoice = service.update(InvoiceNumber::parse(&number)?, update)?;
            println!("Updated invoice: {}", invoice);
        }
        InvoiceCommands::Feature {
            number,
            feature,
            remove,
        } => {
            let update = if remove {
                InvoiceUpdate::RemoveFeature(feature)
            } else {
                InvoiceUpdate::AddFeature(feature)
            };
            let invoice = service.update(InvoiceNumber::parse(&number)?, update)?;
            let features: Vec<&str> = invoice.features.iter().map(String::as_str).collect();
            println!("Features of {}: {}", invoice.number, features.join(", "));
        }
        InvoiceCommands::Finalise { number } => {
            let invoice = service.finalise(InvoiceNumber::parse(&number)?)?;
            println!("Finalised invoice: {}", invoice.number);
        }
        InvoiceCommands::Unfinalise { number } => {
            let invoice = service.unfinalise(InvoiceNumber::parse(&number)?)?;
            println!("Reopened invoice: {}", invoice.number);
        }
        InvoiceCommands::Delete { number } => {
            let invoice = service.delete(InvoiceNumber::parse(&number)?)?;
            println!("Deleted invoice: {}", invoice.number);
        }
        InvoiceCommands::Summary { number } => {
            let source = source_from_settings(settings, storage.paths(), offline)?;
            let summary = service.summary(
                InvoiceNumber::parse(&number)?,
                &*source,
                &settings.home_currency,
            )?;
            print!("{}", format_summary(&summary));
        }
        InvoiceCommands::Render { number, output } => {
            let invoice = service.require(InvoiceNumber::parse(&number)?)?;
            let customer = CustomerService::new(storage).require(&invoice.customer)?;
            let source = source_from_settings(settings, storage.paths(), offline)?;
            let summary = summarize(&invoice, &*source, &settings.home_currency)?;

            let dir = output.unwrap_or_else(|| settings.output_dir(storage.paths()));
            let path = dir.join(format!("{}.txt", invoice.stem(&settings.invoice_prefix)));
            debug!(path = %path.display(), "rendering invoice");

            write_new_file(&path, &format_document(&invoice, &customer, &summary, settings))?;
            println!("Wrote {}", path.display());
        }
        InvoiceCommands::Numbers => {
            if allocator.counters().is_empty() {
                println!("No invoice numbers issued yet.");
            }
            for (year, seq) in allocator.counters() {
                println!("{}: {}", year, InvoiceNumber::new(*year, *seq));
            }
        }
    }

    Ok(())
}

fn parse_update(field: InvoiceField, value: &str) -> InvoiceResult<InvoiceUpdate> {
    let date = || parse_date(value).map_err(InvoiceError::Validation);

    Ok(match field {
        InvoiceField::Currency => InvoiceUpdate::Currency(
            CurrencyCode::parse(value).map_err(|e| InvoiceError::Validation(e.to_string()))?,
        ),
        InvoiceField::Customer => InvoiceUpdate::Customer(value.trim().to_string()),
        InvoiceField::Deadline => InvoiceUpdate::Deadline(date()?),
        InvoiceField::Delivered => InvoiceUpdate::Delivered(date()?),
        InvoiceField::Issued => InvoiceUpdate::Issued(date()?),
        InvoiceField::Grace => InvoiceUpdate::Grace(value.trim().parse().map_err(|_| {
            InvoiceError::Validation(format!("Invalid number of days: {}", value))
        })?),
    })
}
