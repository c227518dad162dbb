//! Core data models for invoice-cli
//!
//! Customers, catalog products, invoices with their lines, invoice numbers,
//! and the price/tax derivation rules shared by products and lines.

pub mod currency;
pub mod customer;
pub mod invoice;
pub mod line_spec;
pub mod number;
pub mod pricing;
pub mod product;

pub use currency::{CurrencyCode, HOME_CURRENCY};
pub use customer::{Customer, CustomerValidationError};
pub use invoice::{Invoice, InvoiceLine, InvoiceUpdate, InvoiceValidationError};
pub use line_spec::LineSpec;
pub use number::InvoiceNumber;
pub use pricing::{floor_cents, PriceInput, Priced, Quantified};
pub use product::{CatalogPrice, Product, ProductUpdate, ProductValidationError};
