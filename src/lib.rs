//! invoice-cli - personal invoicing from the command line
//!
//! Keeps a catalog of customers and products, builds invoices with prices
//! derived from net or gross inputs, converts VAT to the home currency, and
//! numbers invoices sequentially per fiscal year through a locked state file.
//!
//! # Architecture
//!
//! - `config`: Paths and settings
//! - `error`: Custom error types
//! - `models`: Customers, products, invoices and the price model
//! - `storage`: JSON repositories and the invoice number allocator
//! - `services`: Business logic layer
//! - `fx`: Exchange rate sources
//! - `cli` / `display`: Command handlers and terminal output
//!
//! # Example
//!
//! ```rust,ignore
//! use invoice::config::{InvoicePaths, Settings};
//! use invoice::storage::Storage;
//!
//! let paths = InvoicePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut allocator = Storage::new(paths)?.open_allocator()?;
//! let number = allocator.get_number(2024)?;
//! allocator.save()?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod fx;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{InvoiceError, InvoiceResult};
