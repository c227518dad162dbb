//! Configuration module for invoice-cli
//!
//! - Path resolution for settings, state and data files
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::InvoicePaths;
pub use settings::{RateSourceKind, Settings};
