//! Path management for invoice-cli
//!
//! ## Path Resolution Order
//!
//! 1. `INVOICE_CLI_DATA_DIR` environment variable (if set)
//! 2. The platform config directory (`$XDG_CONFIG_HOME/invoice-cli` or
//!    `~/.config/invoice-cli` on Linux, `%APPDATA%\invoice-cli` on Windows)

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::InvoiceError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "INVOICE_CLI_DATA_DIR";

/// Manages all paths used by invoice-cli
#[derive(Debug, Clone)]
pub struct InvoicePaths {
    /// Base directory for all invoice-cli data
    base_dir: PathBuf,
}

impl InvoicePaths {
    /// Create a new InvoicePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, InvoiceError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create InvoicePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Default directory for rendered invoice documents (<base>/invoices/)
    pub fn invoices_dir(&self) -> PathBuf {
        self.base_dir.join("invoices")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the invoice number state file
    pub fn state_file(&self) -> PathBuf {
        self.base_dir.join("state")
    }

    pub fn products_file(&self) -> PathBuf {
        self.data_dir().join("products.json")
    }

    pub fn customers_file(&self) -> PathBuf {
        self.data_dir().join("customers.json")
    }

    pub fn invoices_file(&self) -> PathBuf {
        self.data_dir().join("invoices.json")
    }

    /// Get the path to the offline exchange rate table
    pub fn rates_file(&self) -> PathBuf {
        self.data_dir().join("rates.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), InvoiceError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| InvoiceError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| InvoiceError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if invoice-cli has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, InvoiceError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| InvoiceError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("invoice-cli"))
}
