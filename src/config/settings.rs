//! User settings for invoice-cli
//!
//! Home currency, defaults applied to new products and invoices, and the
//! exchange rate source.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::paths::InvoicePaths;
use crate::error::InvoiceError;
use crate::models::CurrencyCode;

/// Where exchange rates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    /// Published NBP average-rate tables (network)
    #[default]
    Nbp,
    /// The local `rates.json` table
    Offline,
}

/// User settings for invoice-cli
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency tax is reported in
    #[serde(default = "default_home_currency")]
    pub home_currency: CurrencyCode,

    /// VAT rate for new products, in percent
    #[serde(default = "default_vat")]
    pub default_vat: Decimal,

    /// Payment term for new invoices, in days
    #[serde(default = "default_grace_days")]
    pub default_grace_days: u32,

    /// Unit of measurement for new products
    #[serde(default = "default_unit")]
    pub default_unit: String,

    /// Prefix of rendered document file names
    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,

    /// How many days before the delivery date to search for a published rate
    #[serde(default = "default_rate_lookback_days")]
    pub rate_lookback_days: u32,

    #[serde(default)]
    pub rate_source: RateSourceKind,

    /// Directory for rendered documents (defaults to `<base>/invoices`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Seller address block printed on documents
    #[serde(default)]
    pub seller: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_home_currency() -> CurrencyCode {
    CurrencyCode::home()
}

fn default_vat() -> Decimal {
    Decimal::from(23)
}

fn default_grace_days() -> u32 {
    15
}

fn default_unit() -> String {
    "szt.".to_string()
}

fn default_invoice_prefix() -> String {
    "INV".to_string()
}

fn default_rate_lookback_days() -> u32 {
    14 // longest plausible pause in rate publication
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            home_currency: default_home_currency(),
            default_vat: default_vat(),
            default_grace_days: default_grace_days(),
            default_unit: default_unit(),
            invoice_prefix: default_invoice_prefix(),
            rate_lookback_days: default_rate_lookback_days(),
            rate_source: RateSourceKind::default(),
            output_dir: None,
            seller: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &InvoicePaths) -> Result<Self, InvoiceError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                InvoiceError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                InvoiceError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &InvoicePaths) -> Result<(), InvoiceError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            InvoiceError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            InvoiceError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Directory rendered documents are written to
    pub fn output_dir(&self, paths: &InvoicePaths) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| paths.invoices_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.home_currency.as_str(), "PLN");
        assert_eq!(settings.default_vat, dec!(23));
        assert_eq!(settings.default_grace_days, 15);
        assert_eq!(settings.rate_lookback_days, 14);
        assert_eq!(settings.rate_source, RateSourceKind::Nbp);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.rate_source = RateSourceKind::Offline;
        settings.invoice_prefix = "FV".into();

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.rate_source, RateSourceKind::Offline);
        assert_eq!(loaded.invoice_prefix, "FV");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"home_currency": "eur"}"#).unwrap();
        assert_eq!(settings.home_currency.as_str(), "EUR");
        assert_eq!(settings.default_unit, "szt.");
    }

    #[test]
    fn test_output_dir_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        assert_eq!(settings.output_dir(&paths), paths.invoices_dir());

        settings.output_dir = Some(temp_dir.path().join("out"));
        assert_eq!(settings.output_dir(&paths), temp_dir.path().join("out"));
    }
}
