//! Storage initialization
//!
//! Handles first-run setup: directories, settings, empty data files and the
//! sequence state file.

use crate::config::paths::InvoicePaths;
use crate::config::settings::Settings;
use crate::error::InvoiceError;

use super::file_io::write_json_atomic;
use super::sequence::NumberAllocator;

/// Initialize storage for a fresh installation
///
/// Existing files are left untouched, so running this twice is harmless.
pub fn initialize_storage(paths: &InvoicePaths) -> Result<(), InvoiceError> {
    paths.ensure_directories()?;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
    }

    for (file, key) in [
        (paths.products_file(), "products"),
        (paths.customers_file(), "customers"),
        (paths.invoices_file(), "invoices"),
    ] {
        if !file.exists() {
            write_json_atomic(&file, &serde_json::json!({ key: [] }))?;
        }
    }

    if !paths.rates_file().exists() {
        write_json_atomic(paths.rates_file(), &serde_json::json!({}))?;
    }

    // Opening creates the state file with an empty sequence if it is missing.
    NumberAllocator::open(paths.state_file())?;

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &InvoicePaths) -> bool {
    !paths.settings_file().exists() || !paths.state_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());

        assert!(needs_initialization(&paths));

        initialize_storage(&paths).unwrap();

        assert!(!needs_initialization(&paths));
        assert!(paths.products_file().exists());
        assert!(paths.customers_file().exists());
        assert!(paths.invoices_file().exists());
        assert!(paths.rates_file().exists());
        assert!(paths.state_file().exists());
    }

    #[test]
    fn test_initialized_files_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();

        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        assert_eq!(storage.products.count().unwrap(), 0);
        assert_eq!(storage.invoices.count().unwrap(), 0);
    }

    #[test]
    fn test_doesnt_overwrite_existing() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths).unwrap();
        std::fs::write(paths.state_file(), r#"{"2024": 12}"#).unwrap();

        let mut settings = Settings::default();
        settings.invoice_prefix = "FV".into();
        settings.save(&paths).unwrap();

        initialize_storage(&paths).unwrap();

        let allocator = NumberAllocator::open(paths.state_file()).unwrap();
        assert_eq!(allocator.counter(2024), 12);
        assert_eq!(Settings::load_or_create(&paths).unwrap().invoice_prefix, "FV");
    }
}
