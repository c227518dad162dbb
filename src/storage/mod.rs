//! Storage layer for invoice-cli
//!
//! JSON file repositories with atomic writes for the catalog and invoices,
//! plus the locked sequence state that hands out invoice numbers.

pub mod customers;
pub mod file_io;
pub mod init;
pub mod invoices;
pub mod products;
pub mod sequence;

pub use customers::CustomerRepository;
pub use file_io::{read_json, write_json_atomic, write_new_file};
pub use init::initialize_storage;
pub use invoices::InvoiceRepository;
pub use products::ProductRepository;
pub use sequence::{FiscalYear, NumberAllocator, Registration};

use crate::config::paths::InvoicePaths;
use crate::error::InvoiceError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: InvoicePaths,
    pub products: ProductRepository,
    pub customers: CustomerRepository,
    pub invoices: InvoiceRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: InvoicePaths) -> Result<Self, InvoiceError> {
        paths.ensure_directories()?;

        Ok(Self {
            products: ProductRepository::new(paths.products_file()),
            customers: CustomerRepository::new(paths.customers_file()),
            invoices: InvoiceRepository::new(paths.invoices_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &InvoicePaths {
        &self.paths
    }

    /// Lock the sequence state for this session
    ///
    /// Blocks while another session holds it. Data loaded before this call
    /// may be stale; call [`Storage::reload`] once the lock is held.
    pub fn open_allocator(&self) -> Result<NumberAllocator, InvoiceError> {
        NumberAllocator::open(self.paths.state_file())
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), InvoiceError> {
        self.reload()
    }

    /// Replace the in-memory data with what is on disk now
    pub fn reload(&self) -> Result<(), InvoiceError> {
        self.products.load()?;
        self.customers.load()?;
        self.invoices.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), InvoiceError> {
        self.products.save()?;
        self.customers.save()?;
        self.invoices.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_open_allocator_uses_state_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        let allocator = storage.open_allocator().unwrap();
        assert_eq!(allocator.path(), temp_dir.path().join("state"));
    }
}
