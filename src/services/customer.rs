//! Customer service
//!
//! Creation with validation and duplicate checks, lookup, and deletion of
//! customers no invoice refers to.

use tracing::info;

use crate::error::{InvoiceError, InvoiceResult};
use crate::models::Customer;
use crate::storage::Storage;

/// Service for customer management
pub struct CustomerService<'a> {
    storage: &'a Storage,
}

impl<'a> CustomerService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new customer
    pub fn create(
        &self,
        code: &str,
        short: &str,
        address: &str,
        email: Option<&str>,
    ) -> InvoiceResult<Customer> {
        let code = code.trim();

        if self.storage.customers.exists(code)? {
            return Err(InvoiceError::Duplicate {
                entity_type: "Customer",
                identifier: code.to_string(),
            });
        }

        let mut customer = Customer::new(code, short.trim(), address);
        if let Some(email) = email {
            customer = customer.with_email(email.trim());
        }

        customer
            .validate()
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.storage.customers.upsert(customer.clone())?;
        self.storage.customers.save()?;

        info!(code = %customer.code, "customer created");
        Ok(customer)
    }

    pub fn get(&self, code: &str) -> InvoiceResult<Option<Customer>> {
        self.storage.customers.get(code)
    }

    /// Get a customer, failing if it does not exist
    pub fn require(&self, code: &str) -> InvoiceResult<Customer> {
        self.get(code)?
            .ok_or_else(|| InvoiceError::customer_not_found(code))
    }

    pub fn list(&self) -> InvoiceResult<Vec<Customer>> {
        self.storage.customers.get_all()
    }

    /// Delete a customer that no invoice refers to
    pub fn delete(&self, code: &str) -> InvoiceResult<Customer> {
        let customer = self.require(code)?;

        if self.storage.invoices.references_customer(code)? {
            return Err(InvoiceError::Validation(format!(
                "Customer {} is referenced by invoices and cannot be deleted",
                code
            )));
        }

        self.storage.customers.delete(code)?;
        self.storage.customers.save()?;

        info!(code, "customer deleted");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::InvoicePaths;
    use crate::models::{CurrencyCode, Invoice, InvoiceNumber};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_and_get() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CustomerService::new(&storage);

        let customer = service
            .create("ACME", "Acme", "ul. Prosta 1\nWarszawa", Some("a@acme.example"))
            .unwrap();
        assert_eq!(customer.code, "ACME");

        let fetched = service.require("ACME").unwrap();
        assert_eq!(fetched.short, "Acme");
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CustomerService::new(&storage);

        service.create("ACME", "Acme", "Street 1", None).unwrap();
        let err = service.create("ACME", "Other", "Street 2", None).unwrap_err();
        assert!(matches!(err, InvoiceError::Duplicate { .. }));
    }

    #[test]
    fn test_validation_error() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CustomerService::new(&storage);

        let err = service.create("ACME", "Acme", "  ", None).unwrap_err();
        assert!(err.is_validation());
        assert!(service.get("ACME").unwrap().is_none());
    }

    #[test]
    fn test_delete_refused_when_invoiced() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CustomerService::new(&storage);
        service.create("ACME", "Acme", "Street 1", None).unwrap();
        service.create("IDLE", "Idle", "Street 2", None).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        storage
            .invoices
            .upsert(Invoice::new(
                InvoiceNumber::new(2024, 1),
                CurrencyCode::home(),
                "ACME",
                date,
                date,
                15,
            ))
            .unwrap();

        assert!(service.delete("ACME").unwrap_err().is_validation());
        service.delete("IDLE").unwrap();
        assert!(service.delete("IDLE").unwrap_err().is_not_found());
    }
}
