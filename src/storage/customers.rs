//! Customer repository for JSON storage
//!
//! Manages loading and saving customers to customers.json

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::InvoiceError;
use crate::models::Customer;

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CustomerData {
    customers: Vec<Customer>,
}

/// Repository for customer persistence, keyed by customer code
pub struct CustomerRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Customer>>,
}

impl CustomerRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load customers from disk
    pub fn load(&self) -> Result<(), InvoiceError> {
        let file_data: CustomerData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for customer in file_data.customers {
            data.insert(customer.code.clone(), customer);
        }

        Ok(())
    }

    /// Save customers to disk
    pub fn save(&self) -> Result<(), InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = CustomerData {
            customers: data.values().cloned().collect(),
        };

        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, code: &str) -> Result<Option<Customer>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(code).cloned())
    }

    /// Get all customers, ordered by code
    pub fn get_all(&self) -> Result<Vec<Customer>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().cloned().collect())
    }

    pub fn upsert(&self, customer: Customer) -> Result<(), InvoiceError> {
        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(customer.code.clone(), customer);
        Ok(())
    }

    pub fn delete(&self, code: &str) -> Result<bool, InvoiceError> {
        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(code).is_some())
    }

    pub fn exists(&self, code: &str) -> Result<bool, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.contains_key(code))
    }

    pub fn count(&self) -> Result<usize, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("customers.json");

        let repo = CustomerRepository::new(path.clone());
        repo.load().unwrap();
        repo.upsert(Customer::new("ACME", "Acme", "Street 1").with_email("a@acme.example"))
            .unwrap();
        repo.save().unwrap();

        let repo2 = CustomerRepository::new(path);
        repo2.load().unwrap();
        let customer = repo2.get("ACME").unwrap().unwrap();
        assert_eq!(customer.email.as_deref(), Some("a@acme.example"));
        assert_eq!(repo2.count().unwrap(), 1);
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CustomerRepository::new(temp_dir.path().join("customers.json"));

        repo.upsert(Customer::new("ACME", "Acme", "Street 1")).unwrap();
        assert!(repo.exists("ACME").unwrap());
        assert!(repo.delete("ACME").unwrap());
        assert!(!repo.exists("ACME").unwrap());
    }
}
