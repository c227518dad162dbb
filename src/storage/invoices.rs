//! Invoice repository for JSON storage
//!
//! Manages loading and saving invoices to invoices.json

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceNumber};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct InvoiceData {
    invoices: Vec<Invoice>,
}

/// Repository for invoice persistence, keyed by invoice number
pub struct InvoiceRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<InvoiceNumber, Invoice>>,
}

impl InvoiceRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load invoices from disk
    pub fn load(&self) -> Result<(), InvoiceError> {
        let file_data: InvoiceData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for invoice in file_data.invoices {
            data.insert(invoice.number, invoice);
        }

        Ok(())
    }

    /// Save invoices to disk
    pub fn save(&self) -> Result<(), InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = InvoiceData {
            invoices: data.values().cloned().collect(),
        };

        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, number: InvoiceNumber) -> Result<Option<Invoice>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&number).cloned())
    }

    /// Get all invoices, oldest number first
    pub fn get_all(&self) -> Result<Vec<Invoice>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().cloned().collect())
    }

    /// Invoices issued in one year
    pub fn get_by_year(&self, year: i32) -> Result<Vec<Invoice>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .range(InvoiceNumber::new(year, 0)..=InvoiceNumber::new(year, u32::MAX))
            .map(|(_, invoice)| invoice.clone())
            .collect())
    }

    pub fn upsert(&self, invoice: Invoice) -> Result<(), InvoiceError> {
        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(invoice.number, invoice);
        Ok(())
    }

    pub fn delete(&self, number: InvoiceNumber) -> Result<bool, InvoiceError> {
        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&number).is_some())
    }

    pub fn exists(&self, number: InvoiceNumber) -> Result<bool, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.contains_key(&number))
    }

    /// Whether any invoice is addressed to the customer
    pub fn references_customer(&self, code: &str) -> Result<bool, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().any(|invoice| invoice.customer == code))
    }

    /// Whether any invoice line was created from the product
    pub fn references_product(&self, code: &str) -> Result<bool, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .values()
            .flat_map(|invoice| invoice.lines.iter())
            .any(|line| line.product == code))
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
    use crate::models::{CurrencyCode, InvoiceLine};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn invoice(year: i32, seq: u32, customer: &str) -> Invoice {
        let date = NaiveDate::from_ymd_opt(year, 1, 31).unwrap();
        Invoice::new(
            InvoiceNumber::new(year, seq),
            CurrencyCode::home(),
            customer,
            date,
            date,
            15,
        )
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invoices.json");

        let repo = InvoiceRepository::new(path.clone());
        repo.load().unwrap();
        let mut inv = invoice(2024, 1, "ACME");
        inv.add_line(InvoiceLine::new("WEB", "Web", "szt.", dec!(2), dec!(23), dec!(10)).unwrap());
        repo.upsert(inv).unwrap();
        repo.save().unwrap();

        let repo2 = InvoiceRepository::new(path);
        repo2.load().unwrap();
        let loaded = repo2.get(InvoiceNumber::new(2024, 1)).unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.netto(), dec!(20));
    }

    #[test]
    fn test_get_by_year() {
        let temp_dir = TempDir::new().unwrap();
        let repo = InvoiceRepository::new(temp_dir.path().join("invoices.json"));

        repo.upsert(invoice(2023, 9, "ACME")).unwrap();
        repo.upsert(invoice(2024, 2, "ACME")).unwrap();
        repo.upsert(invoice(2024, 1, "ACME")).unwrap();

        let numbers: Vec<_> = repo
            .get_by_year(2024)
            .unwrap()
            .into_iter()
            .map(|i| i.number.to_string())
            .collect();
        assert_eq!(numbers, vec!["2024/01", "2024/02"]);
    }

    #[test]
    fn test_references() {
        let temp_dir = TempDir::new().unwrap();
        let repo = InvoiceRepository::new(temp_dir.path().join("invoices.json"));

        let mut inv = invoice(2024, 1, "ACME");
        inv.add_line(InvoiceLine::new("WEB", "Web", "szt.", dec!(1), dec!(23), dec!(10)).unwrap());
        repo.upsert(inv).unwrap();

        assert!(repo.references_customer("ACME").unwrap());
        assert!(!repo.references_customer("OTHER").unwrap());
        assert!(repo.references_product("WEB").unwrap());
        assert!(!repo.references_product("CONS").unwrap());
    }
}
