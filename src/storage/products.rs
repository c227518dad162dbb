//! Product repository for JSON storage
//!
//! Manages loading and saving the catalog to products.json

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::InvoiceError;
use crate::models::Product;

use super::file_io::{read_json, write_json_atomic};

/// Serializable product data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ProductData {
    products: Vec<Product>,
}

/// Repository for product persistence, keyed by product code
pub struct ProductRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Product>>,
}

impl ProductRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load products from disk
    pub fn load(&self) -> Result<(), InvoiceError> {
        let file_data: ProductData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for product in file_data.products {
            data.insert(product.code.clone(), product);
        }

        Ok(())
    }

    /// Save products to disk
    pub fn save(&self) -> Result<(), InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = ProductData {
            products: data.values().cloned().collect(),
        };

        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, code: &str) -> Result<Option<Product>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(code).cloned())
    }

    /// Get all products, ordered by code
    pub fn get_all(&self) -> Result<Vec<Product>, InvoiceError> {
        let data = self.data.read().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().cloned().collect())
    }

    /// Insert or update a product
    pub fn upsert(&self, product: Product) -> Result<(), InvoiceError> {
        let mut data = self.data.write().map_err(|e| {
            InvoiceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(product.code.clone(), product);
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
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ProductRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("products.json");
        let repo = ProductRepository::new(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_get_delete() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        repo.upsert(Product::new("WEB", "Web hosting", "szt.", dec!(23)))
            .unwrap();
        assert!(repo.exists("WEB").unwrap());
        assert_eq!(repo.get("WEB").unwrap().unwrap().name, "Web hosting");

        assert!(repo.delete("WEB").unwrap());
        assert!(!repo.delete("WEB").unwrap());
        assert!(repo.get("WEB").unwrap().is_none());
    }

    #[test]
    fn test_get_all_sorted_by_code() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Product::new("ZZZ", "Last", "szt.", dec!(23))).unwrap();
        repo.upsert(Product::new("AAA", "First", "szt.", dec!(23))).unwrap();

        let codes: Vec<_> = repo.get_all().unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["AAA", "ZZZ"]);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        repo.upsert(Product::new("WEB", "Web hosting", "szt.", dec!(23)))
            .unwrap();
        repo.save().unwrap();

        let repo2 = ProductRepository::new(temp_dir.path().join("products.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.count().unwrap(), 1);
        assert_eq!(repo2.get("WEB").unwrap().unwrap().vat, dec!(23));
    }
}
