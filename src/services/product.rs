//! Product service
//!
//! Catalog management: creation, field updates and per-currency prices.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{CurrencyCode, PriceInput, Product, ProductUpdate};
use crate::storage::Storage;

/// Service for product management
pub struct ProductService<'a> {
    storage: &'a Storage,
}

impl<'a> ProductService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new product without prices
    pub fn create(
        &self,
        code: &str,
        name: &str,
        unit: &str,
        vat: Decimal,
    ) -> InvoiceResult<Product> {
        let code = code.trim();

        if self.storage.products.exists(code)? {
            return Err(InvoiceError::Duplicate {
                entity_type: "Product",
                identifier: code.to_string(),
            });
        }

        let product = Product::new(code, name.trim(), unit.trim(), vat);

        product
            .validate()
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.storage.products.upsert(product.clone())?;
        self.storage.products.save()?;

        info!(code = %product.code, "product created");
        Ok(product)
    }

    pub fn get(&self, code: &str) -> InvoiceResult<Option<Product>> {
        self.storage.products.get(code)
    }

    /// Get a product, failing if it does not exist
    pub fn require(&self, code: &str) -> InvoiceResult<Product> {
        self.get(code)?
            .ok_or_else(|| InvoiceError::product_not_found(code))
    }

    pub fn list(&self) -> InvoiceResult<Vec<Product>> {
        self.storage.products.get_all()
    }

    /// Change the name, unit or VAT rate of a product
    ///
    /// Existing invoice lines keep the values they were created with.
    pub fn update(&self, code: &str, update: ProductUpdate) -> InvoiceResult<Product> {
        let mut product = self.require(code)?;

        product
            .apply(update)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.storage.products.upsert(product.clone())?;
        self.storage.products.save()?;

        Ok(product)
    }

    /// Set the price in a currency from a net (`price`) or gross (`bprice`) unit price
    pub fn set_price(
        &self,
        code: &str,
        currency: CurrencyCode,
        input: PriceInput,
    ) -> InvoiceResult<Product> {
        let mut product = self.require(code)?;

        let stored = product
            .set_price(currency.clone(), input)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.storage.products.upsert(product.clone())?;
        self.storage.products.save()?;

        info!(code, %currency, %input, price = %stored, "product price set");
        Ok(product)
    }

    /// Delete a product that no invoice line was created from
    pub fn delete(&self, code: &str) -> InvoiceResult<Product> {
        let product = self.require(code)?;

        if self.storage.invoices.references_product(code)? {
            return Err(InvoiceError::Validation(format!(
                "Product {} is used on invoices and cannot be deleted",
                code
            )));
        }

        self.storage.products.delete(code)?;
        self.storage.products.save()?;

        info!(code, "product deleted");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::InvoicePaths;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn pln() -> CurrencyCode {
        CurrencyCode::home()
    }

    #[test]
    fn test_create_and_list() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);

        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();
        service.create("CONS", "Consulting", "h", dec!(23)).unwrap();

        let codes: Vec<_> = service.list().unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["CONS", "WEB"]);
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_codes() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);

        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();
        assert!(matches!(
            service.create("WEB", "Again", "szt.", dec!(23)),
            Err(InvoiceError::Duplicate { .. })
        ));
        assert!(service
            .create("MUCHTOOLONG", "Long", "szt.", dec!(23))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_set_price_persists() {
        let (temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);
        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();

        service
            .set_price("WEB", pln(), PriceInput::BPrice(dec!(12.31)))
            .unwrap();

        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        let product = reloaded.products.get("WEB").unwrap().unwrap();
        assert_eq!(product.prices.get(&pln()), Some(&dec!(10.00)));
    }

    #[test]
    fn test_set_price_rejects_line_totals() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);
        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();

        let err = service
            .set_price("WEB", pln(), PriceInput::Brutto(dec!(10)))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);
        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();

        let product = service.update("WEB", ProductUpdate::Vat(dec!(8))).unwrap();
        assert_eq!(product.vat, dec!(8));

        assert!(service
            .update("NOPE", ProductUpdate::Vat(dec!(8)))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProductService::new(&storage);
        service.create("WEB", "Web hosting", "szt.", dec!(23)).unwrap();

        service.delete("WEB").unwrap();
        assert!(service.get("WEB").unwrap().is_none());
    }
}
