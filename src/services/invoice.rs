//! Invoice service
//!
//! Numbering, line pricing, field edits and the finalised lock. Creating an
//! invoice needs the session's [`NumberAllocator`]; everything else works on
//! stored invoices only.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{InvoiceError, InvoiceResult};
use crate::fx::{ExchangeRate, RateSource};
use crate::models::{
    CurrencyCode, Invoice, InvoiceLine, InvoiceNumber, InvoiceUpdate, LineSpec, Product,
};
use crate::storage::{NumberAllocator, Storage};

/// Everything needed to create an invoice
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    /// Explicit number; allocated from the sequence when absent
    pub number: Option<String>,
    pub currency: CurrencyCode,
    pub customer: String,
    pub issued: NaiveDate,
    pub delivered: NaiveDate,
    pub grace: u32,
    pub features: Vec<String>,
    pub lines: Vec<LineSpec>,
}

/// Totals of an invoice, with tax in the home currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub number: InvoiceNumber,
    pub currency: CurrencyCode,
    pub netto: Decimal,
    pub tax: Decimal,
    pub brutto: Decimal,
    pub home_currency: CurrencyCode,
    /// Rate used for conversion; `None` for home-currency invoices
    pub rate: Option<ExchangeRate>,
    pub tax_home: Decimal,
}

/// Service for invoice management
pub struct InvoiceService<'a> {
    storage: &'a Storage,
}

impl<'a> InvoiceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an invoice, numbering it through the allocator
    ///
    /// Stored data is reloaded first, since the allocator's lock may have
    /// been taken after it was read. The invoice is stored before the
    /// sequence state is saved. Nothing is stored or saved if any part of the
    /// draft is invalid.
    pub fn create(
        &self,
        allocator: &mut NumberAllocator,
        draft: InvoiceDraft,
    ) -> InvoiceResult<Invoice> {
        // Another session may have stored invoices while we waited for the lock
        self.storage.reload()?;

        if !self.storage.customers.exists(&draft.customer)? {
            return Err(InvoiceError::customer_not_found(&draft.customer));
        }

        let number = match &draft.number {
            Some(explicit) => InvoiceNumber::parse(explicit)?,
            None => allocator.peek_number(draft.issued)?,
        };

        if self.storage.invoices.exists(number)? {
            return Err(InvoiceError::Duplicate {
                entity_type: "Invoice",
                identifier: number.to_string(),
            });
        }

        let mut invoice = Invoice::new(
            number,
            draft.currency,
            draft.customer,
            draft.issued,
            draft.delivered,
            draft.grace,
        );

        for feature in draft.features {
            invoice
                .apply(InvoiceUpdate::AddFeature(feature))
                .map_err(|e| InvoiceError::Validation(e.to_string()))?;
        }

        for spec in &draft.lines {
            let product = self.require_product(&spec.product)?;
            let line = build_line(&product, &invoice.currency, spec)?;
            invoice.add_line(line);
        }

        match draft.number {
            // A non-consecutive number is logged by the allocator and kept as is
            Some(_) => {
                allocator.register(number)?;
            }
            None => {
                allocator.get_number(draft.issued)?;
            }
        }

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;
        allocator.save()?;

        info!(%number, lines = invoice.lines.len(), "invoice created");
        Ok(invoice)
    }

    pub fn get(&self, number: InvoiceNumber) -> InvoiceResult<Option<Invoice>> {
        self.storage.invoices.get(number)
    }

    /// Get an invoice, failing if it does not exist
    pub fn require(&self, number: InvoiceNumber) -> InvoiceResult<Invoice> {
        self.get(number)?
            .ok_or_else(|| InvoiceError::invoice_not_found(number.to_string()))
    }

    /// List invoices, optionally restricted to one year
    pub fn list(&self, year: Option<i32>) -> InvoiceResult<Vec<Invoice>> {
        match year {
            Some(year) => self.storage.invoices.get_by_year(year),
            None => self.storage.invoices.get_all(),
        }
    }

    /// Add a product line
    ///
    /// The line starts from the product's price in the invoice currency. A
    /// VAT override is applied first, then the price override, so gross
    /// inputs are divided by the overridden rate.
    pub fn add_line(&self, number: InvoiceNumber, spec: &LineSpec) -> InvoiceResult<Invoice> {
        let mut invoice = self.require_editable(number)?;
        let product = self.require_product(&spec.product)?;

        let line = build_line(&product, &invoice.currency, spec)?;
        invoice.add_line(line);

        self.store(&invoice)?;
        Ok(invoice)
    }

    /// Remove a line by its 1-based position
    pub fn remove_line(
        &self,
        number: InvoiceNumber,
        position: usize,
    ) -> InvoiceResult<InvoiceLine> {
        let mut invoice = self.require_editable(number)?;

        let line = invoice
            .remove_line(position)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.store(&invoice)?;
        Ok(line)
    }

    /// Change one field of an invoice
    pub fn update(&self, number: InvoiceNumber, update: InvoiceUpdate) -> InvoiceResult<Invoice> {
        let mut invoice = self.require_editable(number)?;

        if let InvoiceUpdate::Customer(code) = &update {
            if !self.storage.customers.exists(code)? {
                return Err(InvoiceError::customer_not_found(code));
            }
        }

        invoice
            .apply(update)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;

        self.store(&invoice)?;
        Ok(invoice)
    }

    /// Lock an invoice against edits
    pub fn finalise(&self, number: InvoiceNumber) -> InvoiceResult<Invoice> {
        let mut invoice = self.require(number)?;

        if invoice.lines.is_empty() {
            return Err(InvoiceError::Validation(format!(
                "Invoice {} has no lines",
                number
            )));
        }

        invoice.finalised = true;
        self.store(&invoice)?;
        info!(%number, "invoice finalised");
        Ok(invoice)
    }

    pub fn unfinalise(&self, number: InvoiceNumber) -> InvoiceResult<Invoice> {
        let mut invoice = self.require(number)?;
        invoice.finalised = false;
        self.store(&invoice)?;
        info!(%number, "invoice unfinalised");
        Ok(invoice)
    }

    /// Delete a draft invoice; its number is not returned to the sequence
    pub fn delete(&self, number: InvoiceNumber) -> InvoiceResult<Invoice> {
        let invoice = self.require_editable(number)?;

        self.storage.invoices.delete(number)?;
        self.storage.invoices.save()?;

        info!(%number, "invoice deleted");
        Ok(invoice)
    }

    /// Totals, with the tax converted to the home currency
    pub fn summary(
        &self,
        number: InvoiceNumber,
        source: &dyn RateSource,
        home: &CurrencyCode,
    ) -> InvoiceResult<InvoiceSummary> {
        let invoice = self.require(number)?;
        summarize(&invoice, source, home)
    }

    fn require_editable(&self, number: InvoiceNumber) -> InvoiceResult<Invoice> {
        let invoice = self.require(number)?;
        invoice.ensure_editable()?;
        Ok(invoice)
    }

    fn require_product(&self, code: &str) -> InvoiceResult<Product> {
        self.storage
            .products
            .get(code)?
            .ok_or_else(|| InvoiceError::product_not_found(code))
    }

    fn store(&self, invoice: &Invoice) -> InvoiceResult<()> {
        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()
    }
}

/// Summarize an already loaded invoice
pub fn summarize(
    invoice: &Invoice,
    source: &dyn RateSource,
    home: &CurrencyCode,
) -> InvoiceResult<InvoiceSummary> {
    let tax_home = invoice.tax_home(source, home)?;
    let rate = invoice.exchange_rate(source, home)?.cloned();

    Ok(InvoiceSummary {
        number: invoice.number,
        currency: invoice.currency.clone(),
        netto: invoice.netto(),
        tax: invoice.tax(),
        brutto: invoice.brutto(),
        home_currency: home.clone(),
        rate,
        tax_home,
    })
}

/// Price a line spec against a product in the invoice currency
fn build_line(
    product: &Product,
    currency: &CurrencyCode,
    spec: &LineSpec,
) -> InvoiceResult<InvoiceLine> {
    let catalog = product.prices.get(currency).copied();

    let base = match (catalog, spec.price) {
        (Some(price), _) => price,
        (None, Some(_)) => Decimal::ZERO,
        (None, None) => {
            return Err(InvoiceError::Validation(format!(
                "Product {} has no {} price; give one of price=, bprice=, netto= or brutto=",
                product.code, currency
            )))
        }
    };

    let mut line = InvoiceLine::from_product(product, spec.amount, base)
        .map_err(|e| InvoiceError::Validation(e.to_string()))?;

    if let Some(vat) = spec.vat {
        line.set_vat(vat)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;
    }

    if let Some(input) = spec.price {
        input
            .apply(&mut line)
            .map_err(|e| InvoiceError::Validation(e.to_string()))?;
    }

    Ok(line)
}
