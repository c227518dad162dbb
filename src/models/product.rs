//! Product catalog model
//!
//! A product carries a VAT rate and one net unit price per currency. Catalog
//! prices follow the same derivation rules as invoice lines with the amount
//! fixed at one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::currency::CurrencyCode;
use super::pricing::{PriceInput, PriceOutOfRange, Priced, MAX_VAT};

/// Longest product code accepted
pub const MAX_PRODUCT_CODE_LEN: usize = 8;

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Short unique code used on the command line
    pub code: String,

    /// Name printed on invoices
    pub name: String,

    /// Unit of measurement
    pub unit: String,

    /// VAT rate in percent
    pub vat: Decimal,

    /// Net unit price per currency
    #[serde(default)]
    pub prices: BTreeMap<CurrencyCode, Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A field change on a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductUpdate {
    Name(String),
    Unit(String),
    Vat(Decimal),
}

/// The price of a product in one currency, viewed as a priced quantity of one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPrice {
    pub price: Decimal,
    pub vat: Decimal,
}

impl Priced for CatalogPrice {
    fn price(&self) -> Decimal {
        self.price
    }

    fn vat(&self) -> Decimal {
        self.vat
    }

    fn store_price(&mut self, price: Decimal) {
        self.price = price;
    }
}

impl Product {
    /// Create a new product without any prices
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        vat: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            name: name.into(),
            unit: unit.into(),
            vat,
            prices: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The catalog price in a currency, if one is set
    pub fn price_in(&self, currency: &CurrencyCode) -> Option<CatalogPrice> {
        self.prices.get(currency).map(|&price| CatalogPrice {
            price,
            vat: self.vat,
        })
    }

    /// Set the price in a currency from a net or gross unit price
    ///
    /// Returns the stored net unit price.
    pub fn set_price(
        &mut self,
        currency: CurrencyCode,
        input: PriceInput,
    ) -> Result<Decimal, ProductValidationError> {
        let mut slot = CatalogPrice {
            price: Decimal::ZERO,
            vat: self.vat,
        };

        match input {
            PriceInput::Price(v) => slot.set_price(v)?,
            PriceInput::BPrice(v) => slot.set_bprice(v)?,
            PriceInput::Netto(_) | PriceInput::Brutto(_) => {
                return Err(ProductValidationError::LineTotalOnCatalog(input.kind()))
            }
        }

        self.prices.insert(currency, slot.price);
        self.updated_at = Utc::now();
        Ok(slot.price)
    }

    /// Apply a field update, validating the new value
    pub fn apply(&mut self, update: ProductUpdate) -> Result<(), ProductValidationError> {
        match update {
            ProductUpdate::Name(name) => {
                if name.trim().is_empty() {
                    return Err(ProductValidationError::EmptyName);
                }
                self.name = name;
            }
            ProductUpdate::Unit(unit) => {
                if unit.trim().is_empty() {
                    return Err(ProductValidationError::EmptyUnit);
                }
                self.unit = unit;
            }
            ProductUpdate::Vat(vat) => {
                check_vat(vat)?;
                self.vat = vat;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Validate the product
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        validate_code(&self.code)?;

        if self.name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }

        if self.unit.trim().is_empty() {
            return Err(ProductValidationError::EmptyUnit);
        }

        check_vat(self.vat)
    }
}

fn check_vat(vat: Decimal) -> Result<(), ProductValidationError> {
    if vat < Decimal::ZERO {
        return Err(ProductValidationError::NegativeVat(vat));
    }
    if vat > MAX_VAT {
        return Err(ProductValidationError::VatTooHigh(vat));
    }
    Ok(())
}

fn validate_code(code: &str) -> Result<(), ProductValidationError> {
    if code.is_empty() {
        return Err(ProductValidationError::EmptyCode);
    }
    if code.chars().count() > MAX_PRODUCT_CODE_LEN {
        return Err(ProductValidationError::CodeTooLong(code.to_string()));
    }
    if code.chars().any(|c| c.is_whitespace() || c == ',' || c == '=') {
        return Err(ProductValidationError::InvalidCode(code.to_string()));
    }
    Ok(())
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Validation errors for products
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyCode,
    CodeTooLong(String),
    InvalidCode(String),
    EmptyName,
    EmptyUnit,
    NegativeVat(Decimal),
    VatTooHigh(Decimal),
    PriceOutOfRange(Decimal),
    LineTotalOnCatalog(&'static str),
}

impl From<PriceOutOfRange> for ProductValidationError {
    fn from(err: PriceOutOfRange) -> Self {
        Self::PriceOutOfRange(err.0)
    }
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "Product code cannot be empty"),
            Self::CodeTooLong(code) => write!(
                f,
                "Product code {:?} is too long (max {} characters)",
                code, MAX_PRODUCT_CODE_LEN
            ),
            Self::InvalidCode(code) => write!(
                f,
                "Product code {:?} may not contain whitespace, ',' or '='",
                code
            ),
            Self::EmptyName => write!(f, "Product name cannot be empty"),
            Self::EmptyUnit => write!(f, "Product unit cannot be empty"),
            Self::NegativeVat(vat) => write!(f, "VAT rate cannot be negative: {}", vat),
            Self::VatTooHigh(vat) => {
                write!(f, "VAT rate {} is above the limit of {}", vat, MAX_VAT)
            }
            Self::PriceOutOfRange(price) => write!(f, "{}", PriceOutOfRange(*price)),
            Self::LineTotalOnCatalog(kind) => write!(
                f,
                "Catalog prices have no quantity; {} can only be set on invoice lines",
                kind
            ),
        }
    }
}

impl std::error::Error for ProductValidationError {}
