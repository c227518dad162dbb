//! Compact line specifications
//!
//! `<code>,<amount>[,{price|bprice|netto|brutto}=<x>][,vat=<x>]`, for example
//! `WEB,3`, `WEB,3,brutto=369` or `CONS,1.5,price=200,vat=8`.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::pricing::PriceInput;
use crate::error::InvoiceError;

/// A request to add a product to an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    pub product: String,
    pub amount: Decimal,
    /// Overrides the catalog price
    pub price: Option<PriceInput>,
    /// Overrides the product's VAT rate
    pub vat: Option<Decimal>,
}

impl LineSpec {
    pub fn new(product: impl Into<String>, amount: Decimal) -> Self {
        Self {
            product: product.into(),
            amount,
            price: None,
            vat: None,
        }
    }

    pub fn with_price(mut self, price: PriceInput) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_vat(mut self, vat: Decimal) -> Self {
        self.vat = Some(vat);
        self
    }

    pub fn parse(spec: &str) -> Result<Self, InvoiceError> {
        let invalid = |reason: String| {
            InvoiceError::Validation(format!("Invalid line spec {:?}: {}", spec, reason))
        };

        let mut tokens = spec.trim().split(',').map(str::trim);

        let product = match tokens.next() {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => return Err(invalid("missing product code".into())),
        };

        let amount = tokens
            .next()
            .ok_or_else(|| invalid("missing amount".into()))?;
        let amount = amount
            .parse::<Decimal>()
            .map_err(|_| invalid(format!("amount {:?} is not a number", amount)))?;

        let mut line = Self::new(product, amount);

        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected key=value, got {:?}", token)))?;
            let key = key.trim();

            if key == "vat" {
                if line.vat.is_some() {
                    return Err(invalid("vat given twice".into()));
                }
                let vat = value
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| invalid(format!("vat {:?} is not a number", value)))?;
                line.vat = Some(vat);
                continue;
            }

            let price = PriceInput::parse_pair(key, value)
                .ok_or_else(|| invalid(format!("unknown key {:?}", key)))?
                .map_err(invalid)?;

            if let Some(previous) = line.price {
                return Err(invalid(format!(
                    "{} and {} are mutually exclusive",
                    previous.kind(),
                    price.kind()
                )));
            }
            line.price = Some(price);
        }

        Ok(line)
    }
}

impl FromStr for LineSpec {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.product, self.amount)?;
        if let Some(price) = &self.price {
            write!(f, ",{}", price)?;
        }
        if let Some(vat) = &self.vat {
            write!(f, ",vat={}", vat)?;
        }
        Ok(())
    }
}
