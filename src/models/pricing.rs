//! Price, tax and gross derivation shared by catalog prices and invoice lines
//!
//! Only the net unit price is ever stored. Every other view is computed from
//! it on demand, so the views cannot drift apart. Setters that take a derived
//! value recompute the unit price and floor it to whole cents.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::fmt;

/// Largest quantity accepted on an invoice line
pub const MAX_AMOUNT: Decimal = dec!(1000000000);

/// Largest absolute net unit price
pub const MAX_PRICE: Decimal = dec!(1000000000000);

/// Largest VAT rate, in percent
pub const MAX_VAT: Decimal = dec!(1000);

/// Floor a value to two decimal places (towards negative infinity)
pub fn floor_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity)
}

/// A unit price that is out of range, or could not be derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOutOfRange(pub Decimal);

impl fmt::Display for PriceOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Price {} is out of range (net unit prices are limited to {})",
            self.0, MAX_PRICE
        )
    }
}

impl std::error::Error for PriceOutOfRange {}

/// Check a net unit price against [`MAX_PRICE`]
pub fn check_price(price: Decimal) -> Result<Decimal, PriceOutOfRange> {
    if price.abs() > MAX_PRICE {
        return Err(PriceOutOfRange(price));
    }
    Ok(price)
}

/// Something with a stored net unit price and a VAT rate
///
/// Implementors guarantee `0 <= vat() <= MAX_VAT`, `0 < amount() <= MAX_AMOUNT`
/// and a stored price within [`MAX_PRICE`], so the derived views cannot
/// overflow.
pub trait Priced {
    /// Net unit price
    fn price(&self) -> Decimal;

    /// VAT rate in percent
    fn vat(&self) -> Decimal;

    /// Quantity; catalog entries have none, which counts as one
    fn amount(&self) -> Decimal {
        Decimal::ONE
    }

    /// Replace the stored unit price
    fn store_price(&mut self, price: Decimal);

    fn vat_factor(&self) -> Decimal {
        Decimal::ONE + self.vat() / dec!(100)
    }

    /// Gross unit price
    fn bprice(&self) -> Decimal {
        self.price() * self.vat_factor()
    }

    /// Net line total
    fn netto(&self) -> Decimal {
        self.price() * self.amount()
    }

    fn tax(&self) -> Decimal {
        self.netto() * self.vat() / dec!(100)
    }

    /// Gross line total
    fn brutto(&self) -> Decimal {
        self.netto() + self.tax()
    }

    /// Store a net unit price as given, without rounding
    fn set_price(&mut self, price: Decimal) -> Result<(), PriceOutOfRange> {
        self.store_price(check_price(price)?);
        Ok(())
    }

    /// Derive the net unit price from a gross unit price
    fn set_bprice(&mut self, bprice: Decimal) -> Result<(), PriceOutOfRange> {
        let price = bprice
            .checked_div(self.vat_factor())
            .ok_or(PriceOutOfRange(bprice))?;
        self.set_price(floor_cents(price))
    }
}

/// A priced quantity whose line totals can be set directly
pub trait Quantified: Priced {
    /// Derive the net unit price from a net line total
    fn set_netto(&mut self, netto: Decimal) -> Result<(), PriceOutOfRange> {
        let price = netto
            .checked_div(self.amount())
            .ok_or(PriceOutOfRange(netto))?;
        self.set_price(floor_cents(price))
    }

    /// Derive the net unit price from a gross line total
    fn set_brutto(&mut self, brutto: Decimal) -> Result<(), PriceOutOfRange> {
        let price = brutto
            .checked_div(self.vat_factor())
            .and_then(|net| net.checked_div(self.amount()))
            .ok_or(PriceOutOfRange(brutto))?;
        self.set_price(floor_cents(price))
    }
}

/// One of the four ways a price can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceInput {
    /// Net unit price
    Price(Decimal),
    /// Gross unit price
    BPrice(Decimal),
    /// Net line total
    Netto(Decimal),
    /// Gross line total
    Brutto(Decimal),
}

impl PriceInput {
    /// Parse `kind=value` as used on the command line and in line specs
    pub fn parse_pair(kind: &str, value: &str) -> Option<Result<Self, String>> {
        let make: fn(Decimal) -> Self = match kind {
            "price" => Self::Price,
            "bprice" => Self::BPrice,
            "netto" => Self::Netto,
            "brutto" => Self::Brutto,
            _ => return None,
        };
        Some(
            value
                .trim()
                .parse::<Decimal>()
                .map(make)
                .map_err(|_| format!("Invalid {} value: {:?}", kind, value)),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Price(_) => "price",
            Self::BPrice(_) => "bprice",
            Self::Netto(_) => "netto",
            Self::Brutto(_) => "brutto",
        }
    }

    /// Whether this input only makes sense for a quantity (an invoice line)
    pub fn needs_quantity(&self) -> bool {
        matches!(self, Self::Netto(_) | Self::Brutto(_))
    }

    /// Apply to an invoice line
    pub fn apply<T: Quantified>(self, target: &mut T) -> Result<(), PriceOutOfRange> {
        match self {
            Self::Price(v) => target.set_price(v),
            Self::BPrice(v) => target.set_bprice(v),
            Self::Netto(v) => target.set_netto(v),
            Self::Brutto(v) => target.set_brutto(v),
        }
    }
}

impl fmt::Display for PriceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Price(v) | Self::BPrice(v) | Self::Netto(v) | Self::Brutto(v) => v,
        };
        write!(f, "{}={}", self.kind(), value)
    }
}
