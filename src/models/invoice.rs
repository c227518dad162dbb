//! Invoice and invoice line models
//!
//! Lines snapshot the product's name, unit and VAT at the time they are
//! added, so later catalog edits do not rewrite issued invoices.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use once_cell::unsync::OnceCell;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::currency::CurrencyCode;
use super::number::InvoiceNumber;
use super::pricing::{check_price, PriceOutOfRange, Priced, Quantified, MAX_AMOUNT, MAX_VAT};
use super::product::Product;
use crate::error::{InvoiceError, InvoiceResult};
use crate::fx::{ExchangeRate, RateSource};

/// Features that change how an invoice is presented
pub const KNOWN_FEATURES: &[(&str, &str)] = &[("28b", "Odwrotne obciążenie")];

/// One priced line of an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Code of the product this line was created from
    pub product: String,
    pub name: String,
    pub unit: String,
    amount: Decimal,
    vat: Decimal,
    price: Decimal,
}

impl InvoiceLine {
    pub fn new(
        product: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        amount: Decimal,
        vat: Decimal,
        price: Decimal,
    ) -> Result<Self, InvoiceValidationError> {
        check_amount(amount)?;
        check_vat(vat)?;
        let price = check_price(price)?;
        Ok(Self {
            product: product.into(),
            name: name.into(),
            unit: unit.into(),
            amount,
            vat,
            price,
        })
    }

    /// A line for `amount` of a product at the given net unit price
    pub fn from_product(
        product: &Product,
        amount: Decimal,
        price: Decimal,
    ) -> Result<Self, InvoiceValidationError> {
        Self::new(
            product.code.clone(),
            product.name.clone(),
            product.unit.clone(),
            amount,
            product.vat,
            price,
        )
    }

    /// Change the VAT rate; the net unit price is kept
    pub fn set_vat(&mut self, vat: Decimal) -> Result<(), InvoiceValidationError> {
        check_vat(vat)?;
        self.vat = vat;
        Ok(())
    }
}

fn check_amount(amount: Decimal) -> Result<(), InvoiceValidationError> {
    if amount <= Decimal::ZERO {
        return Err(InvoiceValidationError::NonPositiveAmount(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(InvoiceValidationError::AmountTooLarge(amount));
    }
    Ok(())
}

fn check_vat(vat: Decimal) -> Result<(), InvoiceValidationError> {
    if vat < Decimal::ZERO {
        return Err(InvoiceValidationError::NegativeVat(vat));
    }
    if vat > MAX_VAT {
        return Err(InvoiceValidationError::VatTooHigh(vat));
    }
    Ok(())
}

impl Priced for InvoiceLine {
    fn price(&self) -> Decimal {
        self.price
    }

    fn vat(&self) -> Decimal {
        self.vat
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn store_price(&mut self, price: Decimal) {
        self.price = price;
    }
}

impl Quantified for InvoiceLine {}

/// An invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub number: InvoiceNumber,
    pub currency: CurrencyCode,

    /// Code of the invoiced customer
    pub customer: String,

    /// Date of issue
    pub issued: NaiveDate,

    /// Date of delivery; exchange rates are taken for this date
    pub delivered: NaiveDate,

    /// Payment term in days from issue
    pub grace: u32,

    #[serde(default)]
    pub finalised: bool,

    /// Normalised feature codes, e.g. `28b`
    #[serde(default)]
    pub features: BTreeSet<String>,

    #[serde(default)]
    pub lines: Vec<InvoiceLine>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Exchange rate, looked up once per loaded invoice
    #[serde(skip)]
    rate: OnceCell<ExchangeRate>,
}

/// A field change on an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceUpdate {
    Currency(CurrencyCode),
    Customer(String),
    /// Set the payment term so that it ends on this date
    Deadline(NaiveDate),
    Delivered(NaiveDate),
    Grace(u32),
    Issued(NaiveDate),
    AddFeature(String),
    RemoveFeature(String),
}

impl Invoice {
    pub fn new(
        number: InvoiceNumber,
        currency: CurrencyCode,
        customer: impl Into<String>,
        issued: NaiveDate,
        delivered: NaiveDate,
        grace: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            number,
            currency,
            customer: customer.into(),
            issued,
            delivered,
            grace,
            finalised: false,
            features: BTreeSet::new(),
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
            rate: OnceCell::new(),
        }
    }

    /// Payment deadline
    pub fn deadline(&self) -> NaiveDate {
        self.issued
            .checked_add_days(Days::new(u64::from(self.grace)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn netto(&self) -> Decimal {
        self.lines.iter().map(Priced::netto).sum()
    }

    pub fn tax(&self) -> Decimal {
        self.lines.iter().map(Priced::tax).sum()
    }

    pub fn brutto(&self) -> Decimal {
        self.lines.iter().map(Priced::brutto).sum()
    }

    /// File name stem for rendered documents, e.g. `INV_2024_07`
    pub fn stem(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.number.slug())
    }

    pub fn is_foreign(&self, home: &CurrencyCode) -> bool {
        self.currency != *home
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&normalize_feature(feature))
    }

    /// Exchange rate for the delivery date, or `None` in the home currency
    ///
    /// The first successful lookup is kept for the lifetime of this value.
    pub fn exchange_rate(
        &self,
        source: &dyn RateSource,
        home: &CurrencyCode,
    ) -> InvoiceResult<Option<&ExchangeRate>> {
        if !self.is_foreign(home) {
            return Ok(None);
        }
        self.rate
            .get_or_try_init(|| source.rate(&self.currency, self.delivered))
            .map(Some)
    }

    /// Tax converted to the home currency
    pub fn tax_home(&self, source: &dyn RateSource, home: &CurrencyCode) -> InvoiceResult<Decimal> {
        match self.exchange_rate(source, home)? {
            Some(rate) => self.tax().checked_mul(rate.rate).ok_or_else(|| {
                InvoiceError::Validation(format!(
                    "Tax of invoice {} at rate {} is too large",
                    self.number, rate.rate
                ))
            }),
            None => Ok(self.tax()),
        }
    }

    /// Fail if the invoice may not be edited
    pub fn ensure_editable(&self) -> InvoiceResult<()> {
        if self.finalised {
            return Err(InvoiceError::Finalised(self.number.to_string()));
        }
        Ok(())
    }

    pub fn add_line(&mut self, line: InvoiceLine) {
        self.lines.push(line);
        self.touch();
    }

    /// Remove a line by its 1-based position
    pub fn remove_line(&mut self, position: usize) -> Result<InvoiceLine, InvoiceValidationError> {
        if position == 0 || position > self.lines.len() {
            return Err(InvoiceValidationError::NoSuchLine {
                position,
                count: self.lines.len(),
            });
        }
        let line = self.lines.remove(position - 1);
        self.touch();
        Ok(line)
    }

    /// Apply a field update, validating the new value
    pub fn apply(&mut self, update: InvoiceUpdate) -> Result<(), InvoiceValidationError> {
        match update {
            InvoiceUpdate::Currency(currency) => self.currency = currency,
            InvoiceUpdate::Customer(customer) => {
                if customer.trim().is_empty() {
                    return Err(InvoiceValidationError::EmptyCustomer);
                }
                self.customer = customer;
            }
            InvoiceUpdate::Deadline(deadline) => {
                let days = (deadline - self.issued).num_days();
                self.grace = u32::try_from(days)
                    .map_err(|_| InvoiceValidationError::DeadlineBeforeIssue {
                        deadline,
                        issued: self.issued,
                    })?;
            }
            InvoiceUpdate::Delivered(date) => self.delivered = date,
            InvoiceUpdate::Grace(days) => self.grace = days,
            InvoiceUpdate::Issued(date) => self.issued = date,
            InvoiceUpdate::AddFeature(feature) => {
                let feature = normalize_feature(&feature);
                if feature.is_empty() {
                    return Err(InvoiceValidationError::EmptyFeature);
                }
                self.features.insert(feature);
            }
            InvoiceUpdate::RemoveFeature(feature) => {
                self.features.remove(&normalize_feature(&feature));
            }
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Feature codes are compared case-insensitively, with `_` and `-` equal
pub fn normalize_feature(feature: &str) -> String {
    feature.trim().to_lowercase().replace('_', "-")
}

/// Description of a known feature code
pub fn feature_description(feature: &str) -> Option<&'static str> {
    let feature = normalize_feature(feature);
    KNOWN_FEATURES
        .iter()
        .find(|(code, _)| *code == feature)
        .map(|(_, description)| *description)
}

/// Last day of the month containing `date`; the default issue and delivery date
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

impl fmt::Display for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.number, self.customer, self.currency)
    }
}

/// Validation errors for invoices and their lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceValidationError {
    NonPositiveAmount(Decimal),
    AmountTooLarge(Decimal),
    NegativeVat(Decimal),
    VatTooHigh(Decimal),
    PriceOutOfRange(Decimal),
    EmptyCustomer,
    EmptyFeature,
    DeadlineBeforeIssue { deadline: NaiveDate, issued: NaiveDate },
    NoSuchLine { position: usize, count: usize },
}

impl fmt::Display for InvoiceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero, got {}", amount)
            }
            Self::AmountTooLarge(amount) => {
                write!(f, "Amount {} is above the limit of {}", amount, MAX_AMOUNT)
            }
            Self::NegativeVat(vat) => write!(f, "VAT rate cannot be negative: {}", vat),
            Self::VatTooHigh(vat) => {
                write!(f, "VAT rate {} is above the limit of {}", vat, MAX_VAT)
            }
            Self::PriceOutOfRange(price) => write!(f, "{}", PriceOutOfRange(*price)),
            Self::EmptyCustomer => write!(f, "Customer cannot be empty"),
            Self::EmptyFeature => write!(f, "Feature code cannot be empty"),
            Self::DeadlineBeforeIssue { deadline, issued } => write!(
                f,
                "Deadline {} is before the issue date {}",
                deadline, issued
            ),
            Self::NoSuchLine { position, count } => {
                write!(f, "No line {} (invoice has {} lines)", position, count)
            }
        }
    }
}

impl std::error::Error for InvoiceValidationError {}

impl From<PriceOutOfRange> for InvoiceValidationError {
    fn from(err: PriceOutOfRange) -> Self {
        Self::PriceOutOfRange(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::FixedRates;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn invoice(currency: &str) -> Invoice {
        Invoice::new(
            InvoiceNumber::new(2024, 3),
            code(currency),
            "ACME",
            date(2024, 1, 31),
            date(2024, 1, 31),
            15,
        )
    }

    fn line(amount: Decimal, price: Decimal) -> InvoiceLine {
        InvoiceLine::new("WEB", "Web hosting", "szt.", amount, dec!(23), price).unwrap()
    }

    struct CountingSource {
        inner: FixedRates,
        calls: Cell<u32>,
    }

    impl RateSource for CountingSource {
        fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> InvoiceResult<ExchangeRate> {
            self.calls.set(self.calls.get() + 1);
            self.inner.rate(currency, date)
        }
    }

    #[test]
    fn test_line_bounds() {
        assert_eq!(
            InvoiceLine::new("WEB", "Web", "szt.", Decimal::MAX, dec!(23), dec!(10)),
            Err(InvoiceValidationError::AmountTooLarge(Decimal::MAX))
        );
        assert_eq!(
            InvoiceLine::new("WEB", "Web", "szt.", dec!(1), dec!(23), Decimal::MAX),
            Err(InvoiceValidationError::PriceOutOfRange(Decimal::MAX))
        );
        assert_eq!(
            InvoiceLine::new("WEB", "Web", "szt.", dec!(1), dec!(1000.5), dec!(10)),
            Err(InvoiceValidationError::VatTooHigh(dec!(1000.5)))
        );

        let mut l = line(dec!(1), dec!(10));
        assert!(l.set_vat(dec!(5000)).is_err());
        assert_eq!(l.vat(), dec!(23));
    }

    #[test]
    fn test_tax_home_overflow_is_an_error() {
        let mut invoice = invoice("EUR");
        invoice.add_line(line(dec!(1000000000), dec!(1000000000000)));
        let rates = FixedRates::new(14).with_rate(code("EUR"), date(2024, 1, 30), Decimal::MAX);

        assert!(invoice
            .tax_home(&rates, &CurrencyCode::home())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_line_validation() {
        assert_eq!(
            InvoiceLine::new("WEB", "Web", "szt.", Decimal::ZERO, dec!(23), dec!(1)),
            Err(InvoiceValidationError::NonPositiveAmount(Decimal::ZERO))
        );
        assert!(InvoiceLine::new("WEB", "Web", "szt.", dec!(1), dec!(-1), dec!(1)).is_err());

        let mut l = line(dec!(1), dec!(10));
        assert!(l.set_vat(dec!(-8)).is_err());
        l.set_vat(dec!(8)).unwrap();
        assert_eq!(l.vat(), dec!(8));
        assert_eq!(l.price(), dec!(10));
    }

    #[test]
    fn test_totals() {
        let mut inv = invoice("PLN");
        inv.add_line(line(dec!(3), dec!(10.00)));
        inv.add_line(line(dec!(1), dec!(100)));

        assert_eq!(inv.netto(), dec!(130.00));
        assert_eq!(inv.tax(), dec!(29.90));
        assert_eq!(inv.brutto(), dec!(159.90));
    }

    #[test]
    fn test_deadline_and_stem() {
        let inv = invoice("PLN");
        assert_eq!(inv.deadline(), date(2024, 2, 15));
        assert_eq!(inv.stem("INV"), "INV_2024_03");
    }

    #[test]
    fn test_set_deadline() {
        let mut inv = invoice("PLN");
        inv.apply(InvoiceUpdate::Deadline(date(2024, 3, 1))).unwrap();
        assert_eq!(inv.grace, 30);
        assert_eq!(inv.deadline(), date(2024, 3, 1));

        let err = inv
            .apply(InvoiceUpdate::Deadline(date(2024, 1, 30)))
            .unwrap_err();
        assert!(matches!(err, InvoiceValidationError::DeadlineBeforeIssue { .. }));
        assert_eq!(inv.grace, 30);
    }

    #[test]
    fn test_remove_line_is_one_based() {
        let mut inv = invoice("PLN");
        inv.add_line(line(dec!(1), dec!(1)));
        inv.add_line(line(dec!(2), dec!(2)));

        assert!(inv.remove_line(0).is_err());
        assert!(inv.remove_line(3).is_err());

        let removed = inv.remove_line(1).unwrap();
        assert_eq!(removed.amount(), dec!(1));
        assert_eq!(inv.lines.len(), 1);
    }

    #[test]
    fn test_features_are_normalised() {
        let mut inv = invoice("PLN");
        inv.apply(InvoiceUpdate::AddFeature("28B".into())).unwrap();
        assert!(inv.has_feature("28b"));
        assert_eq!(feature_description("28B"), Some("Odwrotne obciążenie"));

        inv.apply(InvoiceUpdate::AddFeature("split_payment".into())).unwrap();
        assert!(inv.has_feature("Split-Payment"));

        inv.apply(InvoiceUpdate::RemoveFeature("28b".into())).unwrap();
        assert!(!inv.has_feature("28b"));
    }

    #[test]
    fn test_finalised_is_not_editable() {
        let mut inv = invoice("PLN");
        assert!(inv.ensure_editable().is_ok());
        inv.finalised = true;
        assert!(matches!(
            inv.ensure_editable(),
            Err(InvoiceError::Finalised(n)) if n == "2024/03"
        ));
    }

    #[test]
    fn test_home_currency_needs_no_lookup() {
        let source = CountingSource {
            inner: FixedRates::new(14),
            calls: Cell::new(0),
        };
        let mut inv = invoice("PLN");
        inv.add_line(line(dec!(1), dec!(100)));

        assert_eq!(inv.tax_home(&source, &code("PLN")).unwrap(), dec!(23));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_rate_is_memoised() {
        let source = CountingSource {
            inner: FixedRates::new(14).with_rate(code("EUR"), date(2024, 1, 30), dec!(4.5)),
            calls: Cell::new(0),
        };
        let mut inv = invoice("EUR");
        inv.add_line(line(dec!(1), dec!(100)));

        assert_eq!(inv.tax_home(&source, &code("PLN")).unwrap(), dec!(103.5));
        assert_eq!(inv.tax_home(&source, &code("PLN")).unwrap(), dec!(103.5));
        let rate = inv.exchange_rate(&source, &code("PLN")).unwrap().unwrap();
        assert_eq!(rate.effective, date(2024, 1, 30));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_failed_lookup_propagates() {
        let source = FixedRates::new(14);
        let inv = invoice("EUR");
        assert!(matches!(
            inv.tax_home(&source, &code("PLN")),
            Err(InvoiceError::RateUnavailable { .. })
        ));
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2023, 12, 1)), date(2023, 12, 31));
        assert_eq!(last_day_of_month(date(2024, 4, 30)), date(2024, 4, 30));
    }

    #[test]
    fn test_serialization_skips_rate() {
        let mut inv = invoice("EUR");
        inv.add_line(line(dec!(2), dec!(5)));

        let json = serde_json::to_string(&inv).unwrap();
        assert!(!json.contains("rate"));
        let back: Invoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.number, inv.number);
        assert_eq!(back.lines, inv.lines);
    }
}
