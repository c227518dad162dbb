//! Exchange rate sources
//!
//! Invoices in a foreign currency report their tax in the home currency using
//! the average rate published on the last business day before delivery. The
//! rate comes from a [`RateSource`]: the published NBP tables, or a local
//! fixed table for offline work and tests.

pub mod fixed;
pub mod nbp;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{InvoicePaths, RateSourceKind, Settings};
use crate::error::InvoiceResult;
use crate::models::CurrencyCode;

pub use fixed::FixedRates;
pub use nbp::NbpRateSource;

/// A looked-up exchange rate: home currency units per one unit of `currency`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency: CurrencyCode,
    pub rate: Decimal,
    /// Date of the table the rate was taken from
    pub effective: NaiveDate,
    /// Identifier of the table, e.g. `a001z240102`
    pub table: String,
}

/// Something that can price a foreign currency on a date
pub trait RateSource {
    /// Rate applicable to a transaction on `date`
    ///
    /// Only tables published strictly before `date` qualify.
    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> InvoiceResult<ExchangeRate>;
}

impl<T: RateSource + ?Sized> RateSource for Box<T> {
    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> InvoiceResult<ExchangeRate> {
        (**self).rate(currency, date)
    }
}

/// Dates to try for a transaction on `date`: the day before, then further
/// back, `lookback` days in total
pub fn candidate_dates(date: NaiveDate, lookback: u32) -> impl Iterator<Item = NaiveDate> {
    (1..=u64::from(lookback)).filter_map(move |back| date.checked_sub_days(Days::new(back)))
}

/// Build the rate source selected by settings (or forced offline)
pub fn source_from_settings(
    settings: &Settings,
    paths: &InvoicePaths,
    force_offline: bool,
) -> InvoiceResult<Box<dyn RateSource>> {
    let kind = if force_offline {
        RateSourceKind::Offline
    } else {
        settings.rate_source
    };

    match kind {
        RateSourceKind::Nbp => Ok(Box::new(NbpRateSource::new(settings.rate_lookback_days)?)),
        RateSourceKind::Offline => Ok(Box::new(FixedRates::load(
            &paths.rates_file(),
            settings.rate_lookback_days,
        )?)),
    }
}
