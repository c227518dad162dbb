//! Offline exchange rate table
//!
//! `rates.json` maps currency → date → rate:
//!
//! ```json
//! { "EUR": { "2024-01-02": "4.3480", "2024-01-03": "4.3623" } }
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::{candidate_dates, ExchangeRate, RateSource};
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::CurrencyCode;
use crate::storage::file_io::read_json;

type Series = BTreeMap<NaiveDate, Decimal>;

/// Rates kept in memory, with the same look-back rule as the published tables
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: BTreeMap<CurrencyCode, Series>,
    lookback_days: u32,
}

impl FixedRates {
    pub fn new(lookback_days: u32) -> Self {
        Self {
            rates: BTreeMap::new(),
            lookback_days,
        }
    }

    /// Load the table from disk; a missing file is an empty table
    pub fn load(path: &Path, lookback_days: u32) -> InvoiceResult<Self> {
        let rates: BTreeMap<CurrencyCode, Series> = read_json(path)?;
        debug!(path = %path.display(), currencies = rates.len(), "loaded offline rate table");
        Ok(Self {
            rates,
            lookback_days,
        })
    }

    /// Add or replace the rate of a currency on a date
    pub fn insert(&mut self, currency: CurrencyCode, date: NaiveDate, rate: Decimal) {
        self.rates.entry(currency).or_default().insert(date, rate);
    }

    pub fn with_rate(mut self, currency: CurrencyCode, date: NaiveDate, rate: Decimal) -> Self {
        self.insert(currency, date, rate);
        self
    }
}

impl RateSource for FixedRates {
    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> InvoiceResult<ExchangeRate> {
        let series = self.rates.get(currency).ok_or_else(|| {
            InvoiceError::rate_unavailable(currency.as_str(), date, "currency not in rate table")
        })?;

        candidate_dates(date, self.lookback_days)
            .find_map(|day| {
                series.get(&day).map(|&rate| ExchangeRate {
                    currency: currency.clone(),
                    rate,
                    effective: day,
                    table: "offline".to_string(),
                })
            })
            .ok_or_else(|| {
                InvoiceError::rate_unavailable(
                    currency.as_str(),
                    date,
                    format!("no rate in the {} days before", self.lookback_days),
                )
            })
    }
}
