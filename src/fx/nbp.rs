//! NBP average exchange rates (table A)
//!
//! The bank publishes an index of table files (`dir.txt`) and one XML file
//! per table. Table A files are named `aNNNzYYMMDD`, where `NNN` is the
//! table's number in the year and `YYMMDD` its publication date.

use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{candidate_dates, ExchangeRate, RateSource};
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::CurrencyCode;

pub const NBP_BASE_URL: &str = "https://www.nbp.pl/kursy/xml";

/// Rate source backed by the published NBP tables
///
/// Every lookup downloads the index and one table; nothing is cached.
#[derive(Debug, Clone)]
pub struct NbpRateSource {
    client: reqwest::blocking::Client,
    base_url: String,
    lookback_days: u32,
}

impl NbpRateSource {
    pub fn new(lookback_days: u32) -> InvoiceResult<Self> {
        Self::with_base_url(NBP_BASE_URL, lookback_days)
    }

    pub fn with_base_url(base_url: impl Into<String>, lookback_days: u32) -> InvoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("invoice-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InvoiceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lookback_days,
        })
    }

    fn fetch(&self, url: &str) -> Result<String, String> {
        debug!(url, "fetching");
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.bytes())
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        // Files are ISO-8859-2; everything read from them is ASCII.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl RateSource for NbpRateSource {
    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> InvoiceResult<ExchangeRate> {
        let unavailable =
            |reason: String| InvoiceError::rate_unavailable(currency.as_str(), date, reason);

        let index = self
            .fetch(&format!("{}/dir.txt", self.base_url))
            .map_err(unavailable)?;

        let (table, effective) = find_table(&index, date, self.lookback_days).ok_or_else(|| {
            unavailable(format!("no table A published in the {} days before", self.lookback_days))
        })?;

        let xml = self
            .fetch(&format!("{}/{}.xml", self.base_url, table))
            .map_err(unavailable)?;

        let rate = parse_table(&xml, currency)
            .map_err(|reason| unavailable(format!("table {}: {}", table, reason)))?;

        info!(%currency, %date, %table, %rate, "exchange rate looked up");

        Ok(ExchangeRate {
            currency: currency.clone(),
            rate,
            effective,
            table,
        })
    }
}

/// Find the newest table A published in the `lookback` days before `date`
pub fn find_table(index: &str, date: NaiveDate, lookback: u32) -> Option<(String, NaiveDate)> {
    let tables: Vec<&str> = index
        .split_whitespace()
        .filter(|name| is_table_a(name))
        .collect();

    candidate_dates(date, lookback).find_map(|day| {
        let stamp = day.format("%y%m%d").to_string();
        tables
            .iter()
            .find(|name| name[5..] == stamp)
            .map(|name| (name.to_string(), day))
    })
}

fn is_table_a(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'a'
        && bytes[1..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'z'
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Extract the average rate of `currency` from a table XML document
///
/// The rate is returned per one unit of the currency; tables quote some
/// currencies per 100 units (`przelicznik`).
pub fn parse_table(xml: &str, currency: &CurrencyCode) -> Result<Decimal, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<String> = None;
    let mut code: Option<String> = None;
    let mut average: Option<String> = None;
    let mut multiplier: Option<String> = None;
    let mut matches: Vec<Decimal> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "pozycja" {
                    code = None;
                    average = None;
                    multiplier = None;
                }
                current = Some(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_deref() {
                    Some("kod_waluty") => code = Some(text),
                    Some("kurs_sredni") => average = Some(text),
                    Some("przelicznik") => multiplier = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"pozycja"
                    && code.as_deref().map(str::trim) == Some(currency.as_str())
                {
                    let rate = parse_polish_decimal(average.as_deref().unwrap_or(""))
                        .ok_or_else(|| format!("bad kurs_sredni for {}: {:?}", currency, average))?;
                    let per = match multiplier.as_deref() {
                        Some(m) => parse_polish_decimal(m)
                            .filter(|m| !m.is_zero())
                            .ok_or_else(|| format!("bad przelicznik for {}: {:?}", currency, m))?,
                        None => Decimal::ONE,
                    };
                    matches.push(rate / per);
                }
                current = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
    }

    match matches.as_slice() {
        [rate] => Ok(*rate),
        [] => Err(format!("currency {} not in table", currency)),
        _ => Err(format!("currency {} listed {} times", currency, matches.len())),
    }
}

fn parse_polish_decimal(text: &str) -> Option<Decimal> {
    text.trim().replace(',', ".").parse().ok()
}
