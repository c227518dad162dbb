//! Invoice numbers of the form `YEAR/SEQ`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvoiceError;

/// An invoice number: fiscal year plus the sequence number within that year
///
/// Displayed as `"{year}/{seq:02}"`; the width is a minimum, so `2024/123`
/// is valid and printed as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    pub year: i32,
    pub seq: u32,
}

impl InvoiceNumber {
    pub fn new(year: i32, seq: u32) -> Self {
        Self { year, seq }
    }

    /// Parse `YEAR/SEQ`; both parts must be plain integers
    pub fn parse(s: &str) -> Result<Self, InvoiceError> {
        let malformed = || InvoiceError::MalformedNumber(s.to_string());

        let mut parts = s.trim().split('/');
        let (year, seq) = match (parts.next(), parts.next(), parts.next()) {
            (Some(year), Some(seq), None) => (year, seq),
            _ => return Err(malformed()),
        };

        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let seq = seq.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { year, seq })
    }

    /// File-name friendly form, `2024_07`
    pub fn slug(&self) -> String {
        self.to_string().replace('/', "_")
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.seq)
    }
}

impl FromStr for InvoiceNumber {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = InvoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.to_string()
    }
}
