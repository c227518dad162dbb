//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest customer code accepted
pub const MAX_CUSTOMER_CODE_LEN: usize = 16;

/// An invoiced party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Short unique code used on the command line
    pub code: String,

    /// Short display name
    pub short: String,

    /// Full postal address, one line per address line
    pub address: String,

    #[serde(default)]
    pub email: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        code: impl Into<String>,
        short: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            short: short.into(),
            address: address.into(),
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Address lines, with surrounding blank lines dropped
    pub fn address_lines(&self) -> impl Iterator<Item = &str> {
        self.address
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.code.is_empty() {
            return Err(CustomerValidationError::EmptyCode);
        }

        if self.code.chars().count() > MAX_CUSTOMER_CODE_LEN {
            return Err(CustomerValidationError::CodeTooLong(self.code.clone()));
        }

        if self.code.chars().any(char::is_whitespace) {
            return Err(CustomerValidationError::InvalidCode(self.code.clone()));
        }

        if self.short.trim().is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }

        if self.address_lines().next().is_none() {
            return Err(CustomerValidationError::EmptyAddress);
        }

        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(CustomerValidationError::InvalidEmail(email.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short, self.code)
    }
}

/// Validation errors for customers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    EmptyCode,
    CodeTooLong(String),
    InvalidCode(String),
    EmptyName,
    EmptyAddress,
    InvalidEmail(String),
}

impl fmt::Display for CustomerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "Customer code cannot be empty"),
            Self::CodeTooLong(code) => write!(
                f,
                "Customer code {:?} is too long (max {} characters)",
                code, MAX_CUSTOMER_CODE_LEN
            ),
            Self::InvalidCode(code) => {
                write!(f, "Customer code {:?} may not contain whitespace", code)
            }
            Self::EmptyName => write!(f, "Customer name cannot be empty"),
            Self::EmptyAddress => write!(f, "Customer address cannot be empty"),
            Self::InvalidEmail(email) => write!(f, "Invalid e-mail address: {}", email),
        }
    }
}

impl std::error::Error for CustomerValidationError {}
