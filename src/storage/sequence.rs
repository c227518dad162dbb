//! Per-year invoice number sequence
//!
//! The state file is a JSON object mapping each fiscal year to the last
//! sequence number issued in it, e.g. `{"2023": 41, "2024": 7}`. It is held
//! under an exclusive advisory lock for as long as the allocator lives, so
//! only one session at a time can hand out numbers.
//!
//! Allocations change the in-memory counters only. Nothing reaches the disk
//! until [`NumberAllocator::save`], which rewrites the whole file.

use chrono::{Datelike, NaiveDate};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{InvoiceError, InvoiceResult};
use crate::models::InvoiceNumber;

/// Which fiscal year to allocate in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiscalYear {
    Year(i32),
    Date(NaiveDate),
}

impl FiscalYear {
    pub fn year(self) -> i32 {
        match self {
            Self::Year(year) => year,
            Self::Date(date) => date.year(),
        }
    }
}

impl From<i32> for FiscalYear {
    fn from(year: i32) -> Self {
        Self::Year(year)
    }
}

impl From<NaiveDate> for FiscalYear {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// Outcome of registering an externally chosen number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The number was the next in sequence; the counter moved to it
    Advanced,
    /// The number was not the successor; the counter is unchanged
    NonConsecutive { expected: u32 },
}

/// Sequence state held under an exclusive file lock
///
/// The lock is released when the allocator is dropped.
#[derive(Debug)]
pub struct NumberAllocator {
    path: PathBuf,
    file: File,
    counters: BTreeMap<i32, u32>,
}

impl NumberAllocator {
    /// Open the state file, creating it if missing, and lock it
    ///
    /// Blocks until no other session holds the lock.
    pub fn open(path: impl AsRef<Path>) -> InvoiceResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InvoiceError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                InvoiceError::Storage(format!("Failed to open {}: {}", path.display(), e))
            })?;

        debug!(path = %path.display(), "waiting for state lock");
        file.lock_exclusive().map_err(|e| {
            InvoiceError::Storage(format!("Failed to lock {}: {}", path.display(), e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| InvoiceError::CorruptState {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if contents.trim().is_empty() {
            // Freshly created (or created by a session that died before its
            // first save): start empty and make the file valid right away.
            let mut allocator = Self {
                path,
                file,
                counters: BTreeMap::new(),
            };
            allocator.save()?;
            return Ok(allocator);
        }

        let counters: BTreeMap<i32, u32> =
            serde_json::from_str(&contents).map_err(|e| InvoiceError::CorruptState {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), years = counters.len(), "state loaded");

        Ok(Self {
            path,
            file,
            counters,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last number issued in `year`; zero for years never seen
    pub fn counter(&self, year: i32) -> u32 {
        self.counters.get(&year).copied().unwrap_or(0)
    }

    /// All counters, by year
    pub fn counters(&self) -> &BTreeMap<i32, u32> {
        &self.counters
    }

    /// The sequence number following the counter of `year`
    fn next_seq(&self, year: i32) -> InvoiceResult<u32> {
        self.counter(year).checked_add(1).ok_or_else(|| {
            InvoiceError::Validation(format!("Invoice numbers for {} are exhausted", year))
        })
    }

    /// The number the next allocation in `year` would return
    pub fn peek_number(&self, year: impl Into<FiscalYear>) -> InvoiceResult<InvoiceNumber> {
        let year = year.into().year();
        Ok(InvoiceNumber::new(year, self.next_seq(year)?))
    }

    /// Allocate the next number in a year
    pub fn get_number(&mut self, year: impl Into<FiscalYear>) -> InvoiceResult<InvoiceNumber> {
        let year = year.into().year();
        let seq = self.next_seq(year)?;
        self.counters.insert(year, seq);
        let number = InvoiceNumber::new(year, seq);
        debug!(%number, "allocated invoice number");
        Ok(number)
    }

    /// Account for a number chosen outside the allocator
    ///
    /// Only the immediate successor of the current counter advances it. Any
    /// other number, including one already issued, is accepted as is and
    /// leaves the sequence untouched.
    pub fn register_number(&mut self, number: &str) -> InvoiceResult<Registration> {
        let number = InvoiceNumber::parse(number)?;
        self.register(number)
    }

    /// [`register_number`](Self::register_number) for an already parsed number
    pub fn register(&mut self, number: InvoiceNumber) -> InvoiceResult<Registration> {
        let expected = self.next_seq(number.year)?;

        if number.seq == expected {
            self.counters.insert(number.year, number.seq);
            debug!(%number, "registered invoice number");
            Ok(Registration::Advanced)
        } else {
            warn!(
                %number,
                expected = %InvoiceNumber::new(number.year, expected),
                "non-consecutive invoice number"
            );
            Ok(Registration::NonConsecutive { expected })
        }
    }

    /// Overwrite the state file with the current counters and sync it
    pub fn save(&mut self) -> InvoiceResult<()> {
        let contents = serde_json::to_string_pretty(&self.counters)
            .map_err(|e| InvoiceError::Storage(format!("Failed to serialize state: {}", e)))?;

        let storage_err = |e: std::io::Error| {
            InvoiceError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        };

        self.file.set_len(0).map_err(storage_err)?;
        self.file.seek(SeekFrom::Start(0)).map_err(storage_err)?;
        self.file.write_all(contents.as_bytes()).map_err(storage_err)?;
        self.file.sync_all().map_err(storage_err)?;

        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
