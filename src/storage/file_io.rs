//! File I/O helpers
//!
//! JSON data files are replaced atomically (temp file, sync, rename) so a
//! crash never leaves a half-written file behind. Rendered documents are
//! written with create-new semantics and never replace an existing file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::InvoiceError;

/// Read JSON from a file, returning a default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, InvoiceError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| InvoiceError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| InvoiceError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), InvoiceError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = temp_path_for(path);

    let file = File::create(&temp_path)
        .map_err(|e| InvoiceError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| InvoiceError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| InvoiceError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| InvoiceError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InvoiceError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Write a new file; fails if anything already exists at `path`
pub fn write_new_file<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), InvoiceError> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => InvoiceError::Duplicate {
                entity_type: "File",
                identifier: path.display().to_string(),
            },
            _ => InvoiceError::Io(format!("Failed to create {}: {}", path.display(), e)),
        })?;

    file.write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| InvoiceError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

fn ensure_parent(path: &Path) -> Result<(), InvoiceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            InvoiceError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// `products.json` → `products.json.tmp`, next to the target for an atomic rename
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Counters {
        by_year: BTreeMap<i32, u32>,
    }

    fn sample() -> Counters {
        Counters {
            by_year: BTreeMap::from([(2023, 41), (2024, 7)]),
        }
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Counters = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Counters::default());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Counters = read_json(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_read_garbage_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        fs::write(&path, "not json").unwrap();

        let err = read_json::<Counters, _>(&path).unwrap_err();
        assert!(matches!(err, InvoiceError::Storage(_)));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        write_json_atomic(&path, &sample()).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("data.json");

        write_json_atomic(&path, &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_new_file_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("INV_2024_01.txt");

        write_new_file(&path, "first").unwrap();
        let err = write_new_file(&path, "second").unwrap_err();

        assert!(matches!(err, InvoiceError::Duplicate { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }
}
