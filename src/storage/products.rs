//! The product store: cleaned records as JSON lines, deduplicated by content

use super::StorageResult;
use crate::extract::{ProductData, ProductRecord};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Result of offering a record to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Duplicate,
}

/// Append-only JSON-lines file of product records
///
/// Fingerprints of saved records are kept in memory for the life of the
/// store only; records saved by earlier runs are not consulted.
pub struct ProductStore {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl ProductStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct records saved through this store
    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Cleans `data` and appends it unless an identical record was saved
    ///
    /// The fingerprint check and the append happen under one lock, and a
    /// failed append leaves the fingerprint unrecorded.
    pub fn save(&self, data: &ProductData) -> StorageResult<SaveOutcome> {
        let record = ProductRecord::from(data);
        let line = record.canonical_json()?;
        let fingerprint = crate::extract::fingerprint(&line);

        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if seen.contains(&fingerprint) {
            debug!("Duplicate product skipped ({})", &fingerprint[..12]);
            return Ok(SaveOutcome::Duplicate);
        }

        self.append_line(&line)?;
        seen.insert(fingerprint);

        info!(
            "Saved product: {}",
            record.product_title.as_deref().unwrap_or("untitled")
        );
        Ok(SaveOutcome::Saved)
    }

    fn append_line(&self, line: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Counts the non-blank lines of a JSON-lines file; missing files count zero
pub fn count_lines(path: &Path) -> StorageResult<usize> {
    if !path.is_file() {
        return Ok(0);
    }
    let reader = BufReader::new(fs::File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn product(title: &str) -> ProductData {
        ProductData {
            product_title: Some(title.to_string()),
            price: Some("£ 79".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_record_saved_once() {
        let dir = TempDir::new().unwrap();
        let store = ProductStore::new(dir.path().join("data").join("products_data.txt"));

        assert_eq!(store.save(&product("ST-20")).unwrap(), SaveOutcome::Saved);
        assert_eq!(store.save(&product(" ST-20 \n")).unwrap(), SaveOutcome::Duplicate);
        assert_eq!(store.save(&product("ST-30")).unwrap(), SaveOutcome::Saved);

        assert_eq!(count_lines(store.path()).unwrap(), 2);
        assert_eq!(store.seen_count(), 2);
    }

    #[test]
    fn test_lines_are_canonical_json() {
        let dir = TempDir::new().unwrap();
        let store = ProductStore::new(dir.path().join("products.txt"));
        store.save(&product("ST-20")).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["product_title"], "ST-20");
        assert_eq!(value["disclaimer"], "null");
        assert!(content.starts_with("{\"badges\":\"null\""));
    }

    #[test]
    fn test_new_store_does_not_know_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.txt");

        ProductStore::new(&path).save(&product("ST-20")).unwrap();
        ProductStore::new(&path).save(&product("ST-20")).unwrap();
        assert_eq!(count_lines(&path).unwrap(), 2);
    }

    #[test]
    fn test_count_lines_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(count_lines(&dir.path().join("none.txt")).unwrap(), 0);
    }
}
