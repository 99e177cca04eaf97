//! Per-category endpoint tables
//!
//! Each category slug owns `<dir>/<slug>.csv` with a single `endpoint`
//! column. Tables are append-only: a save writes only the URLs the table
//! does not already hold. A table written without the header is read as
//! bare URL rows when appending to it, and skipped when loading the union.

use super::{StorageError, StorageResult};
use crate::url::slug_file_stem;
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Name of the only column of an endpoint table
pub const ENDPOINT_COLUMN: &str = "endpoint";

/// Directory of endpoint tables
#[derive(Debug, Clone)]
pub struct EndpointStore {
    dir: PathBuf,
}

impl EndpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the table for `slug`
    pub fn table_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", slug_file_stem(slug)))
    }

    /// Reads every endpoint persisted for `slug`
    pub fn load(&self, slug: &str) -> StorageResult<HashSet<String>> {
        let path = self.table_path(slug);
        if !path.is_file() {
            return Ok(HashSet::new());
        }
        Ok(read_rows(&path)?.into_iter().collect())
    }

    /// Appends the endpoints of `endpoints` not yet in the table for `slug`
    ///
    /// Returns the number of rows written. The header is written when the
    /// table is created; rows go out in sorted order.
    pub fn save(&self, slug: &str, endpoints: &HashSet<String>) -> StorageResult<usize> {
        fs::create_dir_all(&self.dir)?;
        let path = self.table_path(slug);

        let existing = self.load(slug)?;
        let new_rows: BTreeSet<&String> = endpoints.difference(&existing).collect();
        if new_rows.is_empty() {
            debug!("No new endpoints to save for {}", slug);
            return Ok(0);
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record([ENDPOINT_COLUMN])?;
        }
        for endpoint in &new_rows {
            writer.write_record([endpoint.as_str()])?;
        }
        writer.flush()?;

        info!("{} new endpoints saved to {}", new_rows.len(), path.display());
        Ok(new_rows.len())
    }

    /// Union of the endpoint column across every table, sorted
    ///
    /// Zero-byte and unreadable tables (including ones without the
    /// `endpoint` header) are skipped with a warning; a missing directory is
    /// logged and yields no endpoints.
    pub fn load_all(&self) -> StorageResult<Vec<String>> {
        if !self.dir.is_dir() {
            error!(
                "The directory {} does not exist or is not a directory",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut endpoints = BTreeSet::new();
        for path in self.table_paths()? {
            if fs::metadata(&path)?.len() == 0 {
                warn!("The file {} is empty", path.display());
                continue;
            }
            debug!("Processing file: {}", path.display());
            match read_table(&path) {
                Ok(rows) => endpoints.extend(rows),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        Ok(endpoints.into_iter().collect())
    }

    /// Every `.csv` file in the directory, sorted by name
    pub fn table_paths(&self) -> StorageResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Reads the non-empty values of the endpoint column
pub(crate) fn read_table(path: &Path) -> StorageResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h == ENDPOINT_COLUMN)
        .ok_or_else(|| StorageError::MissingColumn {
            path: path.to_path_buf(),
            column: ENDPOINT_COLUMN,
        })?;

    let mut endpoints = Vec::new();
    for record in reader.records() {
        endpoints.extend(cell(&record?, column));
    }
    Ok(endpoints)
}

/// Reads a table for appending
///
/// Uses the `endpoint` column when the first row names it; otherwise every
/// row, the first included, is a bare URL in the first column.
fn read_rows(path: &Path) -> StorageResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut records = reader.records();

    let first = match records.next() {
        Some(record) => record?,
        None => return Ok(Vec::new()),
    };
    let (column, mut endpoints) = match first.iter().position(|h| h.trim() == ENDPOINT_COLUMN) {
        Some(column) => (column, Vec::new()),
        None => {
            warn!(
                "{} has no '{}' header, reading bare rows",
                path.display(),
                ENDPOINT_COLUMN
            );
            (0, cell(&first, 0).into_iter().collect())
        }
    };

    for record in records {
        endpoints.extend(cell(&record?, column));
    }
    Ok(endpoints)
}

fn cell(record: &csv::StringRecord, column: usize) -> Option<String> {
    record
        .get(column)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
