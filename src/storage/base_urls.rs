//! The base-URL checkpoint: one category URL per line, sorted

use super::StorageResult;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error};

/// Replaces the file at `path` with `urls`, one per line
///
/// The content goes to a sibling temp file first and is renamed over the
/// target, so readers never see a partial file.
pub fn save_base_urls(path: &Path, urls: &BTreeSet<String>) -> StorageResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut file = fs::File::create(tmp_path)?;
        for url in urls {
            writeln!(file, "{}", url)?;
        }
        file.sync_all()?;
    }
    fs::rename(tmp_path, path)?;

    debug!("Wrote {} base URLs to {}", urls.len(), path.display());
    Ok(urls.len())
}

/// Reads the non-blank lines of the base-URL file
///
/// A missing file is logged and yields no URLs.
pub fn load_base_urls(path: &Path) -> StorageResult<Vec<String>> {
    if !path.is_file() {
        error!(
            "The file {} does not exist or is not a file",
            path.display()
        );
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
