//! Optional diagnostics database handshake
//!
//! Before crawling, the run can open the diagnostics database named by an
//! environment variable and log what it found. A failure here only fails
//! this stage.

use crate::config::DiagnosticsConfig;
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Connection string not found in environment variable {0}")]
    MissingConnectionString(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// What the database reported during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
    pub journal_mode: String,
    pub page_count: i64,
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SQLite {} (journal mode: {}, pages: {})",
            self.version, self.journal_mode, self.page_count
        )
    }
}

/// Reads a non-blank connection string from `var`
pub fn connection_string_from_env(var: &str) -> Result<String, DiagnosticsError> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DiagnosticsError::MissingConnectionString(var.to_string()))
}

/// Opens `connection_string` (a path or `file:` URI) and queries server info
pub fn handshake(connection_string: &str) -> Result<ServerInfo, DiagnosticsError> {
    let conn = Connection::open_with_flags(
        connection_string,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI,
    )?;

    let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
    let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;

    Ok(ServerInfo {
        version,
        journal_mode,
        page_count,
    })
}

/// Runs the handshake against the database configured in `config`
pub fn probe(config: &DiagnosticsConfig) -> Result<ServerInfo, DiagnosticsError> {
    let connection_string = connection_string_from_env(&config.connection_env)?;

    info!("Connecting to diagnostics database...");
    let server = handshake(&connection_string)?;
    info!("> Database connection established");
    info!("- Version: {}", server.version);
    info!("- Journal mode: {}", server.journal_mode);
    info!("- Pages: {}", server.page_count);

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_handshake_on_new_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diag.db");

        let server = handshake(path.to_str().unwrap()).unwrap();
        assert!(server.version.starts_with('3'));
        assert!(!server.journal_mode.is_empty());
        assert!(server.page_count >= 0);
        assert!(server.to_string().starts_with("SQLite 3"));
    }

    #[test]
    fn test_handshake_bad_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("diag.db");
        assert!(matches!(
            handshake(path.to_str().unwrap()),
            Err(DiagnosticsError::Database(_))
        ));
    }

    #[test]
    fn test_missing_connection_string() {
        let var = "CATALOG_HARVEST_TEST_UNSET_DB";
        std::env::remove_var(var);
        assert!(matches!(
            connection_string_from_env(var),
            Err(DiagnosticsError::MissingConnectionString(v)) if v == var
        ));
    }

    #[test]
    fn test_probe_reads_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.db");
        let var = "CATALOG_HARVEST_TEST_PROBE_DB";
        std::env::set_var(var, path.to_str().unwrap());

        let config = DiagnosticsConfig {
            connection_env: var.to_string(),
        };
        assert!(probe(&config).is_ok());
        std::env::remove_var(var);
    }
}
