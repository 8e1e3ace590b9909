use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Opens `db_path` with SQLite's defaults; foreign keys are not enforced.
pub fn open_connection(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path).with_context(|| format!("failed to open db: {}", db_path.display()))
}

/// Opens a connection for the duration of `work` and closes it afterwards,
/// whatever `work` returned. A failed close is logged, never returned.
pub fn with_connection<T>(db_path: &Path, work: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let conn = open_connection(db_path)?;
    let outcome = work(&conn);

    if let Err((_conn, err)) = conn.close() {
        tracing::warn!(error = %err, db = %db_path.display(), "failed to close sqlite connection");
    }

    outcome
}
