use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::params_from_iter;

use crate::domain::entities::request::TypedParameter;
use crate::domain::entities::table::ResultEnvelope;
use crate::infra::sqlite::binder::bind_all;
use crate::infra::sqlite::column_type::{shape_result, DeclaredColumn};
use crate::infra::sqlite::schema::with_connection;
use crate::usecase::ports::executor::{DatabaseError, SqlExecutor};

/// Runs statements against one SQLite database file, opening a fresh
/// connection per call.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pub db_path: PathBuf,
}

impl SqliteExecutor {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl SqlExecutor for SqliteExecutor {
    fn execute(
        &self,
        sql: &str,
        params: &[TypedParameter],
    ) -> Result<ResultEnvelope, DatabaseError> {
        query_envelope(&self.db_path, sql, params).map_err(DatabaseError::from_chain)
    }

    fn execute_update(
        &self,
        sql: &str,
        params: &[TypedParameter],
    ) -> Result<usize, DatabaseError> {
        execute_statement(&self.db_path, sql, params).map_err(DatabaseError::from_chain)
    }
}

pub fn query_envelope(db_path: &Path, sql: &str, params: &[TypedParameter]) -> Result<ResultEnvelope> {
    let values = bind_all(params)?;

    with_connection(db_path, |conn| {
        let mut stmt = conn.prepare(sql).context("failed to prepare query")?;
        let columns: Vec<DeclaredColumn> = stmt
            .columns()
            .iter()
            .map(|column| DeclaredColumn::new(column.name(), column.decl_type()))
            .collect();
        let width = columns.len();

        let mut raw_rows = Vec::new();
        let mut rows = stmt
            .query(params_from_iter(values.iter()))
            .context("failed to run query")?;
        while let Some(row) = rows.next().context("failed to read row")? {
            let values = (0..width)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("failed to read column value")?;
            raw_rows.push(values);
        }
        drop(rows);

        if let Err(err) = stmt.finalize() {
            tracing::warn!(error = %err, "failed to finalize statement");
        }

        tracing::trace!(rows = raw_rows.len(), columns = width, "query returned");
        Ok(shape_result(&columns, raw_rows))
    })
}

pub fn execute_statement(db_path: &Path, sql: &str, params: &[TypedParameter]) -> Result<usize> {
    let values = bind_all(params)?;

    with_connection(db_path, |conn| {
        let affected = conn
            .execute(sql, params_from_iter(values.iter()))
            .context("failed to execute statement")?;
        tracing::trace!(affected, "statement executed");
        Ok(affected)
    })
}
