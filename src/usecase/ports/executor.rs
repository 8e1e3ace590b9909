use crate::domain::entities::request::TypedParameter;
use crate::domain::entities::table::{CellValue, ResultEnvelope};
use crate::domain::error::ValidationError;

/// Failure surfaced by the SQL backend, carrying its full message chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    Message(String),
}

impl DatabaseError {
    /// Flattens an error chain (`context: cause: …`) into one message so the
    /// backend's own text survives.
    pub fn from_chain(err: anyhow::Error) -> Self {
        DatabaseError::Message(format!("{err:#}"))
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DatabaseError {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The SQL execution collaborator. Each call acquires and releases its own
/// backend resources.
pub trait SqlExecutor: Send + Sync {
    fn execute(
        &self,
        sql: &str,
        params: &[TypedParameter],
    ) -> Result<ResultEnvelope, DatabaseError>;

    /// Rows affected by a write statement.
    fn execute_update(&self, sql: &str, params: &[TypedParameter])
        -> Result<usize, DatabaseError>;

    fn execute_query(&self, sql: &str) -> Result<ResultEnvelope, DatabaseError> {
        self.execute(sql, &[])
    }

    /// First column of the first row, which must be an integer.
    fn execute_count(&self, sql: &str) -> Result<i64, EngineError> {
        let envelope = self.execute(sql, &[])?;
        let value = envelope
            .columns
            .first()
            .and_then(|column| envelope.first_value(&column.label))
            .ok_or(ValidationError::Missing {
                element: "dataSize",
            })?;

        match value {
            CellValue::Integer(count) => Ok(*count),
            _ => Err(ValidationError::InvalidType {
                element: "dataSize",
            }
            .into()),
        }
    }
}
