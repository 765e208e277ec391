//! Errors for execution.

/// Errors that can happen while running a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("cannot decode column '{column}' of type {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
