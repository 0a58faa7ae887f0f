//! Error types for the driver.

use thiserror::Error;

/// Result type for driver operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the driver.
///
/// Variants carrying a `String` embed the engine's own diagnostic message
/// verbatim (`sqlite3_errmsg` or the `sqlite3_exec` error buffer).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DbError {
    /// The database file could not be opened.
    #[error("cannot open database: {0}")]
    Open(String),

    /// The UTF-16 text-encoding pragma failed right after open. The handle
    /// has already been released; no partially configured connection exists.
    #[error("cannot set UTF-16 encoding: {0}")]
    Encoding(String),

    /// Operation attempted on a closed connection.
    #[error("database is closed")]
    ConnectionClosed,

    /// Operation attempted on a finalized statement.
    #[error("statement is finalized")]
    StatementFinalized,

    /// The engine rejected the SQL text during compilation.
    #[error("{0}")]
    Prepare(String),

    /// A step or exec failed inside the engine.
    #[error("{0}")]
    Engine(String),

    /// A column read was attempted with no buffered row.
    #[error("no row available")]
    NoRow,

    /// No result column matches the requested name.
    #[error("column name not found: {0}")]
    ColumnNotFound(String),

    /// Numeric column selector outside `0..column_count`.
    #[error("column index out of range: {0}")]
    IndexOutOfRange(i64),
}
