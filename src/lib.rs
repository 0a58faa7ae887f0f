//! Minimal stepping SQLite driver.
//!
//! This crate provides a small, safe Rust API over the SQLite C FFI for the
//! prepared-statement workflow: open a database, compile SQL, step the
//! statement row by row (explicitly or through the iterator protocol), and
//! marshal each column into a host [`Value`].
//!
//! Databases are opened read-write (created if absent) in `NOMUTEX` mode and
//! configured to store text as UTF-16. Integers read back within ±2^53 come
//! out as [`Value::Integer`]; anything larger, which would not survive a
//! double round-trip, comes out as [`Value::BigInt`].
//!
//! The raw symbols are provided by `libsqlite3-sys` (bundled); the [`ffi`]
//! module is the only file that names them.
//!
//! ```no_run
//! use rowstep::{Connection, Value};
//!
//! # fn main() -> rowstep::DbResult<()> {
//! let conn = Connection::open("app.db")?;
//! conn.exec("CREATE TABLE IF NOT EXISTS t(a INTEGER, b TEXT)")?;
//! let mut stmt = conn.prepare("SELECT a, b FROM t ORDER BY a")?;
//! while stmt.step()? {
//!     let a = stmt.get(0)?;
//!     let b = stmt.get("b")?;
//!     println!("{a:?} {b:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod ffi;

mod connection;
pub mod error;
mod statement;
pub mod value;

pub use connection::Connection;
pub use error::{DbError, DbResult};
pub use statement::{ColumnSelector, NextResult, Row, Statement};
pub use value::{Value, MAX_SAFE_INTEGER};

#[cfg(test)]
mod tests;
