//! Safe wrapper around a SQLite database connection.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

use crate::error::{DbError, DbResult};
use crate::ffi;
use crate::statement::Statement;

/// A SQLite database connection.
///
/// The connection is closed when dropped (or by an explicit [`close`]).
/// It is **not** `Sync` -- the database is opened in `NOMUTEX` mode, so the
/// engine performs no serialization of its own and all access must happen
/// from a single thread of control at a time.
///
/// [`close`]: Connection::close
pub struct Connection {
    /// Raw `sqlite3*` handle. Null once closed; never reopened.
    db: *mut ffi::sqlite3,
}

// Safety: Connection is not Sync but is Send -- it can be moved to another
// thread as long as only one thread accesses it at a time.
unsafe impl Send for Connection {}

impl Connection {
    /// Opens (or creates) a database at `path` for read-write access.
    ///
    /// The engine's text encoding is set to UTF-16 immediately after the
    /// open; if that pragma fails the handle is released and the open fails
    /// as a whole, so no partially configured connection ever escapes.
    ///
    /// # Errors
    ///
    /// [`DbError::Open`] with the engine's diagnostic message (or an
    /// out-of-memory indicator when no handle could be allocated), or
    /// [`DbError::Encoding`] when the encoding pragma fails.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let c_path = CString::new(path_str.as_bytes())
            .map_err(|e| DbError::Open(format!("invalid path: {e}")))?;

        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_NOMUTEX;

        let mut db: *mut ffi::sqlite3 = std::ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, std::ptr::null()) };
        if rc != ffi::SQLITE_OK {
            // If open failed but we got a handle, extract the error and close.
            let msg = if db.is_null() {
                "out of memory".to_string()
            } else {
                let m = unsafe { ffi::errmsg(db) };
                unsafe {
                    ffi::sqlite3_close_v2(db);
                }
                m
            };
            return Err(DbError::Open(msg));
        }

        let conn = Self { db };
        // The engine stores text as UTF-16 from here on; text columns are
        // read back through the *_text16 interfaces.
        if let Err(err) = conn.exec("PRAGMA encoding = 'UTF-16'") {
            // `conn` drops here, releasing the handle.
            return Err(DbError::Encoding(err.to_string()));
        }
        Ok(conn)
    }

    /// Opens an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`open`](Self::open).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(":memory:")
    }

    /// Prepares a single SQL statement.
    ///
    /// The returned [`Statement`] keeps its own compiled-query handle; it
    /// stays legal (at the memory level) even if this connection is closed
    /// first, although stepping it may then surface an engine error.
    ///
    /// # Errors
    ///
    /// [`DbError::ConnectionClosed`] when the connection has been closed, or
    /// [`DbError::Prepare`] with the engine's message when compilation fails.
    pub fn prepare(&self, sql: &str) -> DbResult<Statement> {
        if self.db.is_null() {
            return Err(DbError::ConnectionClosed);
        }
        let c_sql =
            CString::new(sql).map_err(|e| DbError::Prepare(format!("nul in SQL: {e}")))?;
        let mut stmt: *mut ffi::sqlite3_stmt = std::ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(self.db, c_sql.as_ptr(), -1, &mut stmt, std::ptr::null_mut())
        };
        if rc != ffi::SQLITE_OK || stmt.is_null() {
            return Err(DbError::Prepare(unsafe { ffi::errmsg(self.db) }));
        }
        Ok(unsafe { Statement::from_raw(stmt, self.db) })
    }

    /// Executes one or more SQL statements separated by semicolons.
    ///
    /// No result rows are returned. Suitable for DDL, PRAGMAs, and
    /// multi-statement scripts. On failure partway through a script, whatever
    /// the engine already committed stays committed; no rollback happens at
    /// this layer.
    ///
    /// # Errors
    ///
    /// [`DbError::ConnectionClosed`] when the connection has been closed, or
    /// [`DbError::Engine`] with the engine's message on any execution error.
    pub fn exec(&self, sql: &str) -> DbResult<()> {
        if self.db.is_null() {
            return Err(DbError::ConnectionClosed);
        }
        let c_sql = CString::new(sql).map_err(|e| DbError::Engine(format!("nul in SQL: {e}")))?;
        let mut errmsg: *mut c_char = std::ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_exec(
                self.db,
                c_sql.as_ptr(),
                None,
                std::ptr::null_mut(),
                &mut errmsg,
            )
        };
        if rc != ffi::SQLITE_OK {
            let msg = if errmsg.is_null() {
                unsafe { ffi::errmsg(self.db) }
            } else {
                let s = unsafe { CStr::from_ptr(errmsg) }.to_string_lossy().into_owned();
                unsafe {
                    ffi::sqlite3_free(errmsg.cast());
                }
                s
            };
            return Err(DbError::Engine(msg));
        }
        Ok(())
    }

    /// Closes the connection. Idempotent; never fails.
    ///
    /// Uses `sqlite3_close_v2`, which defers the real close while statements
    /// prepared on this connection are still live; those statements remain
    /// legal to finalize (and may surface engine errors when stepped).
    pub fn close(&mut self) {
        if !self.db.is_null() {
            unsafe {
                ffi::sqlite3_close_v2(self.db);
            }
            self.db = std::ptr::null_mut();
        }
    }

    /// Returns `true` while the connection handle is present.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.db.is_null()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
