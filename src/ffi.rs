//! FFI surface for the SQLite C API.
//!
//! All raw symbols come from `libsqlite3-sys` (with the `bundled` feature, so
//! the amalgamation is compiled into the crate and no system library is
//! required). They are re-exported here so that the rest of the crate never
//! names the backend crate directly; this is the **only** module that knows
//! where the symbols come from.

pub(crate) use libsqlite3_sys::{
    sqlite3, sqlite3_column_blob, sqlite3_column_bytes, sqlite3_column_count,
    sqlite3_column_double, sqlite3_column_int64, sqlite3_column_name, sqlite3_column_type,
    sqlite3_errmsg, sqlite3_exec, sqlite3_finalize, sqlite3_free, sqlite3_open_v2,
    sqlite3_prepare_v2, sqlite3_reset, sqlite3_step, sqlite3_stmt, SQLITE_BLOB, SQLITE_DONE,
    SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_NOMUTEX,
    SQLITE_OPEN_READWRITE, SQLITE_ROW, SQLITE_TEXT,
};

// `libsqlite3-sys` omits these from its generated bindings, but the bundled
// SQLite library still exports them; declare them here with the signatures
// from the C API.
extern "C" {
    pub(crate) fn sqlite3_close_v2(db: *mut sqlite3) -> std::os::raw::c_int;
    pub(crate) fn sqlite3_column_text16(
        stmt: *mut sqlite3_stmt,
        i_col: std::os::raw::c_int,
    ) -> *const std::os::raw::c_void;
    pub(crate) fn sqlite3_column_bytes16(
        stmt: *mut sqlite3_stmt,
        i_col: std::os::raw::c_int,
    ) -> std::os::raw::c_int;
}

use std::ffi::CStr;
use std::os::raw::c_char;

/// Copies the current diagnostic message of `db` into an owned `String`.
///
/// # Safety
///
/// `db` must be a valid `sqlite3*` handle (a zombie handle kept alive by an
/// unfinalized statement is fine).
pub(crate) unsafe fn errmsg(db: *mut sqlite3) -> String {
    let ptr = sqlite3_errmsg(db);
    if ptr.is_null() {
        "unknown error".to_string()
    } else {
        CStr::from_ptr(ptr.cast::<c_char>())
            .to_string_lossy()
            .into_owned()
    }
}
