//! Safe wrapper around a SQLite prepared statement.
//!
//! A [`Statement`] is a small state machine: `Ready` (just prepared or just
//! reset) steps to `HasRow` while rows are available, then to `Exhausted`;
//! `reset` returns to `Ready`; `finalize` releases the compiled query for
//! good. Column values are marshalled fresh from the live engine buffers on
//! every read.

use std::ffi::CStr;
use std::os::raw::c_int;

use indexmap::IndexMap;

use crate::error::{DbError, DbResult};
use crate::ffi;
use crate::value::{self, Value};

/// Row-buffering state of a live (non-finalized) statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    /// Just prepared or just reset; no row buffered yet.
    Ready,
    /// The last step produced a row, which is currently buffered.
    HasRow,
    /// The last step signaled exhaustion; sticky until reset.
    Exhausted,
}

/// One result row: column name to marshalled value, in column order.
///
/// Duplicate column names (e.g. from a join) keep only the last value
/// written for that name, at the position of the first occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    /// Returns the value for `name`, if that column exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Number of distinct column names in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates name/value pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Outcome of one pull-iterator advance ([`Statement::next`]), mirroring the
/// iterator-protocol `{value, done}` shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NextResult {
    /// The projected row, present exactly when `done` is `false`.
    pub value: Option<Row>,
    /// `true` once the statement is exhausted or finalized.
    pub done: bool,
}

/// A column selector for [`Statement::get`]: a 0-based index or a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSelector<'a> {
    /// 0-based column index. Out-of-range (including negative) values fail
    /// with [`DbError::IndexOutOfRange`].
    Index(i64),
    /// Column name, matched case-sensitively against the result columns.
    Name(&'a str),
}

impl From<i32> for ColumnSelector<'_> {
    fn from(idx: i32) -> Self {
        Self::Index(i64::from(idx))
    }
}

impl From<i64> for ColumnSelector<'_> {
    fn from(idx: i64) -> Self {
        Self::Index(idx)
    }
}

impl From<usize> for ColumnSelector<'_> {
    fn from(idx: usize) -> Self {
        Self::Index(i64::try_from(idx).unwrap_or(i64::MAX))
    }
}

impl<'a> From<&'a str> for ColumnSelector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnSelector<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

/// A prepared SQLite statement.
///
/// Created via [`Connection::prepare`](crate::Connection::prepare) and
/// finalized when dropped. The statement owns its compiled-query handle
/// independently of the connection wrapper; closing the connection first is
/// legal, though stepping afterwards may surface an engine error.
pub struct Statement {
    /// Raw `sqlite3_stmt*` handle. Null once finalized (terminal).
    stmt: *mut ffi::sqlite3_stmt,
    /// Owning `sqlite3*` handle, kept strictly for diagnostic messages.
    db: *mut ffi::sqlite3,
    state: RowState,
    /// Ordered column names, computed on first need. Column count and names
    /// are fixed once the statement is prepared, so the cache stays valid
    /// until finalization.
    column_names: Option<Vec<String>>,
}

// Safety: the wrapper enforces single-owner semantics; the raw pointers are
// not shared across threads. The caller serializes access, matching the
// NOMUTEX open mode of the owning connection.
unsafe impl Send for Statement {}

impl Statement {
    /// Wraps a freshly prepared raw statement.
    ///
    /// # Safety
    ///
    /// `stmt` must be a valid, non-null `sqlite3_stmt*` and `db` the
    /// `sqlite3*` handle it was prepared on.
    pub(crate) unsafe fn from_raw(stmt: *mut ffi::sqlite3_stmt, db: *mut ffi::sqlite3) -> Self {
        debug_assert!(!stmt.is_null());
        Self {
            stmt,
            db,
            state: RowState::Ready,
            column_names: None,
        }
    }

    // ── Stepping ────────────────────────────────────────────────────────

    /// Advances the statement one row.
    ///
    /// Returns `true` when a row is now buffered and `false` on exhaustion.
    /// Exhaustion is sticky: further calls keep returning `false` without
    /// touching the engine (whose auto-reset would otherwise silently re-run
    /// the query) until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// [`DbError::StatementFinalized`] after finalization, or
    /// [`DbError::Engine`] with the connection's diagnostic message on any
    /// other non-row, non-done engine status.
    pub fn step(&mut self) -> DbResult<bool> {
        if self.stmt.is_null() {
            return Err(DbError::StatementFinalized);
        }
        if self.state == RowState::Exhausted {
            return Ok(false);
        }
        let rc = unsafe { ffi::sqlite3_step(self.stmt) };
        match rc {
            ffi::SQLITE_ROW => {
                self.state = RowState::HasRow;
                Ok(true)
            }
            ffi::SQLITE_DONE => {
                self.state = RowState::Exhausted;
                Ok(false)
            }
            _ => Err(DbError::Engine(unsafe { ffi::errmsg(self.db) })),
        }
    }

    /// Returns the statement to the ready state so it can be stepped again.
    ///
    /// Bound state is kept. No-op once finalized; never fails (the engine's
    /// reset return code merely replays the last step error and is ignored).
    pub fn reset(&mut self) {
        if self.stmt.is_null() {
            return;
        }
        unsafe {
            ffi::sqlite3_reset(self.stmt);
        }
        self.state = RowState::Ready;
    }

    /// Releases the compiled-query handle. Idempotent; never fails.
    ///
    /// Every operation other than `reset`, `finalize`, and [`next`]
    /// (which reports a clean `done`) fails afterwards.
    ///
    /// [`next`]: Self::next
    pub fn finalize(&mut self) {
        if !self.stmt.is_null() {
            unsafe {
                ffi::sqlite3_finalize(self.stmt);
            }
            self.stmt = std::ptr::null_mut();
        }
        self.column_names = None;
    }

    // ── Column access ───────────────────────────────────────────────────

    /// Number of result columns (0 once finalized).
    #[must_use]
    pub fn column_count(&self) -> usize {
        if self.stmt.is_null() {
            return 0;
        }
        let n = unsafe { ffi::sqlite3_column_count(self.stmt) };
        usize::try_from(n).unwrap_or(0)
    }

    /// Reads one column of the currently buffered row.
    ///
    /// The selector is a 0-based index (`i32`/`i64`/`usize`) or a column
    /// name (`&str`); names are resolved by a case-sensitive linear scan,
    /// first exact match wins. The value is marshalled fresh from the live
    /// engine buffer on every call.
    ///
    /// # Errors
    ///
    /// [`DbError::StatementFinalized`] after finalization, [`DbError::NoRow`]
    /// unless a row is currently buffered, [`DbError::ColumnNotFound`] for an
    /// unmatched name, [`DbError::IndexOutOfRange`] for an index outside
    /// `0..column_count`.
    pub fn get<'a>(&self, column: impl Into<ColumnSelector<'a>>) -> DbResult<Value> {
        if self.stmt.is_null() {
            return Err(DbError::StatementFinalized);
        }
        if self.state != RowState::HasRow {
            return Err(DbError::NoRow);
        }

        let count = unsafe { ffi::sqlite3_column_count(self.stmt) };
        let index = match column.into() {
            ColumnSelector::Index(idx) => idx,
            ColumnSelector::Name(name) => {
                let mut found = None;
                for i in 0..count {
                    if self.column_name_at(i).as_deref() == Some(name) {
                        found = Some(i64::from(i));
                        break;
                    }
                }
                found.ok_or_else(|| DbError::ColumnNotFound(name.to_owned()))?
            }
        };

        if index < 0 || index >= i64::from(count) {
            return Err(DbError::IndexOutOfRange(index));
        }
        let idx = c_int::try_from(index).map_err(|_| DbError::IndexOutOfRange(index))?;
        Ok(unsafe { value::read_column(self.stmt, idx) })
    }

    // ── Iteration ───────────────────────────────────────────────────────

    /// Pull-iterator advance in the `{value, done}` protocol shape.
    ///
    /// Once finalized this returns `done: true` immediately and **without**
    /// error, so iteration loops terminate cleanly after an explicit early
    /// finalize. On a row it returns the full-row projection; on exhaustion
    /// it issues an implicit [`reset`](Self::reset) (the statement becomes
    /// immediately re-iterable) and reports `done: true`.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError::Engine`] from the underlying step.
    pub fn next(&mut self) -> DbResult<NextResult> {
        if self.stmt.is_null() {
            return Ok(NextResult {
                value: None,
                done: true,
            });
        }
        if self.step()? {
            let row = self.project_row();
            Ok(NextResult {
                value: Some(row),
                done: false,
            })
        } else {
            self.reset();
            Ok(NextResult {
                value: None,
                done: true,
            })
        }
    }

    /// Returns the statement itself as an iterator over its rows.
    ///
    /// Equivalent to taking `&mut` and using the [`Iterator`] impl directly:
    /// `for row in stmt.iterate() { ... }`.
    pub fn iterate(&mut self) -> &mut Self {
        self
    }

    /// Builds the name-to-value projection of the currently buffered row.
    ///
    /// Values are marshalled fresh; only the column-name list is cached.
    fn project_row(&mut self) -> Row {
        let stmt = self.stmt;
        let count = self.column_count();
        let mut columns = IndexMap::with_capacity(count);
        for (i, name) in self.cached_column_names().iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let value = unsafe { value::read_column(stmt, i as c_int) };
            columns.insert(name.clone(), value);
        }
        debug_assert!(count >= columns.len());
        Row { columns }
    }

    /// Ordered column names, computed once per statement lifetime.
    fn cached_column_names(&mut self) -> &[String] {
        if self.column_names.is_none() {
            let count = unsafe { ffi::sqlite3_column_count(self.stmt) };
            let mut names = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
            for i in 0..count {
                names.push(self.column_name_at(i).unwrap_or_default());
            }
            self.column_names = Some(names);
        }
        self.column_names.as_deref().unwrap_or(&[])
    }

    /// Reads one column name straight from the engine.
    fn column_name_at(&self, idx: c_int) -> Option<String> {
        let ptr = unsafe { ffi::sqlite3_column_name(self.stmt, idx) };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

impl Iterator for &mut Statement {
    type Item = DbResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match Statement::next(self) {
            Ok(NextResult {
                value: Some(row), ..
            }) => Some(Ok(row)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("finalized", &self.stmt.is_null())
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.finalize();
    }
}
