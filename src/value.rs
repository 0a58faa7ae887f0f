//! Column values and the engine-to-host marshaller.

use std::os::raw::c_int;

use crate::ffi;

/// Largest integer magnitude exactly representable in an IEEE 754 double
/// (2^53). Integers within `[-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER]` survive a
/// round-trip through a double; anything outside does not.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// A single column value read from the current result row.
///
/// Values are produced fresh on every access; the underlying engine buffers
/// are only valid until the next step/reset/finalize, so text and blobs are
/// always copied out.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer within ±2^53, exactly representable as a double.
    Integer(i64),
    /// Integer whose magnitude exceeds 2^53. Kept as a separate variant so
    /// callers know a double conversion would lose precision.
    BigInt(i64),
    /// 64-bit IEEE float, passed through from the engine unchanged.
    Float(f64),
    /// Text, decoded from the engine's UTF-16 buffer.
    Text(String),
    /// Binary blob, copied out of the engine buffer.
    Blob(Vec<u8>),
    /// SQL NULL (also produced for any unrecognized type tag).
    Null,
}

impl Value {
    /// Returns the integer payload of [`Integer`](Self::Integer) or
    /// [`BigInt`](Self::BigInt).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) | Self::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float payload, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the blob payload, if any.
    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for [`Null`](Self::Null).
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Reads and marshals one column of the currently buffered row.
///
/// # Safety
///
/// `stmt` must be a valid `sqlite3_stmt*` with a buffered row, and `idx` must
/// be within `0..sqlite3_column_count(stmt)`.
pub(crate) unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, idx: c_int) -> Value {
    match ffi::sqlite3_column_type(stmt, idx) {
        ffi::SQLITE_INTEGER => {
            let v = ffi::sqlite3_column_int64(stmt, idx);
            if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v) {
                Value::Integer(v)
            } else {
                Value::BigInt(v)
            }
        }
        ffi::SQLITE_FLOAT => Value::Float(ffi::sqlite3_column_double(stmt, idx)),
        ffi::SQLITE_TEXT => {
            // text16 must be fetched before bytes16 so the engine performs
            // any needed encoding conversion first.
            let ptr = ffi::sqlite3_column_text16(stmt, idx);
            let bytes = ffi::sqlite3_column_bytes16(stmt, idx);
            if ptr.is_null() || bytes <= 0 {
                return Value::Text(String::new());
            }
            let units = std::slice::from_raw_parts(ptr.cast::<u16>(), (bytes as usize) / 2);
            Value::Text(String::from_utf16_lossy(units))
        }
        ffi::SQLITE_BLOB => {
            let ptr = ffi::sqlite3_column_blob(stmt, idx);
            let len = ffi::sqlite3_column_bytes(stmt, idx);
            if ptr.is_null() || len <= 0 {
                Value::Blob(Vec::new())
            } else {
                Value::Blob(std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize).to_vec())
            }
        }
        ffi::SQLITE_NULL => Value::Null,
        // Unrecognized type tags also marshal to NULL.
        _ => Value::Null,
    }
}
