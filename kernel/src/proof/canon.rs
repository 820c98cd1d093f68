//! Canonical JSON bytes: the single serialization-for-hashing path.
//!
//! Every digest over JSON in the workspace routes through
//! [`canonical_json_bytes`].
//!
//! # Rules
//!
//! 1. Object keys sorted by byte order, regardless of map implementation.
//! 2. Compact form, no whitespace.
//! 3. Strings escaped by `serde_json`.
//! 4. Numbers must be integers. Floats are rejected; real values that need
//!    to be hashed (slot defaults) are carried as hex of their IEEE-754 bytes.

use serde_json::Value;

/// Error type for canonical JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A JSON number was not an integer.
    NonIntegerNumber { raw: String },
    /// `serde_json` failed to write a string.
    Write { detail: String },
}

impl std::fmt::Display for CanonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIntegerNumber { raw } => {
                write!(f, "non-integer number in canonical JSON: {raw}")
            }
            Self::Write { detail } => write!(f, "canonical JSON write failed: {detail}"),
        }
    }
}

impl std::error::Error for CanonError {}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CanonError::NonIntegerNumber`] if any number is not an `i64`
/// or `u64`.
pub fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>, CanonError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), CanonError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => write_scalar(buf, value),
        Value::Number(n) => {
            if n.is_f64() {
                return Err(CanonError::NonIntegerNumber { raw: n.to_string() });
            }
            write_scalar(buf, value)
        }
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
            Ok(())
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            buf.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                serde_json::to_writer(&mut *buf, key.as_str()).map_err(write_error)?;
                buf.push(b':');
                write_value(buf, item)?;
            }
            buf.push(b'}');
            Ok(())
        }
    }
}

fn write_scalar(buf: &mut Vec<u8>, value: &Value) -> Result<(), CanonError> {
    serde_json::to_writer(buf, value).map_err(write_error)
}

#[allow(clippy::needless_pass_by_value)]
fn write_error(e: serde_json::Error) -> CanonError {
    CanonError::Write {
        detail: e.to_string(),
    }
}
