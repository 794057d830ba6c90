//! Attribute value types.
//!
//! Attribute values are dynamic JSON values; the same type is used for the
//! in-memory representation and for the wire format handed to adapters. Which
//! of the two a value is depends only on whether it has passed through the
//! attribute's `serialize` transform.

use crate::error::{OpaqueError, Result};
use serde::Serialize;

pub use serde_json::Value;

/// A flat attribute name → value mapping, ordered by insertion.
pub type Row = serde_json::Map<String, Value>;

/// Options for reading and writing single attributes.
///
/// With `raw` set, the attribute's `get`/`set` transforms are bypassed and the
/// value is read from or written to the store as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessOptions {
    pub raw: bool,
}

impl AccessOptions {
    pub const fn raw() -> Self {
        Self { raw: true }
    }
}

/// Serialize any struct or map into a [`Row`].
///
/// Fails if the value does not serialize to a JSON object.
pub fn to_row<T: Serialize + ?Sized>(data: &T) -> Result<Row> {
    match serde_json::to_value(data)? {
        Value::Object(row) => Ok(row),
        other => Err(OpaqueError::InvalidRow(other.to_string())),
    }
}
