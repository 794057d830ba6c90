//! Layered per-instance attribute storage.
//!
//! An instance keeps two layers:
//!
//! - `local`: values changed since the last save. Its keys are exactly the dirty
//!   attributes.
//! - `storage`: the last row known to be persisted, or `None` for an instance
//!   that was never persisted. An empty row still counts as persisted.
//!
//! Reads check `local` first, then `storage`. Falling back to a schema default
//! is the caller's job since the store knows nothing about schemas.

use super::{Row, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    local: Row,
    storage: Option<Row>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self) -> &Row {
        &self.local
    }

    pub fn storage(&self) -> Option<&Row> {
        self.storage.as_ref()
    }

    /// Resolve a value from `local`, then `storage`.
    pub fn resolve(&self, name: &str) -> Option<&Value> {
        self.local
            .get(name)
            .or_else(|| self.storage.as_ref().and_then(|row| row.get(name)))
    }

    pub fn write_local(&mut self, name: &str, value: Value) {
        self.local.insert(name.to_string(), value);
    }

    pub fn discard_local(&mut self, name: &str) -> Option<Value> {
        self.local.remove(name)
    }

    pub fn dirty_names(&self) -> Vec<String> {
        self.local.keys().cloned().collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.local.is_empty()
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// Replace the storage layer wholesale.
    pub fn replace_storage(&mut self, row: Row) {
        self.storage = Some(row);
    }

    /// Merge values into the storage layer, creating it if absent.
    pub fn merge_storage(&mut self, row: Row) {
        let storage = self.storage.get_or_insert_with(Row::new);
        for (name, value) in row {
            storage.insert(name, value);
        }
    }

    pub fn clear_storage(&mut self) {
        self.storage = None;
    }
}
