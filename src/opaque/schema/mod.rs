//! # Schemas
//!
//! A [`Schema`] is the merged, ordered set of attribute definitions for one model
//! type, including everything inherited from its ancestors. Schemas are built by
//! the [`registry`] on first access and shared behind an `Arc`; they never change
//! once built. Registering another attribute produces a new schema on the next
//! access instead.
//!
//! ## Merge Order
//!
//! Definitions are applied ancestor first, then in registration order within each
//! type. A later definition for an existing name replaces the earlier one but
//! keeps its position, so descendants override ancestors.
//!
//! ## Primary Key
//!
//! The primary key is the attribute flagged `primary_key` whose definition was
//! applied last. With none flagged, [`Schema::primary_key`] fails with
//! [`OpaqueError::NoPrimaryKey`].
//!
//! ## Unknown Attributes
//!
//! The (de)serialization helpers pass unknown names through untouched so extra
//! fields returned by an adapter survive hydration. Everything that reads or
//! writes an instance attribute rejects unknown names instead.

pub mod registry;

use crate::attributes::{AttributeDefinition, Row, Value};
use crate::error::{OpaqueError, Result};

#[derive(Debug, Clone)]
struct SchemaEntry {
    name: String,
    definition: AttributeDefinition,
    applied: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    model: String,
    entries: Vec<SchemaEntry>,
    applied: usize,
}

impl Schema {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entries: Vec::new(),
            applied: 0,
        }
    }

    /// Apply a definition, overwriting any existing one with the same name.
    pub fn apply(&mut self, name: &str, definition: AttributeDefinition) {
        self.applied += 1;
        let applied = self.applied;
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.definition = definition;
                entry.applied = applied;
            }
            None => self.entries.push(SchemaEntry {
                name: name.to_string(),
                definition,
                applied,
            }),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.definition)
    }

    /// Like [`Schema::get`], failing with `UnknownAttribute`.
    pub fn definition(&self, name: &str) -> Result<&AttributeDefinition> {
        self.get(name).ok_or_else(|| OpaqueError::UnknownAttribute {
            model: self.model.clone(),
            attribute: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeDefinition)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), &entry.definition))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn primary_key(&self) -> Result<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.definition.primary_key)
            .max_by_key(|entry| entry.applied)
            .map(|entry| entry.name.as_str())
            .ok_or_else(|| OpaqueError::NoPrimaryKey(self.model.clone()))
    }

    pub fn serialize_attribute(&self, key: &str, value: Value) -> Value {
        match self.get(key) {
            Some(definition) => definition.serialize(value),
            None => value,
        }
    }

    pub fn deserialize_attribute(&self, key: &str, value: Value) -> Value {
        match self.get(key) {
            Some(definition) => definition.deserialize(value),
            None => value,
        }
    }

    pub fn serialize(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(key, value)| {
                let value = self.serialize_attribute(&key, value);
                (key, value)
            })
            .collect()
    }

    pub fn deserialize(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(key, value)| {
                let value = self.deserialize_attribute(&key, value);
                (key, value)
            })
            .collect()
    }
}
