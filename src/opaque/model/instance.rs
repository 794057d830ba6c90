//! Model instances.
//!
//! An [`Instance`] pairs an [`AttributeStore`] with the resolved schema of its
//! type. Reads resolve `local`, then `storage`, then the schema default.
//!
//! ## Save Protocol
//!
//! [`Instance::save_only`] is the single write path:
//!
//! 1. Collect the named attributes, read raw and serialized through the schema.
//! 2. Reset those attributes in `local` before calling the adapter.
//! 3. Persistent instances call `update` with their own query; a returned row
//!    replaces the storage layer. With no row returned, the saved values are
//!    merged into storage instead.
//! 4. Other instances call `insert`; a returned row replaces the storage layer,
//!    a bare key is written to it along with the saved values.
//! 5. Reset the named attributes again, now against the refreshed layers.
//!
//! `save()` flushes every dirty attribute, so the instance is never dirty after
//! a successful `save()`.

use super::accessor::{Getter, Setter};
use super::ModelType;
use crate::adapter::Inserted;
use crate::attributes::{AccessOptions, AttributeStore, Row, Value};
use crate::error::Result;
use crate::query::QueryBuilder;
use crate::schema::registry::ResolvedModel;
use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Instance {
    model: ModelType,
    resolved: Arc<ResolvedModel>,
    attributes: AttributeStore,
}

impl Instance {
    /// A non-persistent instance with every defined default written through
    /// the attribute's `set` transform.
    pub(crate) fn new(model: ModelType) -> Self {
        let resolved = model.resolved();
        let mut attributes = AttributeStore::new();
        for (name, definition) in resolved.schema.iter() {
            if let Some(default) = &definition.default {
                attributes.write_local(name, definition.apply_set(default.clone()));
            }
        }
        Self {
            model,
            resolved,
            attributes,
        }
    }

    pub fn model(&self) -> ModelType {
        self.model
    }

    pub fn schema(&self) -> &Schema {
        &self.resolved.schema
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema().has(name)
    }

    pub fn get_attribute(&self, name: &str, options: AccessOptions) -> Result<Value> {
        let definition = self.schema().definition(name)?;
        let value = self
            .attributes
            .resolve(name)
            .cloned()
            .or_else(|| definition.default.clone())
            .unwrap_or(Value::Null);
        if options.raw {
            Ok(value)
        } else {
            Ok(definition.apply_get(value))
        }
    }

    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        options: AccessOptions,
    ) -> Result<&mut Self> {
        let definition = self.schema().definition(name)?;
        let value = value.into();
        let value = if options.raw {
            value
        } else {
            definition.apply_set(value)
        };
        self.attributes.write_local(name, value);
        Ok(self)
    }

    /// Set every entry of `data` in order. Entries applied before a failing
    /// one stay applied.
    pub fn set_attributes(&mut self, data: Row, options: AccessOptions) -> Result<&mut Self> {
        for (name, value) in data {
            self.set_attribute(&name, value, options)?;
        }
        Ok(self)
    }

    /// All schema attributes, in schema order.
    pub fn get_attributes(&self, options: AccessOptions) -> Result<Row> {
        let names: Vec<String> = self.schema().names().map(str::to_string).collect();
        self.pick_attributes(&names, options)
    }

    pub fn pick_attributes<S: AsRef<str>>(&self, names: &[S], options: AccessOptions) -> Result<Row> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                Ok((name.to_string(), self.get_attribute(name, options)?))
            })
            .collect()
    }

    /// Property read, through the type's accessor override if there is one.
    pub fn get(&self, name: &str) -> Result<Value> {
        let getter: Option<Getter> = self.resolved.accessors.getter(name);
        match getter {
            Some(getter) => getter(self),
            None => self.get_attribute(name, AccessOptions::default()),
        }
    }

    /// Property write, through the type's accessor override if there is one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let setter: Option<Setter> = self.resolved.accessors.setter(name);
        match setter {
            Some(setter) => {
                setter(self, value.into())?;
                Ok(self)
            }
            None => self.set_attribute(name, value, AccessOptions::default()),
        }
    }

    /// Property read converted into a concrete type.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get(name)?)?)
    }

    pub fn set_as<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        self.set(name, value)
    }

    /// All attributes, read through their `get` transforms, as a struct.
    pub fn to_struct<T: DeserializeOwned>(&self) -> Result<T> {
        let row = self.get_attributes(AccessOptions::default())?;
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    /// Every schema attribute, read raw and serialized for the adapter.
    pub fn serialize(&self) -> Result<Row> {
        Ok(self.schema().serialize(self.get_attributes(AccessOptions::raw())?))
    }

    /// Drop local changes for the named attributes. Persistent instances fall
    /// back to storage; others get the default again. Unknown names are
    /// ignored.
    pub fn reset_only<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = self.resolved.clone();
        let persistent = self.is_persistent();
        for name in names {
            let name = name.as_ref();
            let Some(definition) = resolved.schema.get(name) else {
                continue;
            };
            match (&definition.default, persistent) {
                (Some(default), false) => {
                    self.attributes.write_local(name, definition.apply_set(default.clone()));
                }
                _ => {
                    self.attributes.discard_local(name);
                }
            }
        }
        self
    }

    pub fn reset_all(&mut self) -> &mut Self {
        let dirty = self.attributes.dirty_names();
        self.reset_only(dirty)
    }

    /// Replace the storage layer with a deserialized wire-format row. The local
    /// layer is left untouched.
    pub fn set_row(&mut self, row: Row) -> &mut Self {
        let row = self.schema().deserialize(row);
        self.attributes.replace_storage(row);
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.attributes.is_persistent()
    }

    pub fn is_dirty(&self) -> bool {
        self.attributes.is_dirty()
    }

    pub fn dirty_names(&self) -> Vec<String> {
        self.attributes.dirty_names()
    }

    pub fn primary_key_value(&self) -> Result<Value> {
        let primary_key = self.schema().primary_key()?;
        self.get_attribute(primary_key, AccessOptions::default())
    }

    pub fn set_primary_key_value(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let primary_key = self.schema().primary_key()?.to_string();
        self.set_attribute(&primary_key, value, AccessOptions::default())
    }

    /// The model's query narrowed to this instance's primary key.
    pub fn own_query(&self) -> Result<QueryBuilder> {
        self.model.query().for_key(self.primary_key_value()?)
    }

    pub fn save(&mut self) -> Result<&mut Self> {
        self.save_all()
    }

    pub fn save_all(&mut self) -> Result<&mut Self> {
        let dirty = self.attributes.dirty_names();
        self.save_only(dirty)
    }

    pub fn save_only<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|name| name.as_ref().to_string()).collect();
        let to_insert = self.schema().serialize(self.pick_attributes(&names, AccessOptions::raw())?);
        let adapter = self.model.adapter()?;

        self.reset_only(&names);

        if self.is_persistent() {
            let query = self.own_query()?;
            tracing::debug!(model = %self.model.name(), query = %query.query(), "updating instance");
            let mut rows = adapter.update(&self.model, query.query(), to_insert.clone())?;
            if rows.is_empty() {
                let saved = self.schema().deserialize(to_insert);
                self.attributes.merge_storage(saved);
            } else {
                self.set_row(rows.swap_remove(0));
            }
        } else {
            tracing::debug!(model = %self.model.name(), "inserting instance");
            match adapter.insert(&self.model, to_insert.clone())? {
                Inserted::Row(row) => {
                    self.set_row(row);
                }
                Inserted::Key(key) => {
                    let primary_key = self.schema().primary_key()?.to_string();
                    let mut saved = to_insert;
                    saved.insert(primary_key, key);
                    let saved = self.schema().deserialize(saved);
                    self.attributes.merge_storage(saved);
                }
            }
        }

        self.reset_only(&names);
        Ok(self)
    }

    /// Set `data`, then save exactly its keys.
    pub fn set_and_save_attributes(&mut self, data: Row) -> Result<&mut Self> {
        let names: Vec<String> = data.keys().cloned().collect();
        self.set_attributes(data, AccessOptions::default())?;
        self.save_only(names)
    }

    /// Delete this instance's row through the adapter. The storage layer is
    /// kept, so the instance still reads its last persisted values.
    pub fn delete(&self) -> Result<()> {
        let query = self.own_query()?;
        tracing::debug!(model = %self.model.name(), query = %query.query(), "deleting instance");
        self.model.adapter()?.delete(&self.model, query.query())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.schema().model())
            .field("local", self.attributes.local())
            .field("storage", &self.attributes.storage())
            .finish()
    }
}
