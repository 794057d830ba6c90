//! # Model Types
//!
//! A [`ModelType`] is a cheap, copyable handle to a type registered in the
//! process-wide registry. Types are declared once, usually in a `Lazy` static,
//! and everything about them is registered explicitly:
//!
//! ```ignore
//! static ITEM: Lazy<ModelType> = Lazy::new(|| {
//!     let item = ModelType::define("Item");
//!     item.add_attribute("id", AttributeOptions::new().default_value("").primary_key())
//!         .add_attribute("price", AttributeOptions::new().default_value(0))
//!         .set_adapter(Arc::new(InMemoryAdapter::new()));
//!     item
//! });
//!
//! let item = ITEM.create(to_row(&json!({"price": 12.9}))?)?;
//! let found = ITEM.find(item.primary_key_value()?)?;
//! ```
//!
//! ## Inheritance
//!
//! [`ModelType::extend`] defines a child type. The child sees every attribute,
//! accessor, scope and adapter of its ancestors and may override any of them.
//!
//! ## Instances
//!
//! Instances come from [`ModelType::make`] (new, non-persistent) or
//! [`ModelType::from_row`] (hydrated from an adapter row, persistent and clean).
//! See [`Instance`] for attribute access and the save protocol.

mod accessor;
mod instance;

pub use accessor::{Accessor, AccessorTable, Getter, Setter};
pub use instance::Instance;

use crate::adapter::Adapter;
use crate::attributes::{AttributeOptions, Row, Value};
use crate::error::{OpaqueError, Result};
use crate::query::QueryBuilder;
use crate::schema::registry::{self, ModelId, ResolvedModel};
use crate::schema::Schema;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelType {
    id: ModelId,
}

impl ModelType {
    /// Register a new root model type.
    pub fn define(name: &str) -> Self {
        let id = registry::write(|registry| registry.define(name, None));
        Self { id }
    }

    /// Register a new model type inheriting from this one.
    pub fn extend(&self, name: &str) -> Self {
        let id = registry::write(|registry| registry.define(name, Some(self.id)));
        Self { id }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> String {
        registry::read(|registry| registry.name(self.id).to_string())
    }

    pub fn parent(&self) -> Option<ModelType> {
        registry::read(|registry| registry.parent(self.id)).map(|id| Self { id })
    }

    pub fn add_attribute(&self, name: &str, options: AttributeOptions) -> &Self {
        registry::write(|registry| registry.add_attribute(self.id, name, options.into()));
        self
    }

    /// Override the property accessor of an attribute for this type and its
    /// descendants.
    pub fn accessor(&self, name: &str, accessor: Accessor) -> &Self {
        registry::write(|registry| registry.add_accessor(self.id, name, accessor));
        self
    }

    /// Register a named query modifier, see [`QueryBuilder::apply`].
    pub fn scope(
        &self,
        name: &str,
        scope: impl Fn(&QueryBuilder, &[Value]) -> QueryBuilder + Send + Sync + 'static,
    ) -> &Self {
        registry::write(|registry| registry.add_scope(self.id, name, Arc::new(scope)));
        self
    }

    pub fn set_adapter(&self, adapter: Arc<dyn Adapter>) -> &Self {
        registry::write(|registry| registry.set_adapter(self.id, adapter));
        self
    }

    pub fn adapter(&self) -> Result<Arc<dyn Adapter>> {
        registry::read(|registry| registry.adapter(self.id))
            .ok_or_else(|| OpaqueError::NoAdapter(self.name()))
    }

    pub(crate) fn resolved(&self) -> Arc<ResolvedModel> {
        registry::resolved(self.id)
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.resolved().schema.clone()
    }

    pub fn primary_key(&self) -> Result<String> {
        self.schema().primary_key().map(str::to_string)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema().has(name)
    }

    pub fn serialize_attribute(&self, key: &str, value: Value) -> Value {
        self.schema().serialize_attribute(key, value)
    }

    pub fn deserialize_attribute(&self, key: &str, value: Value) -> Value {
        self.schema().deserialize_attribute(key, value)
    }

    pub fn serialize(&self, row: Row) -> Row {
        self.schema().serialize(row)
    }

    pub fn deserialize(&self, row: Row) -> Row {
        self.schema().deserialize(row)
    }

    /// A fresh instance holding only the defaults.
    pub fn make_default(&self) -> Instance {
        Instance::new(*self)
    }

    /// A fresh, non-persistent instance with `data` assigned over the defaults.
    pub fn make(&self, data: Row) -> Result<Instance> {
        let mut instance = self.make_default();
        instance.set_attributes(data, Default::default())?;
        Ok(instance)
    }

    /// [`ModelType::make`], then save.
    pub fn create(&self, data: Row) -> Result<Instance> {
        let mut instance = self.make(data)?;
        instance.save()?;
        Ok(instance)
    }

    /// Hydrate an instance from a wire-format row. The instance is persistent
    /// and not dirty.
    pub fn from_row(&self, row: Row) -> Instance {
        let mut instance = self.make_default();
        instance.set_row(row);
        instance.reset_all();
        instance
    }

    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(*self)
    }

    pub fn find(&self, key: impl Into<Value>) -> Result<Option<Instance>> {
        self.query().for_key(key)?.first()
    }

    pub fn find_or_fail(&self, key: impl Into<Value>) -> Result<Instance> {
        let key = key.into();
        self.find(key.clone())?.ok_or_else(|| OpaqueError::NotFound {
            model: self.name(),
            key: display_key(&key),
        })
    }
}

pub(crate) fn display_key(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        other => other.to_string(),
    }
}
