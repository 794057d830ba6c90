//! Custom property accessors.
//!
//! By default `Instance::get` / `Instance::set` route straight to the attribute
//! store. A type can override either side for a schema attribute with
//! [`ModelType::accessor`](super::ModelType::accessor). Overrides are inherited
//! and the nearest one in the type's lineage wins. A missing side falls back to
//! the store-routed default.

use super::Instance;
use crate::attributes::Value;
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Getter = Arc<dyn Fn(&Instance) -> Result<Value> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut Instance, Value) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Accessor {
    pub(crate) get: Option<Getter>,
    pub(crate) set: Option<Setter>,
}

impl Accessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(mut self, getter: impl Fn(&Instance) -> Result<Value> + Send + Sync + 'static) -> Self {
        self.get = Some(Arc::new(getter));
        self
    }

    pub fn set(
        mut self,
        setter: impl Fn(&mut Instance, Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.set = Some(Arc::new(setter));
        self
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// Accessor overrides of one resolved model type, keyed by attribute name.
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    overrides: HashMap<String, Accessor>,
}

impl AccessorTable {
    pub fn insert(&mut self, name: &str, accessor: Accessor) {
        self.overrides.insert(name.to_string(), accessor);
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.overrides.get(name)
    }

    pub fn getter(&self, name: &str) -> Option<Getter> {
        self.get(name).and_then(|accessor| accessor.get.clone())
    }

    pub fn setter(&self, name: &str) -> Option<Setter> {
        self.get(name).and_then(|accessor| accessor.set.clone())
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
