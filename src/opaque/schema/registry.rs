//! Process-wide model type registry.
//!
//! Every model type gets a [`ModelId`] when it is defined. The registry keeps a
//! parent link per type plus everything registered against it: attribute
//! definitions, custom accessors, scopes and the adapter.
//!
//! Merged schemas and accessor tables are resolved lazily on first access and
//! cached per type. Only `add_attribute` and `accessor` registrations drop the
//! cache; nothing resets it implicitly.

use super::Schema;
use crate::adapter::Adapter;
use crate::attributes::AttributeDefinition;
use crate::model::{Accessor, AccessorTable};
use crate::query::Scope;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

/// Identity of a registered model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The resolved view of a model type: merged schema plus accessor table.
#[derive(Debug)]
pub struct ResolvedModel {
    pub schema: Arc<Schema>,
    pub accessors: AccessorTable,
}

struct TypeEntry {
    name: String,
    parent: Option<ModelId>,
    adapter: Option<Arc<dyn Adapter>>,
    scopes: HashMap<String, Scope>,
}

struct Registration<T> {
    owner: ModelId,
    name: String,
    item: T,
}

#[derive(Default)]
pub(crate) struct Registry {
    types: Vec<TypeEntry>,
    attributes: Vec<Registration<AttributeDefinition>>,
    accessors: Vec<Registration<Accessor>>,
    resolved: HashMap<ModelId, Arc<ResolvedModel>>,
}

impl Registry {
    pub fn define(&mut self, name: &str, parent: Option<ModelId>) -> ModelId {
        let id = ModelId(self.types.len());
        self.types.push(TypeEntry {
            name: name.to_string(),
            parent,
            adapter: None,
            scopes: HashMap::new(),
        });
        id
    }

    pub fn name(&self, id: ModelId) -> &str {
        &self.types[id.0].name
    }

    pub fn parent(&self, id: ModelId) -> Option<ModelId> {
        self.types[id.0].parent
    }

    /// The type and its ancestors, root first.
    pub fn lineage(&self, id: ModelId) -> Vec<ModelId> {
        let mut lineage = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            lineage.push(parent);
            current = parent;
        }
        lineage.reverse();
        lineage
    }

    pub fn add_attribute(&mut self, owner: ModelId, name: &str, definition: AttributeDefinition) {
        self.attributes.push(Registration {
            owner,
            name: name.to_string(),
            item: definition,
        });
        self.resolved.clear();
    }

    pub fn add_accessor(&mut self, owner: ModelId, name: &str, accessor: Accessor) {
        self.accessors.push(Registration {
            owner,
            name: name.to_string(),
            item: accessor,
        });
        self.resolved.clear();
    }

    pub fn set_adapter(&mut self, id: ModelId, adapter: Arc<dyn Adapter>) {
        self.types[id.0].adapter = Some(adapter);
    }

    /// The adapter set on the type or its nearest ancestor.
    pub fn adapter(&self, id: ModelId) -> Option<Arc<dyn Adapter>> {
        self.nearest(id, |entry| entry.adapter.clone())
    }

    pub fn add_scope(&mut self, id: ModelId, name: &str, scope: Scope) {
        self.types[id.0].scopes.insert(name.to_string(), scope);
    }

    /// The scope registered on the type or its nearest ancestor.
    pub fn scope(&self, id: ModelId, name: &str) -> Option<Scope> {
        self.nearest(id, |entry| entry.scopes.get(name).cloned())
    }

    fn nearest<T>(&self, id: ModelId, find: impl Fn(&TypeEntry) -> Option<T>) -> Option<T> {
        let mut current = Some(id);
        while let Some(id) = current {
            let entry = &self.types[id.0];
            if let Some(found) = find(entry) {
                return Some(found);
            }
            current = entry.parent;
        }
        None
    }

    pub fn cached(&self, id: ModelId) -> Option<Arc<ResolvedModel>> {
        self.resolved.get(&id).cloned()
    }

    pub fn resolve(&mut self, id: ModelId) -> Arc<ResolvedModel> {
        if let Some(resolved) = self.cached(id) {
            return resolved;
        }

        let lineage = self.lineage(id);
        let mut schema = Schema::new(self.name(id));
        for owner in &lineage {
            for registration in self.attributes.iter().filter(|r| r.owner == *owner) {
                schema.apply(&registration.name, registration.item.clone());
            }
        }

        let mut accessors = AccessorTable::default();
        for owner in &lineage {
            for registration in self.accessors.iter().filter(|r| r.owner == *owner) {
                if schema.has(&registration.name) {
                    accessors.insert(&registration.name, registration.item.clone());
                }
            }
        }

        tracing::trace!(
            model = self.name(id),
            attributes = schema.len(),
            overrides = accessors.len(),
            "resolved schema"
        );

        let resolved = Arc::new(ResolvedModel {
            schema: Arc::new(schema),
            accessors,
        });
        self.resolved.insert(id, resolved.clone());
        resolved
    }
}

pub(crate) fn read<R>(f: impl FnOnce(&Registry) -> R) -> R {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

pub(crate) fn write<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut registry)
}

/// Resolve a model type, taking the write lock only on a cache miss.
pub(crate) fn resolved(id: ModelId) -> Arc<ResolvedModel> {
    if let Some(resolved) = read(|registry| registry.cached(id)) {
        return resolved;
    }
    write(|registry| registry.resolve(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeOptions;
    use serde_json::json;

    fn definition(default: i64) -> AttributeDefinition {
        AttributeOptions::new().default_value(default).into()
    }

    #[test]
    fn lineage_is_root_first() {
        let mut registry = Registry::default();
        let base = registry.define("Base", None);
        let middle = registry.define("Middle", Some(base));
        let leaf = registry.define("Leaf", Some(middle));

        assert_eq!(registry.lineage(leaf), vec![base, middle, leaf]);
        assert_eq!(registry.lineage(base), vec![base]);
    }

    #[test]
    fn descendants_override_ancestors() {
        let mut registry = Registry::default();
        let base = registry.define("Base", None);
        let leaf = registry.define("Leaf", Some(base));

        // Registration order does not matter, lineage order does.
        registry.add_attribute(leaf, "a", definition(2));
        registry.add_attribute(base, "a", definition(1));
        registry.add_attribute(base, "b", definition(1));

        let schema = registry.resolve(leaf).schema.clone();
        assert_eq!(schema.get("a").unwrap().default, Some(json!(2)));
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["a", "b"]);

        let base_schema = registry.resolve(base).schema.clone();
        assert_eq!(base_schema.get("a").unwrap().default, Some(json!(1)));
    }

    #[test]
    fn siblings_do_not_share_attributes() {
        let mut registry = Registry::default();
        let base = registry.define("Base", None);
        let left = registry.define("Left", Some(base));
        let right = registry.define("Right", Some(base));
        registry.add_attribute(left, "only_left", definition(0));

        assert!(registry.resolve(left).schema.has("only_left"));
        assert!(!registry.resolve(right).schema.has("only_left"));
    }

    #[test]
    fn primary_key_across_lineage() {
        let mut registry = Registry::default();
        let base = registry.define("Base", None);
        let leaf = registry.define("Leaf", Some(base));
        registry.add_attribute(base, "id", AttributeOptions::new().primary_key().into());
        registry.add_attribute(leaf, "uuid", AttributeOptions::new().primary_key().into());

        assert_eq!(registry.resolve(base).schema.primary_key().unwrap(), "id");
        assert_eq!(registry.resolve(leaf).schema.primary_key().unwrap(), "uuid");
    }

    #[test]
    fn registration_invalidates_cache() {
        let mut registry = Registry::default();
        let item = registry.define("Item", None);
        registry.add_attribute(item, "a", definition(0));

        let first = registry.resolve(item);
        assert!(Arc::ptr_eq(&first, &registry.resolve(item)));

        registry.add_attribute(item, "b", definition(0));
        let second = registry.resolve(item);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.schema.has("b"));
    }

    #[test]
    fn accessors_only_cover_schema_names() {
        let mut registry = Registry::default();
        let item = registry.define("Item", None);
        registry.add_attribute(item, "a", definition(0));
        registry.add_accessor(item, "a", Accessor::new());
        registry.add_accessor(item, "ghost", Accessor::new());

        let resolved = registry.resolve(item);
        assert!(resolved.accessors.get("a").is_some());
        assert!(resolved.accessors.get("ghost").is_none());
    }

    #[test]
    fn adapter_and_scope_lookups_walk_up() {
        use crate::adapter::NoOpAdapter;

        let mut registry = Registry::default();
        let base = registry.define("Base", None);
        let leaf = registry.define("Leaf", Some(base));
        assert!(registry.adapter(leaf).is_none());

        registry.set_adapter(base, Arc::new(NoOpAdapter));
        registry.add_scope(
            base,
            "recent",
            Arc::new(|q: &crate::query::QueryBuilder, _: &[serde_json::Value]| q.clone()),
        );

        assert!(registry.adapter(leaf).is_some());
        assert!(registry.scope(leaf, "recent").is_some());
        assert!(registry.scope(leaf, "missing").is_none());
    }
}
