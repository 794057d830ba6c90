use super::key_for;
use crate::attributes::AccessOptions;
use crate::error::Result;
use crate::model::{Instance, ModelType};
use crate::query::QueryBuilder;
use std::fmt;
use std::sync::Arc;

type DefaultFactory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// The owner holds the related row's primary key in `local_key`, which
/// defaults to the owner's type name plus `Id`.
#[derive(Clone)]
pub struct BelongsTo {
    related: ModelType,
    local_key: Option<String>,
    default: Option<DefaultFactory>,
}

impl BelongsTo {
    pub fn new(related: ModelType) -> Self {
        Self {
            related,
            local_key: None,
            default: None,
        }
    }

    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    /// Instance returned by [`BelongsTo::exec`] when nothing is found.
    pub fn with_default(mut self, factory: impl Fn() -> Instance + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(factory));
        self
    }

    pub fn related(&self) -> ModelType {
        self.related
    }

    pub fn resolved_local_key(&self, owner: &Instance) -> String {
        match &self.local_key {
            Some(key) => key.clone(),
            None => key_for(&owner.model().name()),
        }
    }

    pub fn query(&self, owner: &Instance) -> Result<QueryBuilder> {
        let key = owner.get_attribute(&self.resolved_local_key(owner), AccessOptions::default())?;
        self.related.query().for_key(key)
    }

    pub fn exec(&self, owner: &Instance) -> Result<Option<Instance>> {
        let found = self.query(owner)?.first()?;
        Ok(found.or_else(|| self.default.as_ref().map(|factory| factory())))
    }

    /// Point `owner` at `related`. Nothing is saved.
    pub fn associate<'a>(&self, owner: &'a mut Instance, related: &Instance) -> Result<&'a mut Instance> {
        let key = related.primary_key_value()?;
        let local_key = self.resolved_local_key(owner);
        owner.set_attribute(&local_key, key, AccessOptions::default())
    }
}

impl fmt::Debug for BelongsTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo")
            .field("related", &self.related)
            .field("local_key", &self.local_key)
            .field("default", &self.default.is_some())
            .finish()
    }
}
