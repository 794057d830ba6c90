use super::key_for;
use crate::attributes::{AccessOptions, Row, Value};
use crate::error::Result;
use crate::model::{Instance, ModelType};
use crate::query::QueryBuilder;

/// Related rows hold the owner's `local_key` value in `foreign_key`.
#[derive(Debug, Clone)]
pub struct HasMany {
    related: ModelType,
    foreign_key: Option<String>,
    local_key: Option<String>,
}

impl HasMany {
    pub fn new(related: ModelType) -> Self {
        Self {
            related,
            foreign_key: None,
            local_key: None,
        }
    }

    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    pub fn related(&self) -> ModelType {
        self.related
    }

    pub fn resolved_foreign_key(&self, owner: &Instance) -> String {
        match &self.foreign_key {
            Some(key) => key.clone(),
            None => key_for(&owner.model().name()),
        }
    }

    pub fn resolved_local_key(&self, owner: &Instance) -> Result<String> {
        match &self.local_key {
            Some(key) => Ok(key.clone()),
            None => Ok(owner.schema().primary_key()?.to_string()),
        }
    }

    fn owner_value(&self, owner: &Instance) -> Result<Value> {
        owner.get_attribute(&self.resolved_local_key(owner)?, AccessOptions::default())
    }

    fn with_owner(&self, owner: &Instance, mut data: Row) -> Result<Row> {
        data.insert(self.resolved_foreign_key(owner), self.owner_value(owner)?);
        Ok(data)
    }

    pub fn query(&self, owner: &Instance) -> Result<QueryBuilder> {
        let value = self.owner_value(owner)?;
        Ok(self.related.query().where_((self.resolved_foreign_key(owner), value)))
    }

    pub fn exec(&self, owner: &Instance) -> Result<Vec<Instance>> {
        self.query(owner)?.get()
    }

    /// A new related instance pointing at `owner`.
    pub fn make(&self, owner: &Instance, data: Row) -> Result<Instance> {
        self.related.make(self.with_owner(owner, data)?)
    }

    pub fn create(&self, owner: &Instance, data: Row) -> Result<Instance> {
        self.related.create(self.with_owner(owner, data)?)
    }

    /// Point `related` at `owner` and save it. A persistent instance only
    /// saves the foreign key.
    pub fn save<'a>(&self, owner: &Instance, related: &'a mut Instance) -> Result<&'a mut Instance> {
        let foreign_key = self.resolved_foreign_key(owner);
        related.set_attribute(&foreign_key, self.owner_value(owner)?, AccessOptions::default())?;
        if related.is_persistent() {
            related.save_only([foreign_key])
        } else {
            related.save()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeOptions;
    use crate::test_utils::{row, AdapterCall, RecordingAdapter};
    use serde_json::json;
    use std::sync::Arc;

    fn models(prefix: &str) -> (ModelType, ModelType, Arc<RecordingAdapter>) {
        let adapter = Arc::new(RecordingAdapter::new());
        let post = ModelType::define(&format!("{}Post", prefix));
        post.add_attribute("id", AttributeOptions::new().default_value("").primary_key())
            .add_attribute("slug", AttributeOptions::new().default_value(""))
            .set_adapter(adapter.clone());
        let comment = ModelType::define(&format!("{}Comment", prefix));
        comment
            .add_attribute("id", AttributeOptions::new().default_value("").primary_key())
            .add_attribute(&key_for(&post.name()), AttributeOptions::new())
            .add_attribute("postSlug", AttributeOptions::new())
            .add_attribute("body", AttributeOptions::new().default_value(""))
            .set_adapter(adapter.clone());
        (post, comment, adapter)
    }

    #[test]
    fn query_by_owner_key() {
        let (post, comment, adapter) = models("Query");
        let owner = post.from_row(row(json!({"id": "p1", "slug": "hello"})));

        HasMany::new(comment).exec(&owner).unwrap();
        match adapter.last_call() {
            Some(AdapterCall::Read { query, .. }) => assert_eq!(
                query.to_value(),
                json!({"key": "queryPostId", "comparator": "==", "value": "p1"})
            ),
            other => panic!("expected a read, got {:?}", other),
        }

        let by_slug = HasMany::new(comment).foreign_key("postSlug").local_key("slug");
        by_slug.exec(&owner).unwrap();
        match adapter.last_call() {
            Some(AdapterCall::Read { query, .. }) => assert_eq!(
                query.to_value(),
                json!({"key": "postSlug", "comparator": "==", "value": "hello"})
            ),
            other => panic!("expected a read, got {:?}", other),
        }
    }

    #[test]
    fn make_and_create_set_the_foreign_key() {
        let (post, comment, adapter) = models("Make");
        let owner = post.from_row(row(json!({"id": "p1"})));
        let relation = HasMany::new(comment);

        let made = relation.make(&owner, row(json!({"body": "hi"}))).unwrap();
        assert_eq!(made.get("makePostId").unwrap(), json!("p1"));
        assert!(!made.is_persistent());

        let created = relation.create(&owner, row(json!({"body": "hi"}))).unwrap();
        assert!(created.is_persistent());
        match adapter.last_call() {
            Some(AdapterCall::Insert { row: data, .. }) => {
                assert_eq!(data.get("makePostId"), Some(&json!("p1")));
                assert_eq!(data.get("body"), Some(&json!("hi")));
            }
            other => panic!("expected an insert, got {:?}", other),
        }
    }

    #[test]
    fn save_persistent_only_writes_foreign_key() {
        let (post, comment, adapter) = models("Save");
        let owner = post.from_row(row(json!({"id": "p2"})));
        let relation = HasMany::new(comment);

        let mut existing = comment.from_row(row(json!({"id": "c1", "body": "old"})));
        existing.set("body", "edited").unwrap();
        relation.save(&owner, &mut existing).unwrap();

        match adapter.last_call() {
            Some(AdapterCall::Update { row: data, .. }) => {
                assert_eq!(data, row(json!({"savePostId": "p2"})));
            }
            other => panic!("expected an update, got {:?}", other),
        }
        assert_eq!(existing.dirty_names(), vec!["body"]);

        let mut fresh = comment.make(row(json!({"body": "new"}))).unwrap();
        relation.save(&owner, &mut fresh).unwrap();
        assert!(matches!(adapter.last_call(), Some(AdapterCall::Insert { .. })));
        assert!(!fresh.is_dirty());
    }
}
