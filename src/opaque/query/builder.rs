use super::normalized::{Comparator, Direction, NormalizedQuery, OrderBy, QueryNode};
use crate::attributes::{Row, Value};
use crate::error::{OpaqueError, Result};
use crate::model::{Instance, ModelType};
use crate::schema::registry;

/// A single comparison handed to [`QueryBuilder::where_`].
///
/// `(key, value)` compares with `==`, `(key, comparator, value)` with the given
/// comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub key: String,
    pub comparator: Comparator,
    pub value: Value,
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Condition {
    fn from((key, value): (K, V)) -> Self {
        Self {
            key: key.into(),
            comparator: Comparator::Eq,
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, Comparator, V)> for Condition {
    fn from((key, comparator, value): (K, Comparator, V)) -> Self {
        Self {
            key: key.into(),
            comparator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Connector {
    And,
    Or,
}

/// An immutable query over one model type. Every method returns a new builder.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: ModelType,
    query: NormalizedQuery,
}

impl QueryBuilder {
    pub fn new(model: ModelType) -> Self {
        Self::with_query(model, NormalizedQuery::default())
    }

    pub fn with_query(model: ModelType, query: NormalizedQuery) -> Self {
        Self { model, query }
    }

    pub fn model(&self) -> ModelType {
        self.model
    }

    pub fn query(&self) -> &NormalizedQuery {
        &self.query
    }

    /// The filter without the root-only modifiers.
    pub fn sub_query(&self) -> QueryNode {
        self.query.filter.clone()
    }

    fn fresh(&self) -> Self {
        Self::new(self.model)
    }

    fn with_filter(&self, filter: QueryNode) -> Self {
        let mut query = self.query.clone();
        query.filter = filter;
        Self::with_query(self.model, query)
    }

    fn connect(&self, connector: Connector, node: QueryNode) -> Self {
        let filter = match (connector, self.sub_query()) {
            (Connector::And, QueryNode::And(mut nodes)) => {
                nodes.push(node);
                QueryNode::And(nodes)
            }
            (Connector::Or, QueryNode::Or(mut nodes)) => {
                nodes.push(node);
                QueryNode::Or(nodes)
            }
            (_, QueryNode::Empty) => node,
            (Connector::And, base) => QueryNode::And(vec![base, node]),
            (Connector::Or, base) => QueryNode::Or(vec![base, node]),
        };
        self.with_filter(filter)
    }

    fn make_comparison(&self, condition: Condition) -> QueryNode {
        let schema = self.model.schema();
        let Condition {
            key,
            comparator,
            value,
        } = condition;
        let value = match (comparator, value) {
            (Comparator::In, Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| schema.serialize_attribute(&key, item))
                    .collect(),
            ),
            (_, value) => schema.serialize_attribute(&key, value),
        };
        QueryNode::comparison(key, comparator, value)
    }

    fn modified(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> QueryNode {
        modifier(&self.fresh()).sub_query()
    }

    pub fn where_(&self, condition: impl Into<Condition>) -> Self {
        let node = self.make_comparison(condition.into());
        self.connect(Connector::And, node)
    }

    pub fn and_where(&self, condition: impl Into<Condition>) -> Self {
        self.where_(condition)
    }

    /// AND-compose the filter built by `modifier` on a fresh builder.
    pub fn where_with(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> Self {
        self.and(modifier)
    }

    pub fn or_where(&self, condition: impl Into<Condition>) -> Self {
        let condition = condition.into();
        self.or(|q| q.where_(condition))
    }

    pub fn or_where_with(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> Self {
        self.or(modifier)
    }

    pub fn where_not(&self, condition: impl Into<Condition>) -> Self {
        self.and_where_not(condition)
    }

    pub fn and_where_not(&self, condition: impl Into<Condition>) -> Self {
        let node = self.fresh().where_(condition).sub_query();
        self.connect(Connector::And, QueryNode::negate(node))
    }

    pub fn or_where_not(&self, condition: impl Into<Condition>) -> Self {
        let node = self.fresh().where_(condition).sub_query();
        self.connect(Connector::Or, QueryNode::negate(node))
    }

    pub fn and(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> Self {
        let node = self.modified(modifier);
        self.connect(Connector::And, node)
    }

    pub fn or(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> Self {
        let node = self.modified(modifier);
        self.connect(Connector::Or, node)
    }

    pub fn not(&self, modifier: impl FnOnce(&QueryBuilder) -> QueryBuilder) -> Self {
        let node = self.modified(modifier);
        self.connect(Connector::And, QueryNode::negate(node))
    }

    pub fn limit(&self, limit: u64) -> Self {
        let mut query = self.query.clone();
        query.limit = Some(limit);
        Self::with_query(self.model, query)
    }

    pub fn skip(&self, skip: u64) -> Self {
        let mut query = self.query.clone();
        query.skip = Some(skip);
        Self::with_query(self.model, query)
    }

    /// Append a sort key. The first key added sorts first.
    pub fn order_by(&self, key: impl Into<String>, direction: Direction) -> Self {
        let mut query = self.query.clone();
        query.order_by.push(OrderBy {
            key: key.into(),
            direction,
        });
        Self::with_query(self.model, query)
    }

    /// Narrow to the row whose primary key equals `key`.
    pub fn for_key(&self, key: impl Into<Value>) -> Result<Self> {
        let primary_key = self.model.primary_key()?;
        Ok(self.where_((primary_key, key)))
    }

    /// AND-compose a scope registered with [`ModelType::scope`].
    pub fn apply(&self, name: &str, args: &[Value]) -> Result<Self> {
        let id = self.model.id();
        let scope = registry::read(|registry| registry.scope(id, name)).ok_or_else(|| {
            OpaqueError::UnknownScope {
                model: self.model.name(),
                scope: name.to_string(),
            }
        })?;
        Ok(self.and(|q| scope(q, args)))
    }

    pub fn get(&self) -> Result<Vec<Instance>> {
        let adapter = self.model.adapter()?;
        tracing::debug!(model = %self.model.name(), query = %self.query, "reading");
        let rows = adapter.read(&self.model, &self.query)?;
        Ok(rows.into_iter().map(|row| self.model.from_row(row)).collect())
    }

    pub fn first(&self) -> Result<Option<Instance>> {
        Ok(self.limit(1).get()?.into_iter().next())
    }

    pub fn first_or_fail(&self) -> Result<Instance> {
        self.first()?.ok_or_else(|| OpaqueError::NotFound {
            model: self.model.name(),
            key: self.query.filter.to_string(),
        })
    }

    /// Update every matching row with `data`, serialized through the schema.
    pub fn update(&self, data: Row) -> Result<Vec<Row>> {
        let adapter = self.model.adapter()?;
        let data = self.model.serialize(data);
        tracing::debug!(model = %self.model.name(), query = %self.query, "updating");
        adapter.update(&self.model, &self.query, data)
    }

    pub fn delete(&self) -> Result<()> {
        let adapter = self.model.adapter()?;
        tracing::debug!(model = %self.model.name(), query = %self.query, "deleting");
        adapter.delete(&self.model, &self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeOptions;
    use crate::test_utils::{row, AdapterCall, RecordingAdapter};
    use serde_json::json;
    use std::sync::Arc;

    fn model(name: &str) -> ModelType {
        let model = ModelType::define(name);
        model
            .add_attribute("id", AttributeOptions::new().primary_key())
            .add_attribute("a", AttributeOptions::new())
            .add_attribute("b", AttributeOptions::new())
            .add_attribute(
                "price",
                AttributeOptions::new()
                    .serialize(|v| json!(format!("{:.2}", v.as_f64().unwrap_or_default()))),
            );
        model
    }

    #[test]
    fn and_where_flattens() {
        let q = model("AndWhere")
            .query()
            .where_(("a", Comparator::Eq, 1))
            .and_where(("b", Comparator::Eq, 2));
        assert_eq!(
            q.query().to_value(),
            json!({"_and": [
                {"key": "a", "comparator": "==", "value": 1},
                {"key": "b", "comparator": "==", "value": 2}
            ]})
        );

        let q = q.where_(("a", 3));
        match q.sub_query() {
            QueryNode::And(nodes) => assert_eq!(nodes.len(), 3),
            other => panic!("expected a flat and, got {}", other),
        }
    }

    #[test]
    fn or_where_flattens() {
        let q = model("OrWhere").query().where_(("a", 1)).or_where(("b", 2));
        assert_eq!(
            q.query().to_value(),
            json!({"_or": [
                {"key": "a", "comparator": "==", "value": 1},
                {"key": "b", "comparator": "==", "value": 2}
            ]})
        );
    }

    #[test]
    fn mixing_connectors_wraps_the_base() {
        let q = model("Mixed")
            .query()
            .where_(("a", 1))
            .or_where(("b", 2))
            .and_where(("a", 3));
        assert_eq!(
            q.query().to_value(),
            json!({"_and": [
                {"_or": [
                    {"key": "a", "comparator": "==", "value": 1},
                    {"key": "b", "comparator": "==", "value": 2}
                ]},
                {"key": "a", "comparator": "==", "value": 3}
            ]})
        );
    }

    #[test]
    fn root_modifiers_are_hoisted() {
        let q = model("Hoisted")
            .query()
            .skip(2)
            .limit(2)
            .or_where_with(|q| q.skip(3).limit(3));
        assert_eq!(q.query().to_value(), json!({"_skip": 2, "_limit": 2}));

        let q = q.where_(("a", 1));
        assert_eq!(
            q.query().to_value(),
            json!({"key": "a", "comparator": "==", "value": 1, "_skip": 2, "_limit": 2})
        );
    }

    #[test]
    fn not_variants() {
        let m = model("Not");
        let q = m.query().where_(("a", 1)).or_where_not(("b", 2));
        assert_eq!(
            q.query().to_value(),
            json!({"_or": [
                {"key": "a", "comparator": "==", "value": 1},
                {"_not": {"key": "b", "comparator": "==", "value": 2}}
            ]})
        );

        let q = m.query().not(|q| q.where_(("a", 1)).where_(("b", 2)));
        assert_eq!(
            q.query().to_value(),
            json!({"_not": {"_and": [
                {"key": "a", "comparator": "==", "value": 1},
                {"key": "b", "comparator": "==", "value": 2}
            ]}})
        );

        assert_eq!(
            m.query().where_not(("a", 1)).query(),
            m.query().and_where_not(("a", 1)).query()
        );
    }

    #[test]
    fn nested_where_with() {
        let q = model("Nested")
            .query()
            .where_(("a", 1))
            .where_with(|q| q.where_(("b", 1)).or_where(("b", 2)));
        assert_eq!(
            q.query().to_value(),
            json!({"_and": [
                {"key": "a", "comparator": "==", "value": 1},
                {"_or": [
                    {"key": "b", "comparator": "==", "value": 1},
                    {"key": "b", "comparator": "==", "value": 2}
                ]}
            ]})
        );
    }

    #[test]
    fn repeated_where_accumulates() {
        let q = model("Accumulate")
            .query()
            .where_(("a", Comparator::Lt, 10))
            .and_where(("a", Comparator::Lt, 5));
        assert_eq!(q.query().to_string(), "(('a' < [10]) and ('a' < [5]))");
    }

    #[test]
    fn values_are_serialized() {
        let m = model("Serialized");
        let q = m.query().where_(("price", 12.9));
        assert_eq!(
            q.query().to_value(),
            json!({"key": "price", "comparator": "==", "value": "12.90"})
        );

        let q = m.query().where_(("price", Comparator::In, json!([1, 2.5])));
        assert_eq!(
            q.query().to_value(),
            json!({"key": "price", "comparator": "in", "value": ["1.00", "2.50"]})
        );
    }

    #[test]
    fn order_by_appends() {
        let q = model("Ordered")
            .query()
            .order_by("a", Direction::Asc)
            .order_by("b", Direction::Desc);
        assert_eq!(
            q.query().to_value(),
            json!({"_orderBy": [
                {"key": "a", "direction": "asc"},
                {"key": "b", "direction": "desc"}
            ]})
        );
    }

    #[test]
    fn builders_are_immutable() {
        let base = model("Immutable").query().where_(("a", 1));
        let _ = base.where_(("b", 2)).limit(5);
        assert_eq!(
            base.query().to_value(),
            json!({"key": "a", "comparator": "==", "value": 1})
        );
    }

    #[test]
    fn for_key_uses_primary_key() {
        let q = model("ForKey").query().for_key("x").unwrap();
        assert_eq!(
            q.query().to_value(),
            json!({"key": "id", "comparator": "==", "value": "x"})
        );
    }

    #[test]
    fn scopes() {
        let m = model("Scoped");
        m.scope("cheap", |q, args| {
            let max = args.first().cloned().unwrap_or(json!(10));
            q.where_(("price", Comparator::Lt, max))
        });

        let q = m.query().where_(("a", 1)).apply("cheap", &[json!(5)]).unwrap();
        assert_eq!(q.query().to_string(), "(('a' == [1]) and ('price' < [5.00]))");

        assert!(matches!(
            m.query().apply("missing", &[]),
            Err(OpaqueError::UnknownScope { scope, .. }) if scope == "missing"
        ));
    }

    #[test]
    fn first_requests_a_single_row() {
        let m = model("First");
        let adapter = Arc::new(RecordingAdapter::new());
        m.set_adapter(adapter.clone());

        assert!(m.query().where_(("a", 1)).first().unwrap().is_none());
        match adapter.last_call() {
            Some(AdapterCall::Read { query, .. }) => assert_eq!(
                query.to_value(),
                json!({"key": "a", "comparator": "==", "value": 1, "_limit": 1})
            ),
            other => panic!("expected a read, got {:?}", other),
        }

        adapter.set_read_rows(vec![row(json!({"a": "hello"})), row(json!({"a": "world"}))]);
        let first = m.query().first().unwrap().unwrap();
        assert_eq!(first.get("a").unwrap(), json!("hello"));
        assert!(first.is_persistent());
        assert!(!first.is_dirty());
    }

    #[test]
    fn first_or_fail_reports_query() {
        let m = model("FirstOrFail");
        m.set_adapter(Arc::new(RecordingAdapter::new()));
        assert!(matches!(
            m.query().where_(("a", 1)).first_or_fail(),
            Err(OpaqueError::NotFound { key, .. }) if key == "('a' == [1])"
        ));
    }

    #[test]
    fn update_and_delete_pass_the_query() {
        let m = model("UpdateDelete");
        let adapter = Arc::new(RecordingAdapter::new());
        m.set_adapter(adapter.clone());
        let q = m.query().where_(("a", 1));

        q.update(row(json!({"price": 3}))).unwrap();
        assert_eq!(
            adapter.last_call(),
            Some(AdapterCall::Update {
                model: "UpdateDelete".into(),
                query: q.query().clone(),
                row: row(json!({"price": "3.00"})),
            })
        );

        q.delete().unwrap();
        assert_eq!(
            adapter.last_call(),
            Some(AdapterCall::Delete {
                model: "UpdateDelete".into(),
                query: q.query().clone(),
            })
        );
    }
}
