//! The normalized query tree.
//!
//! A [`NormalizedQuery`] is what builders produce and adapters consume. The
//! filter is a [`QueryNode`]; paging and ordering live on the root only.
//!
//! ## Wire Shape
//!
//! ```text
//! {}                                          matches everything
//! {"key": k, "comparator": "==", "value": v}  comparison
//! {"_and": [node, ...]}
//! {"_or": [node, ...]}
//! {"_not": node}
//! root only: "_limit", "_skip", "_orderBy": [{"key": k, "direction": "asc"}]
//! ```
//!
//! `Serialize` and `Deserialize` produce and accept exactly this shape.
//! Decoding is strict: unknown keys, or root modifiers below the root, are an
//! [`OpaqueError::InvalidQuery`].

use crate::attributes::{Row, Value};
use crate::error::{OpaqueError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const AND: &str = "_and";
const OR: &str = "_or";
const NOT: &str = "_not";
const LIMIT: &str = "_limit";
const SKIP: &str = "_skip";
const ORDER_BY: &str = "_orderBy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
            Comparator::In => "in",
        }
    }
}

impl FromStr for Comparator {
    type Err = OpaqueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            "<" => Ok(Comparator::Lt),
            ">" => Ok(Comparator::Gt),
            "<=" => Ok(Comparator::Le),
            ">=" => Ok(Comparator::Ge),
            "in" => Ok(Comparator::In),
            other => Err(OpaqueError::InvalidQuery(format!(
                "unknown comparator '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub key: String,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub key: String,
    pub comparator: Comparator,
    pub value: Value,
}

/// A filter node. `Empty` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryNode {
    #[default]
    Empty,
    Comparison(Comparison),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    pub fn comparison(key: impl Into<String>, comparator: Comparator, value: impl Into<Value>) -> Self {
        QueryNode::Comparison(Comparison {
            key: key.into(),
            comparator,
            value: value.into(),
        })
    }

    pub fn negate(node: QueryNode) -> Self {
        QueryNode::Not(Box::new(node))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, QueryNode::Empty)
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        match self {
            QueryNode::Empty => {}
            QueryNode::Comparison(comparison) => {
                row.insert("key".into(), Value::String(comparison.key.clone()));
                row.insert(
                    "comparator".into(),
                    Value::String(comparison.comparator.as_str().into()),
                );
                row.insert("value".into(), comparison.value.clone());
            }
            QueryNode::And(nodes) => {
                row.insert(AND.into(), nodes_to_value(nodes));
            }
            QueryNode::Or(nodes) => {
                row.insert(OR.into(), nodes_to_value(nodes));
            }
            QueryNode::Not(node) => {
                row.insert(NOT.into(), node.to_value());
            }
        }
        row
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_row())
    }

    pub fn from_value(value: Value) -> Result<Self> {
        node_from_row(expect_object(value)?)
    }
}

fn nodes_to_value(nodes: &[QueryNode]) -> Value {
    Value::Array(nodes.iter().map(QueryNode::to_value).collect())
}

fn expect_object(value: Value) -> Result<Row> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(OpaqueError::InvalidQuery(format!(
            "expected a query object, got {}",
            other
        ))),
    }
}

fn expect_exhausted(row: &Row) -> Result<()> {
    if row.is_empty() {
        Ok(())
    } else {
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        Err(OpaqueError::InvalidQuery(format!(
            "unexpected keys in query node: {}",
            keys.join(", ")
        )))
    }
}

fn nodes_from_value(value: Value) -> Result<Vec<QueryNode>> {
    match value {
        Value::Array(items) => items.into_iter().map(QueryNode::from_value).collect(),
        other => Err(OpaqueError::InvalidQuery(format!(
            "expected a list of query nodes, got {}",
            other
        ))),
    }
}

fn node_from_row(mut row: Row) -> Result<QueryNode> {
    if row.is_empty() {
        return Ok(QueryNode::Empty);
    }
    if let Some(nodes) = row.remove(AND) {
        expect_exhausted(&row)?;
        return Ok(QueryNode::And(nodes_from_value(nodes)?));
    }
    if let Some(nodes) = row.remove(OR) {
        expect_exhausted(&row)?;
        return Ok(QueryNode::Or(nodes_from_value(nodes)?));
    }
    if let Some(node) = row.remove(NOT) {
        expect_exhausted(&row)?;
        return Ok(QueryNode::negate(QueryNode::from_value(node)?));
    }
    if let Some(key) = row.remove("key") {
        let key = match key {
            Value::String(key) => key,
            other => {
                return Err(OpaqueError::InvalidQuery(format!(
                    "comparison key must be a string, got {}",
                    other
                )))
            }
        };
        let comparator = match row.remove("comparator") {
            Some(Value::String(comparator)) => comparator.parse()?,
            _ => {
                return Err(OpaqueError::InvalidQuery(format!(
                    "comparison on '{}' has no comparator",
                    key
                )))
            }
        };
        let value = row.remove("value").unwrap_or(Value::Null);
        expect_exhausted(&row)?;
        return Ok(QueryNode::comparison(key, comparator, value));
    }
    expect_exhausted(&row).map(|_| QueryNode::Empty)
}

/// A complete query: filter plus root-only paging and ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedQuery {
    pub filter: QueryNode,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub order_by: Vec<OrderBy>,
}

impl NormalizedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: QueryNode) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = self.filter.to_row();
        if let Some(limit) = self.limit {
            row.insert(LIMIT.into(), Value::from(limit));
        }
        if let Some(skip) = self.skip {
            row.insert(SKIP.into(), Value::from(skip));
        }
        if !self.order_by.is_empty() {
            let order_by = self
                .order_by
                .iter()
                .map(|order| {
                    let mut entry = Row::new();
                    entry.insert("key".into(), Value::String(order.key.clone()));
                    entry.insert("direction".into(), Value::String(order.direction.to_string()));
                    Value::Object(entry)
                })
                .collect();
            row.insert(ORDER_BY.into(), Value::Array(order_by));
        }
        row
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_row())
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut row = expect_object(value)?;
        let limit = row.remove(LIMIT).map(|v| expect_count(LIMIT, v)).transpose()?;
        let skip = row.remove(SKIP).map(|v| expect_count(SKIP, v)).transpose()?;
        let order_by = match row.remove(ORDER_BY) {
            Some(order_by) => serde_json::from_value(order_by)?,
            None => Vec::new(),
        };
        Ok(Self {
            filter: node_from_row(row)?,
            limit,
            skip,
            order_by,
        })
    }
}

fn expect_count(name: &str, value: Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        OpaqueError::InvalidQuery(format!("{} must be a non-negative integer, got {}", name, value))
    })
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        QueryNode::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for NormalizedQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NormalizedQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        NormalizedQuery::from_value(value).map_err(D::Error::custom)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(s),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write_value(f, item)?;
            }
            Ok(())
        }
        other => write!(f, "{}", other),
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[QueryNode], connector: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", connector)?;
        }
        write!(f, "{}", node)?;
    }
    f.write_str(")")
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Empty => f.write_str("()"),
            QueryNode::Comparison(comparison) => {
                write!(f, "('{}' {} [", comparison.key, comparison.comparator)?;
                write_value(f, &comparison.value)?;
                f.write_str("])")
            }
            QueryNode::And(nodes) => write_joined(f, nodes, "and"),
            QueryNode::Or(nodes) => write_joined(f, nodes, "or"),
            QueryNode::Not(node) => write!(f, "not ({})", node),
        }
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filter)?;
        if let Some(skip) = self.skip {
            write!(f, " skip {}", skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|order| format!("{} {}", order.key, order.direction))
                .collect();
            write!(f, " order by {}", order.join(", "))?;
        }
        Ok(())
    }
}
