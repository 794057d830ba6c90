//! Evaluate normalized queries against in-memory rows.
//!
//! Comparison rules:
//!
//! - a key missing from a row reads as `null`
//! - numbers compare numerically regardless of integer/float representation
//! - `<`, `>`, `<=`, `>=` only match values of the same kind (numbers, strings
//!   or booleans)
//! - `in` matches when the row value equals any element of the array
//!
//! Ordering is a stable sort over all `_orderBy` keys in order. Values of
//! different kinds sort null < bool < number < string < array < object.

use super::normalized::{Comparator, Comparison, Direction, NormalizedQuery, QueryNode};
use crate::attributes::{Row, Value};
use std::cmp::Ordering;

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(a, b)| compare_values(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Structural equality, except that numbers compare numerically.
fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b).is_eq(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| equals(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| equals(value, other)))
        }
        _ => a == b,
    }
}

fn orderable(a: &Value, b: &Value) -> bool {
    rank(a) == rank(b) && matches!(a, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn compare(comparison: &Comparison, row: &Row) -> bool {
    let actual = row.get(&comparison.key).unwrap_or(&Value::Null);
    let expected = &comparison.value;
    match comparison.comparator {
        Comparator::Eq => equals(actual, expected),
        Comparator::Ne => !equals(actual, expected),
        Comparator::Lt => orderable(actual, expected) && compare_values(actual, expected).is_lt(),
        Comparator::Gt => orderable(actual, expected) && compare_values(actual, expected).is_gt(),
        Comparator::Le => orderable(actual, expected) && compare_values(actual, expected).is_le(),
        Comparator::Ge => orderable(actual, expected) && compare_values(actual, expected).is_ge(),
        Comparator::In => match expected {
            Value::Array(items) => items.iter().any(|item| equals(actual, item)),
            _ => false,
        },
    }
}

pub fn matches(node: &QueryNode, row: &Row) -> bool {
    match node {
        QueryNode::Empty => true,
        QueryNode::Comparison(comparison) => compare(comparison, row),
        QueryNode::And(nodes) => nodes.iter().all(|node| matches(node, row)),
        QueryNode::Or(nodes) => nodes.iter().any(|node| matches(node, row)),
        QueryNode::Not(node) => !matches(node, row),
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Indices of the rows selected by `query`, in result order.
pub fn filter_indices(rows: &[Row], query: &NormalizedQuery) -> Vec<usize> {
    let mut selected: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| matches(&query.filter, row))
        .map(|(i, _)| i)
        .collect();

    if !query.order_by.is_empty() {
        selected.sort_by(|&a, &b| {
            query
                .order_by
                .iter()
                .map(|order| {
                    let left = rows[a].get(&order.key).unwrap_or(&Value::Null);
                    let right = rows[b].get(&order.key).unwrap_or(&Value::Null);
                    let ordering = compare_values(left, right);
                    match order.direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    let skip = query.skip.map(to_usize).unwrap_or(0);
    let limit = query.limit.map(to_usize).unwrap_or(usize::MAX);
    selected.into_iter().skip(skip).take(limit).collect()
}

pub fn query_collection(rows: &[Row], query: &NormalizedQuery) -> Vec<Row> {
    filter_indices(rows, query)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect()
}
