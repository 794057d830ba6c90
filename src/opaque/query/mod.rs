//! # Queries
//!
//! Queries are built fluently with a [`QueryBuilder`] and compiled into a
//! [`NormalizedQuery`], the adapter-agnostic tree every adapter receives.
//!
//! ## Composition
//!
//! Each `where`/`or_where`/`not` call composes one node into the current filter:
//!
//! - a filter already joined by the same connector gets the node appended,
//!   keeping `_and` / `_or` lists flat
//! - an empty filter is replaced by the node
//! - anything else is wrapped together with the node under the connector
//!
//! Nested builders passed to `and`, `or`, `not` and `where_with` start empty, and
//! only their filter is composed. Their `limit`, `skip` and `order_by` are
//! dropped; those only ever apply at the root.
//!
//! ```ignore
//! ITEM.query()
//!     .where_(("price", Comparator::Lt, 10))
//!     .or_where_with(|q| q.where_(("title", "free")).where_not(("hidden", true)))
//!     .order_by("price", Direction::Desc)
//!     .limit(20)
//!     .get()?;
//! ```
//!
//! ## Evaluation
//!
//! [`engine`] evaluates a normalized query against in-memory rows and is what
//! the bundled in-memory adapter uses.

mod builder;
pub mod engine;
mod normalized;

pub use builder::{Condition, QueryBuilder};
pub use normalized::{Comparator, Comparison, Direction, NormalizedQuery, OrderBy, QueryNode};

use crate::attributes::Value;
use std::sync::Arc;

/// A named, reusable query modifier. Receives a fresh builder and the
/// arguments passed to [`QueryBuilder::apply`].
pub type Scope = Arc<dyn Fn(&QueryBuilder, &[Value]) -> QueryBuilder + Send + Sync>;
