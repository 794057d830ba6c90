//! # Adapters
//!
//! An [`Adapter`] performs the storage I/O for one or more model types. The core
//! never talks to storage directly: instances and query builders hand it a
//! [`NormalizedQuery`] and rows in wire format (already serialized through the
//! schema), and hydrate whatever rows come back.
//!
//! Adapters are shared between threads behind an `Arc` and take `&self`, so any
//! mutable state needs interior locking. Errors are returned as-is; the core
//! neither wraps nor retries them.
//!
//! ## Bundled Adapters
//!
//! - [`NoOpAdapter`]: stores nothing, echoes inserts
//! - [`InMemoryAdapter`]: one collection per model type, queried with
//!   [`crate::query::engine`]

mod memory;
mod noop;

pub use memory::InMemoryAdapter;
pub use noop::NoOpAdapter;

use crate::attributes::{Row, Value};
use crate::error::Result;
use crate::model::ModelType;
use crate::query::NormalizedQuery;

/// What an insert returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Inserted {
    /// Only the primary key of the new row.
    Key(Value),
    /// The full stored row.
    Row(Row),
}

pub trait Adapter: Send + Sync {
    /// Insert a new row.
    fn insert(&self, model: &ModelType, row: Row) -> Result<Inserted>;

    /// Merge `row` into every row matched by `query`. Adapters may return the
    /// updated rows, or nothing.
    fn update(&self, model: &ModelType, query: &NormalizedQuery, row: Row) -> Result<Vec<Row>>;

    /// Remove every row matched by `query`.
    fn delete(&self, model: &ModelType, query: &NormalizedQuery) -> Result<()>;

    /// Rows matched by `query`, honouring its order, skip and limit.
    fn read(&self, model: &ModelType, query: &NormalizedQuery) -> Result<Vec<Row>>;
}
