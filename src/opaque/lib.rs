//! # Opaque Architecture
//!
//! Opaque is an **attribute-tracking model layer**. Application code declares
//! model types and works with instances as bags of named attributes; storage is
//! somebody else's problem, reached only through an [`Adapter`].
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Models (model/)                                            │
//! │  - ModelType handles, Instance attribute access             │
//! │  - Dirty tracking and the save protocol                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Queries (query/)                                           │
//! │  - Immutable QueryBuilder                                   │
//! │  - NormalizedQuery: the tree every adapter receives         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Adapters (adapter/)                                        │
//! │  - Adapter trait: insert / read / update / delete           │
//! │  - NoOpAdapter, InMemoryAdapter                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Underneath sit the [`schema`] registry, which merges attribute definitions
//! across a type's ancestors, and the [`attributes`] building blocks.
//!
//! ## Wire Format
//!
//! Values crossing the adapter boundary are always in wire format: written
//! values pass through each attribute's `serialize` transform, rows coming back
//! pass through `deserialize` when an instance is hydrated. Query values are
//! serialized the same way, so adapters never see in-memory representations.
//!
//! ## Example
//!
//! ```
//! use once_cell::sync::Lazy;
//! use opaque::{to_row, AttributeOptions, InMemoryAdapter, ModelType};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! static ITEM: Lazy<ModelType> = Lazy::new(|| {
//!     let item = ModelType::define("Item");
//!     item.add_attribute("id", AttributeOptions::new().default_value("").primary_key())
//!         .add_attribute(
//!             "price",
//!             AttributeOptions::new()
//!                 .default_value(0)
//!                 .serialize(|v| json!(format!("{:.2}", v.as_f64().unwrap_or_default())))
//!                 .deserialize(|v| json!(v.as_str().and_then(|s| s.parse::<f64>().ok()))),
//!         )
//!         .set_adapter(Arc::new(InMemoryAdapter::new()));
//!     item
//! });
//!
//! # fn main() -> opaque::Result<()> {
//! let item = ITEM.create(to_row(&json!({"price": 12.9}))?)?;
//! let found = ITEM.find_or_fail(item.primary_key_value()?)?;
//! assert_eq!(found.get_as::<f64>("price")?, 12.9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Adapter-bound operations emit `tracing` events at `debug`, schema resolution
//! at `trace`. The crate never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`model`]: Model types and instances
//! - [`query`]: Query builder, normalized queries, in-memory evaluation
//! - [`adapter`]: Storage boundary and bundled adapters
//! - [`schema`]: Merged schemas and the process-wide registry
//! - [`attributes`]: Attribute definitions, values and layered storage
//! - [`relations`]: Belongs-to and has-many helpers
//! - [`config`]: Adapter configuration
//! - [`error`]: Error types

pub mod adapter;
pub mod attributes;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod relations;
pub mod schema;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use adapter::{Adapter, InMemoryAdapter, Inserted, NoOpAdapter};
pub use attributes::{to_row, AccessOptions, AttributeOptions, Row, Value};
pub use config::{KeyStrategy, OpaqueConfig};
pub use error::{OpaqueError, Result};
pub use model::{Accessor, Instance, ModelType};
pub use query::{Comparator, Direction, NormalizedQuery, QueryBuilder, QueryNode};
pub use relations::{BelongsTo, HasMany};
pub use schema::registry::ModelId;
pub use schema::Schema;
