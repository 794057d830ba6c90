//! # Attribute System
//!
//! Every model type is described by a set of named attributes. This module holds
//! the building blocks shared by the schema registry and model instances:
//!
//! - **Definitions**: what an attribute defaults to and how it is transformed
//! - **Values**: the dynamic value and row types exchanged with adapters
//! - **Layered storage**: the per-instance `local` / `storage` split
//!
//! ## Attribute Transforms
//!
//! | Transform | Direction | Applied by |
//! |-----------|-----------|------------|
//! | `get` | store → caller | `Instance::get_attribute` unless raw |
//! | `set` | caller → store | `Instance::set_attribute` unless raw |
//! | `serialize` | store → adapter | saves and query values |
//! | `deserialize` | adapter → store | hydration (`set_row`) |
//!
//! Unset transforms are the identity, an unset default means "no value".
//!
//! ## Usage
//!
//! ```ignore
//! let price = AttributeOptions::new()
//!     .default_value(0)
//!     .serialize(|v| json!(format!("{:.2}", v.as_f64().unwrap_or_default())));
//! item.add_attribute("price", price);
//! ```

mod spec;
mod store;
mod value;

pub use spec::{AttributeDefinition, AttributeOptions, Transform};
pub use store::AttributeStore;
pub use value::{to_row, AccessOptions, Row, Value};
