//! Attribute definitions.
//!
//! [`AttributeOptions`] is what callers register; every option is optional.
//! [`AttributeDefinition`] is the resolved form stored in a schema, with the
//! identity transform filled in wherever an option was left unset.

use super::Value;
use std::fmt;
use std::sync::Arc;

/// A value transform attached to an attribute.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

fn identity() -> Transform {
    Arc::new(|value: Value| value)
}

/// Options for registering an attribute on a model type.
#[derive(Clone, Default)]
pub struct AttributeOptions {
    default: Option<Value>,
    get: Option<Transform>,
    set: Option<Transform>,
    serialize: Option<Transform>,
    deserialize: Option<Transform>,
    primary_key: bool,
}

impl AttributeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value used when neither layer of an instance holds the attribute.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Read transform applied by non-raw reads.
    pub fn get(mut self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.get = Some(Arc::new(transform));
        self
    }

    /// Write transform applied by non-raw writes.
    pub fn set(mut self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.set = Some(Arc::new(transform));
        self
    }

    /// Conversion into the adapter's wire format.
    pub fn serialize(
        mut self,
        transform: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.serialize = Some(Arc::new(transform));
        self
    }

    /// Conversion from the adapter's wire format.
    pub fn deserialize(
        mut self,
        transform: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.deserialize = Some(Arc::new(transform));
        self
    }

    /// Flag this attribute as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A fully resolved attribute definition.
#[derive(Clone)]
pub struct AttributeDefinition {
    pub default: Option<Value>,
    pub primary_key: bool,
    get: Transform,
    set: Transform,
    serialize: Transform,
    deserialize: Transform,
}

impl AttributeDefinition {
    pub fn new(options: AttributeOptions) -> Self {
        Self {
            default: options.default,
            primary_key: options.primary_key,
            get: options.get.unwrap_or_else(identity),
            set: options.set.unwrap_or_else(identity),
            serialize: options.serialize.unwrap_or_else(identity),
            deserialize: options.deserialize.unwrap_or_else(identity),
        }
    }

    pub fn apply_get(&self, value: Value) -> Value {
        (self.get)(value)
    }

    pub fn apply_set(&self, value: Value) -> Value {
        (self.set)(value)
    }

    pub fn serialize(&self, value: Value) -> Value {
        (self.serialize)(value)
    }

    pub fn deserialize(&self, value: Value) -> Value {
        (self.deserialize)(value)
    }
}

impl Default for AttributeDefinition {
    fn default() -> Self {
        Self::new(AttributeOptions::default())
    }
}

impl From<AttributeOptions> for AttributeDefinition {
    fn from(options: AttributeOptions) -> Self {
        Self::new(options)
    }
}

impl fmt::Debug for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDefinition")
            .field("default", &self.default)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_options_are_identity() {
        let definition = AttributeDefinition::default();
        assert_eq!(definition.apply_get(json!(3)), json!(3));
        assert_eq!(definition.apply_set(json!("x")), json!("x"));
        assert_eq!(definition.serialize(json!([1])), json!([1]));
        assert_eq!(definition.deserialize(json!(null)), json!(null));
        assert!(!definition.primary_key);
        assert!(definition.default.is_none());
    }

    #[test]
    fn options_are_carried_over() {
        let definition = AttributeDefinition::new(
            AttributeOptions::new()
                .default_value("")
                .primary_key()
                .get(|v| json!(format!("{}€", v.as_str().unwrap_or_default()))),
        );
        assert_eq!(definition.default, Some(json!("")));
        assert!(definition.primary_key);
        assert_eq!(definition.apply_get(json!("3")), json!("3€"));
    }

    #[test]
    fn serialize_deserialize_round_trip() {
        // Flags are stored as 0/1 on the wire; 2 is a sentinel meaning "unset".
        let definition = AttributeDefinition::new(
            AttributeOptions::new()
                .serialize(|v| match v {
                    Value::Bool(true) => json!(1),
                    Value::Bool(false) => json!(0),
                    _ => json!(2),
                })
                .deserialize(|v| match v.as_i64() {
                    Some(1) => json!(true),
                    Some(0) => json!(false),
                    _ => Value::Null,
                }),
        );

        for value in [json!(true), json!(false), Value::Null] {
            assert_eq!(definition.deserialize(definition.serialize(value.clone())), value);
        }
    }
}
