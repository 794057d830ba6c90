//! # Configuration
//!
//! Settings for the bundled adapters, loaded with [`confique`] from layered
//! sources.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `OPAQUE_KEY_STRATEGY`, `OPAQUE_MAX_READ_ROWS`
//! 2. **TOML file**: the path given to [`OpaqueConfig::load`], if any
//! 3. **Compiled defaults**: via `#[config(default = ...)]`
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `key_strategy` | `uuid` | Primary keys generated on insert: `uuid` or `sequential` |
//! | `max_read_rows` | unset | Cap on rows returned by reads without `_limit` |

use crate::error::{OpaqueError, Result};
use confique::Config;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How missing primary keys are generated.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Random v4 UUID strings.
    #[default]
    Uuid,
    /// Integers counting up from 1, per model type.
    Sequential,
}

impl FromStr for KeyStrategy {
    type Err = OpaqueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(KeyStrategy::Uuid),
            "sequential" => Ok(KeyStrategy::Sequential),
            other => Err(OpaqueError::InvalidSetting(format!(
                "unknown key strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Uuid => f.write_str("uuid"),
            KeyStrategy::Sequential => f.write_str("sequential"),
        }
    }
}

impl<'de> Deserialize<'de> for KeyStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for the bundled adapters, stored in `opaque.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpaqueConfig {
    /// Primary keys generated for inserted rows that have none.
    #[config(default = "uuid", env = "OPAQUE_KEY_STRATEGY")]
    pub key_strategy: KeyStrategy,

    /// Rows returned at most by a read without `_limit`. Unlimited when absent.
    #[config(env = "OPAQUE_MAX_READ_ROWS")]
    pub max_read_rows: Option<u64>,
}

impl Default for OpaqueConfig {
    fn default() -> Self {
        Self {
            key_strategy: KeyStrategy::Uuid,
            max_read_rows: None,
        }
    }
}

impl OpaqueConfig {
    /// Load from the environment over an optional TOML file over defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }
}
