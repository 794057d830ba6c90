use super::{Adapter, Inserted};
use crate::attributes::{Row, Value};
use crate::config::{KeyStrategy, OpaqueConfig};
use crate::error::{OpaqueError, Result};
use crate::model::ModelType;
use crate::query::{engine, NormalizedQuery};
use crate::schema::registry::ModelId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Collection {
    rows: Vec<Row>,
    last_key: u64,
}

impl Collection {
    fn next_key(&mut self, strategy: KeyStrategy) -> Value {
        match strategy {
            KeyStrategy::Uuid => Value::String(Uuid::new_v4().to_string()),
            KeyStrategy::Sequential => {
                self.last_key += 1;
                Value::from(self.last_key)
            }
        }
    }

    fn position(&self, primary_key: &str, key: &Value) -> Option<usize> {
        self.rows.iter().position(|row| row.get(primary_key) == Some(key))
    }
}

fn is_missing(key: Option<&Value>) -> bool {
    match key {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn merge(target: &mut Row, data: &Row) {
    for (name, value) in data {
        target.insert(name.clone(), value.clone());
    }
}

/// Adapter keeping one collection of rows per model type in memory.
///
/// Inserts without a usable primary key (absent, `null` or `""`) get one
/// generated according to the configured [`KeyStrategy`]. Inserting a row
/// whose key already exists merges into the stored row.
pub struct InMemoryAdapter {
    config: OpaqueConfig,
    collections: Mutex<HashMap<ModelId, Collection>>,
    simulate_write_error: AtomicBool,
}

impl Default for InMemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::with_config(OpaqueConfig::default())
    }

    pub fn with_config(config: OpaqueConfig) -> Self {
        Self {
            config,
            collections: Mutex::new(HashMap::new()),
            simulate_write_error: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OpaqueConfig {
        &self.config
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Every stored row of `model`, in insertion order.
    pub fn rows(&self, model: &ModelType) -> Result<Vec<Row>> {
        let collections = self.lock()?;
        Ok(collections
            .get(&model.id())
            .map(|collection| collection.rows.clone())
            .unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ModelId, Collection>>> {
        self.collections
            .lock()
            .map_err(|_| OpaqueError::Store("in-memory collections lock poisoned".to_string()))
    }

    fn check_write(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(OpaqueError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl Adapter for InMemoryAdapter {
    fn insert(&self, model: &ModelType, mut row: Row) -> Result<Inserted> {
        self.check_write()?;
        let primary_key = model.primary_key()?;
        let mut collections = self.lock()?;
        let collection = collections.entry(model.id()).or_default();

        if is_missing(row.get(&primary_key)) {
            let key = collection.next_key(self.config.key_strategy);
            row.insert(primary_key.clone(), key);
        } else if let Some(key) = row.get(&primary_key).and_then(Value::as_u64) {
            collection.last_key = collection.last_key.max(key);
        }

        let key = row.get(&primary_key).cloned().unwrap_or(Value::Null);
        let stored = match collection.position(&primary_key, &key) {
            Some(index) => {
                let existing = &mut collection.rows[index];
                merge(existing, &row);
                existing.clone()
            }
            None => {
                collection.rows.push(row.clone());
                row
            }
        };
        tracing::trace!(model = %model.name(), key = %key, "stored row");
        Ok(Inserted::Row(stored))
    }

    fn update(&self, model: &ModelType, query: &NormalizedQuery, row: Row) -> Result<Vec<Row>> {
        self.check_write()?;
        let mut collections = self.lock()?;
        let Some(collection) = collections.get_mut(&model.id()) else {
            return Ok(Vec::new());
        };

        let indices = engine::filter_indices(&collection.rows, query);
        let updated = indices
            .into_iter()
            .map(|index| {
                let target = &mut collection.rows[index];
                merge(target, &row);
                target.clone()
            })
            .collect();
        Ok(updated)
    }

    fn delete(&self, model: &ModelType, query: &NormalizedQuery) -> Result<()> {
        self.check_write()?;
        let mut collections = self.lock()?;
        let Some(collection) = collections.get_mut(&model.id()) else {
            return Ok(());
        };

        let mut indices = engine::filter_indices(&collection.rows, query);
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in indices {
            collection.rows.remove(index);
        }
        Ok(())
    }

    fn read(&self, model: &ModelType, query: &NormalizedQuery) -> Result<Vec<Row>> {
        let collections = self.lock()?;
        let Some(collection) = collections.get(&model.id()) else {
            return Ok(Vec::new());
        };

        if query.limit.is_none() && self.config.max_read_rows.is_some() {
            let mut capped = query.clone();
            capped.limit = self.config.max_read_rows;
            return Ok(engine::query_collection(&collection.rows, &capped));
        }
        Ok(engine::query_collection(&collection.rows, query))
    }
}
