//! Test doubles and helpers, available to this crate's tests and to dependents
//! with the `test_utils` feature.

use crate::adapter::{Adapter, Inserted};
use crate::attributes::{Row, Value};
use crate::error::{OpaqueError, Result};
use crate::model::ModelType;
use crate::query::NormalizedQuery;
use std::sync::{Mutex, PoisonError};

/// Build a [`Row`] from a JSON object literal.
///
/// Panics if `value` is not an object.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// One call received by a [`RecordingAdapter`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Insert {
        model: String,
        row: Row,
    },
    Update {
        model: String,
        query: NormalizedQuery,
        row: Row,
    },
    Delete {
        model: String,
        query: NormalizedQuery,
    },
    Read {
        model: String,
        query: NormalizedQuery,
    },
}

#[derive(Default)]
struct Recording {
    calls: Vec<AdapterCall>,
    insert_result: Option<Inserted>,
    update_rows: Vec<Row>,
    read_rows: Vec<Row>,
    simulate_error: bool,
}

/// Adapter that records every call and answers with canned results.
///
/// By default inserts echo the row, updates and reads return nothing.
#[derive(Default)]
pub struct RecordingAdapter {
    state: Mutex<Recording>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut Recording) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn last_call(&self) -> Option<AdapterCall> {
        self.with_state(|state| state.calls.last().cloned())
    }

    pub fn clear_calls(&self) {
        self.with_state(|state| state.calls.clear());
    }

    pub fn set_insert_result(&self, result: Inserted) {
        self.with_state(|state| state.insert_result = Some(result));
    }

    pub fn set_update_rows(&self, rows: Vec<Row>) {
        self.with_state(|state| state.update_rows = rows);
    }

    pub fn set_read_rows(&self, rows: Vec<Row>) {
        self.with_state(|state| state.read_rows = rows);
    }

    /// Make every following call fail with a store error.
    pub fn set_simulate_error(&self, simulate: bool) {
        self.with_state(|state| state.simulate_error = simulate);
    }

    fn record(&self, call: AdapterCall) -> Result<()> {
        self.with_state(|state| {
            state.calls.push(call);
            if state.simulate_error {
                Err(OpaqueError::Store("Simulated adapter error".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

impl Adapter for RecordingAdapter {
    fn insert(&self, model: &ModelType, row: Row) -> Result<Inserted> {
        self.record(AdapterCall::Insert {
            model: model.name(),
            row: row.clone(),
        })?;
        let canned = self.with_state(|state| state.insert_result.clone());
        Ok(canned.unwrap_or(Inserted::Row(row)))
    }

    fn update(&self, model: &ModelType, query: &NormalizedQuery, row: Row) -> Result<Vec<Row>> {
        self.record(AdapterCall::Update {
            model: model.name(),
            query: query.clone(),
            row,
        })?;
        Ok(self.with_state(|state| state.update_rows.clone()))
    }

    fn delete(&self, model: &ModelType, query: &NormalizedQuery) -> Result<()> {
        self.record(AdapterCall::Delete {
            model: model.name(),
            query: query.clone(),
        })
    }

    fn read(&self, model: &ModelType, query: &NormalizedQuery) -> Result<Vec<Row>> {
        self.record(AdapterCall::Read {
            model: model.name(),
            query: query.clone(),
        })?;
        Ok(self.with_state(|state| state.read_rows.clone()))
    }
}
