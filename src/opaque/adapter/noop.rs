use super::{Adapter, Inserted};
use crate::attributes::Row;
use crate::error::Result;
use crate::model::ModelType;
use crate::query::NormalizedQuery;

/// An adapter that stores nothing. Inserts echo the row back, reads and
/// updates return nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAdapter;

impl Adapter for NoOpAdapter {
    fn insert(&self, _model: &ModelType, row: Row) -> Result<Inserted> {
        Ok(Inserted::Row(row))
    }

    fn update(&self, _model: &ModelType, _query: &NormalizedQuery, _row: Row) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn delete(&self, _model: &ModelType, _query: &NormalizedQuery) -> Result<()> {
        Ok(())
    }

    fn read(&self, _model: &ModelType, _query: &NormalizedQuery) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }
}
