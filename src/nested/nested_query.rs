use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::{
    error::Result,
    nested::{CompiledSpec, NestedSpec, NestedValues},
    query::RowSource,
};

/// A row source paired with a nested projection.
///
/// Every query derived from this one, through [`derive`](Self::derive) or
/// `clone`, gets its own copy of the projection, so adding a filter never
/// loses the nested shape.
#[derive(Debug, Clone)]
pub struct NestedValuesQuery<S> {
    source: S,
    nested: NestedValues,
}

impl<S: RowSource> NestedValuesQuery<S> {
    pub fn new(source: S, spec: impl Into<NestedSpec>) -> Self {
        Self { source, nested: NestedValues::new(spec) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn nested(&self) -> &NestedValues {
        &self.nested
    }

    /// Build a new query from a modified copy of the source.
    pub fn derive<F>(&self, modify: F) -> Self
    where
        F: FnOnce(S) -> S,
    {
        Self {
            source: modify(self.source.clone()),
            nested: self.nested.clone(),
        }
    }

    /// Execute the source and decode rows as they are pulled.
    pub fn iter(&self) -> Result<NestedRows<'_>> {
        let compiled = self.nested.compiled()?;
        let rows = self.source.values_rows(compiled.values_list())?;
        Ok(NestedRows {
            compiled: compiled.corrected_for(&rows.layout),
            rows: rows.rows,
        })
    }

    pub fn to_vec(&self) -> Result<Vec<Map<String, Value>>> {
        self.iter()?.collect()
    }
}

/// Decoded rows of one execution.
pub struct NestedRows<'a> {
    compiled: Cow<'a, CompiledSpec>,
    rows: Box<dyn Iterator<Item = Result<Vec<Value>>> + 'a>,
}

impl NestedRows<'_> {
    /// The index maps this execution decodes with.
    pub fn compiled(&self) -> &CompiledSpec {
        &self.compiled
    }
}

impl Iterator for NestedRows<'_> {
    type Item = Result<Map<String, Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.and_then(|row| self.compiled.decode_row(&row)))
    }
}
