use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{error::{NestedValuesError, Result}, nested::FieldSpec};

/// One level of a compiled projection.
///
/// `positions[i]` is the row index holding the value of `columns[i]`, stored
/// under `keys[i]`. Children are decoded in order after this level's own
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLevel {
    pub(crate) columns: Vec<String>,
    pub(crate) keys: Vec<String>,
    pub(crate) positions: Vec<usize>,
    pub(crate) children: IndexMap<String, CompiledLevel>,
    pub(crate) if_none: Option<String>,
}

impl CompiledLevel {
    /// Column paths requested by this level only.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(output key, row index)` pairs of this level.
    pub fn index_map(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().map(String::as_str).zip(self.positions.iter().copied())
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldSpec> + '_ {
        self.columns.iter().zip(&self.keys).map(|(path, key)| FieldSpec::new(path, key))
    }

    pub fn children(&self) -> &IndexMap<String, CompiledLevel> {
        &self.children
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.if_none.as_deref()
    }

    fn read_fields(&self, row: &[Value]) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (key, index) in self.index_map() {
            let value = row.get(index)
                .ok_or(NestedValuesError::RowTooShort { index, len: row.len() })?;
            out.insert(key.to_string(), value.clone());
        }
        Ok(out)
    }

    fn read_children(&self, row: &[Value], out: &mut Map<String, Value>) -> Result<()> {
        for (key, child) in &self.children {
            out.insert(key.clone(), child.decode(row)?);
        }
        Ok(())
    }

    /// Build this level's map from a flat row, or `Value::Null` when the
    /// discriminator value is null. Children are not touched in that case.
    pub fn decode(&self, row: &[Value]) -> Result<Value> {
        let mut out = self.read_fields(row)?;
        if let Some(key) = &self.if_none {
            if out.get(key).is_none_or(Value::is_null) {
                return Ok(Value::Null);
            }
        }
        self.read_children(row, &mut out)?;
        Ok(Value::Object(out))
    }

    pub(crate) fn remap(&mut self, offsets: &[usize]) {
        for position in &mut self.positions {
            debug_assert!(*position < offsets.len(), "position {position} has no physical offset");
            if let Some(physical) = offsets.get(*position) {
                *position = *physical;
            }
        }
        for child in self.children.values_mut() {
            child.remap(offsets);
        }
    }

    pub(crate) fn level_count(&self) -> usize {
        1 + self.children.values().map(CompiledLevel::level_count).sum::<usize>()
    }
}

/// Output of the field-map compiler: the flat column list to request, and the
/// root level that decodes rows laid out in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSpec {
    pub(crate) columns: Vec<String>,
    pub(crate) root: CompiledLevel,
}

impl CompiledSpec {
    /// Every requested column path: a level's own fields, then each child's
    /// columns, depth first.
    pub fn values_list(&self) -> &[String] {
        &self.columns
    }

    pub fn root(&self) -> &CompiledLevel {
        &self.root
    }

    /// Decode one row into the root map.
    pub fn decode_row(&self, row: &[Value]) -> Result<Map<String, Value>> {
        let mut out = self.root.read_fields(row)?;
        self.root.read_children(row, &mut out)?;
        Ok(out)
    }
}
