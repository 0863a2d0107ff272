use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    error::{NestedValuesError, Result},
    nested::{CompiledLevel, CompiledSpec, NestedSpec},
};

/// Running row position shared by every level of one compilation.
#[derive(Debug, Default)]
pub struct PositionCounter {
    next: usize,
}

impl PositionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_position(&mut self) -> usize {
        let position = self.next;
        self.next += 1;
        position
    }

    /// Number of positions handed out so far.
    pub fn assigned(&self) -> usize {
        self.next
    }
}

/// Turns a [`NestedSpec`] tree into a [`CompiledSpec`].
///
/// Levels are numbered depth first: a level's own fields take the next
/// positions, then each child in insertion order. The flat column list is
/// built in the same walk, so position `i` always requests `columns[i]`.
pub struct FieldMapCompiler;

impl FieldMapCompiler {
    pub fn compile(spec: &NestedSpec) -> Result<CompiledSpec> {
        let mut counter = PositionCounter::new();
        let mut columns = Vec::new();
        let root = Self::compile_level(spec, &mut counter, &mut columns, "", true)?;

        debug!(
            columns = columns.len(),
            levels = root.level_count(),
            "compiled nested projection"
        );
        Ok(CompiledSpec { columns, root })
    }

    fn compile_level(
        spec: &NestedSpec,
        counter: &mut PositionCounter,
        columns: &mut Vec<String>,
        trail: &str,
        is_root: bool,
    ) -> Result<CompiledLevel> {
        let mut keys = Vec::with_capacity(spec.fields().len());
        let mut positions = Vec::with_capacity(spec.fields().len());
        let mut own_columns = Vec::with_capacity(spec.fields().len());
        let mut seen = HashSet::new();

        for field in spec.fields() {
            if !seen.insert(field.key()) {
                warn!(level = trail, key = field.key(), "duplicate output key, last value wins");
            }
            keys.push(field.key().to_string());
            own_columns.push(field.path().to_string());
            columns.push(field.path().to_string());
            positions.push(counter.next_position());
        }

        let if_none = match spec.discriminator() {
            // kept so the compiled tree can be nested elsewhere; decode_row ignores it
            Some(key) if is_root => Some(key.to_string()),
            Some(key) if !seen.contains(key) => {
                return Err(NestedValuesError::UnknownDiscriminator(Self::join(trail, key)));
            }
            other => other.map(str::to_string),
        };

        let mut children = IndexMap::with_capacity(spec.children().len());
        for (key, child) in spec.children() {
            if seen.contains(key.as_str()) {
                warn!(level = trail, key = %key, "nested key shadows a field of the same level");
            }
            let child_trail = Self::join(trail, key);
            let compiled = Self::compile_level(child, counter, columns, &child_trail, false)?;
            children.insert(key.clone(), compiled);
        }

        Ok(CompiledLevel { columns: own_columns, keys, positions, children, if_none })
    }

    fn join(trail: &str, key: &str) -> String {
        if trail.is_empty() { key.to_string() } else { format!("{trail}.{key}") }
    }
}
