use indexmap::IndexMap;

use crate::nested::{CompiledLevel, CompiledSpec, FieldSpec};

/// Declarative shape of a nested projection.
///
/// `fields` are the columns of this level. Each `nest` entry adds a child
/// level whose map lands under the entry's key. When `if_none` names one of a
/// child level's output keys and that value is null, the whole child collapses
/// to null instead of a map of nulls. The root level is always a map, so a
/// root `if_none` is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedSpec {
    fields: Vec<FieldSpec>,
    nest: IndexMap<String, NestedSpec>,
    if_none: Option<String>,
}

impl NestedSpec {
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Add a child level under `key`. Children keep insertion order, which is
    /// also the order their columns are requested in.
    pub fn nest(mut self, key: &str, child: impl Into<NestedSpec>) -> Self {
        self.nest.insert(key.to_string(), child.into());
        self
    }

    pub fn if_none(mut self, key: &str) -> Self {
        self.if_none = Some(key.to_string());
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn children(&self) -> &IndexMap<String, NestedSpec> {
        &self.nest
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.if_none.as_deref()
    }
}

impl<F: Into<FieldSpec>> From<Vec<F>> for NestedSpec {
    fn from(fields: Vec<F>) -> Self {
        Self::new(fields)
    }
}

/// Recover the declaration a compiled level came from, so it can be reused
/// inside another tree and numbered there.
impl From<&CompiledLevel> for NestedSpec {
    fn from(level: &CompiledLevel) -> Self {
        Self {
            fields: level.fields().collect(),
            nest: level.children()
                .iter()
                .map(|(key, child)| (key.clone(), NestedSpec::from(child)))
                .collect(),
            if_none: level.discriminator().map(str::to_string),
        }
    }
}

impl From<&CompiledSpec> for NestedSpec {
    fn from(compiled: &CompiledSpec) -> Self {
        NestedSpec::from(compiled.root())
    }
}

impl From<CompiledSpec> for NestedSpec {
    fn from(compiled: CompiledSpec) -> Self {
        NestedSpec::from(&compiled)
    }
}
