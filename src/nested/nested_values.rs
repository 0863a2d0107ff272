use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

use crate::{
    error::Result,
    nested::{CompiledSpec, FieldMapCompiler, NestedSpec},
};

/// A nested projection, compiled on first use.
///
/// The `NestedSpec` is never modified. The compiled form is memoized and shared by
/// every later call; cloning copies both.
#[derive(Debug, Clone)]
pub struct NestedValues {
    spec: NestedSpec,
    compiled: OnceCell<CompiledSpec>,
}

impl NestedValues {
    pub fn new(spec: impl Into<NestedSpec>) -> Self {
        Self { spec: spec.into(), compiled: OnceCell::new() }
    }

    pub fn spec(&self) -> &NestedSpec {
        &self.spec
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    pub fn compiled(&self) -> Result<&CompiledSpec> {
        self.compiled.get_or_try_init(|| FieldMapCompiler::compile(&self.spec))
    }

    /// Column paths to request from the row source, in row order.
    pub fn values_list(&self) -> Result<&[String]> {
        Ok(self.compiled()?.values_list())
    }

    /// Decode a row laid out exactly as `values_list`.
    pub fn decode(&self, row: &[Value]) -> Result<Map<String, Value>> {
        self.compiled()?.decode_row(row)
    }
}

impl From<NestedSpec> for NestedValues {
    fn from(spec: NestedSpec) -> Self {
        Self::new(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nested::FieldSpec;
    use serde_json::json;

    #[test]
    fn compiles_lazily_and_once() {
        let nv = NestedValues::new(NestedSpec::new(["id"]).nest("a", vec![("a__id", "id")]));
        assert!(!nv.is_compiled());

        let first = nv.values_list().unwrap().as_ptr();
        assert!(nv.is_compiled());
        let second = nv.values_list().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn compiling_leaves_the_spec_untouched() {
        let spec = NestedSpec::new([FieldSpec::from("id"), FieldSpec::from(("name", "label"))]);
        let nv = NestedValues::new(spec.clone());
        nv.compiled().unwrap();
        assert_eq!(nv.spec(), &spec);
    }

    #[test]
    fn clones_carry_the_compiled_form() {
        let nv = NestedValues::new(NestedSpec::new(["id"]));
        nv.compiled().unwrap();
        let copy = nv.clone();
        assert!(copy.is_compiled());
        assert_eq!(copy.decode(&[json!(7)]).unwrap(), nv.decode(&[json!(7)]).unwrap());
    }
}
