use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::{error::Result, query::helpers::Helpers};

/// Comparison applied by `filter` / `exclude` to the value of a column path.
///
/// Comparisons against null are never true, except `IsNull`.
#[derive(Debug, Clone)]
pub enum Lookup {
    Exact(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    IsNull(bool),
    In(Vec<Value>),
    /// Substring match on the text form of the value.
    Contains(String),
    Regex(Regex),
}

impl Lookup {
    pub fn exact(value: impl Into<Value>) -> Self {
        Lookup::Exact(value.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Lookup::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return matches!(self, Lookup::IsNull(true));
        }
        match self {
            Lookup::Exact(expected) => Helpers::value_equal(value, expected),
            Lookup::Gt(bound) => Self::ordered(value, bound, |o| o == Ordering::Greater),
            Lookup::Gte(bound) => Self::ordered(value, bound, |o| o != Ordering::Less),
            Lookup::Lt(bound) => Self::ordered(value, bound, |o| o == Ordering::Less),
            Lookup::Lte(bound) => Self::ordered(value, bound, |o| o != Ordering::Greater),
            Lookup::IsNull(expected) => !expected,
            Lookup::In(values) => values.iter().any(|v| Helpers::value_equal(value, v)),
            Lookup::Contains(needle) => Helpers::as_text(value).is_some_and(|t| t.contains(needle.as_str())),
            Lookup::Regex(re) => Helpers::as_text(value).is_some_and(|t| re.is_match(&t)),
        }
    }

    fn ordered(value: &Value, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        Helpers::compare_values(value, bound).is_some_and(accept)
    }
}

impl From<Value> for Lookup {
    fn from(value: Value) -> Self {
        Lookup::Exact(value)
    }
}
