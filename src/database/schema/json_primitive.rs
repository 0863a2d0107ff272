use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse kind of a JSON value, as tracked by schema inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonPrimitive {
    Null,
    Bool,
    Int,
    Float,
    String,
    Object,
    Array,
}

impl JsonPrimitive {
    pub fn of_value(v: &Value) -> JsonPrimitive {
        match v {
            Value::Null => JsonPrimitive::Null,
            Value::Bool(_) => JsonPrimitive::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    JsonPrimitive::Int
                } else {
                    JsonPrimitive::Float
                }
            }
            Value::String(_) => JsonPrimitive::String,
            Value::Array(_) => JsonPrimitive::Array,
            Value::Object(_) => JsonPrimitive::Object,
        }
    }

    /// Common type of two observations of the same field.
    ///
    /// `Int` and `Float` widen to `Float`, `Null` yields to the other side, and
    /// any other mismatch keeps the type seen first.
    pub fn promote(a: JsonPrimitive, b: JsonPrimitive) -> JsonPrimitive {
        use JsonPrimitive::*;
        match (a, b) {
            (x, y) if x == y => x,
            (Int, Float) | (Float, Int) => Float,
            (Null, y) => y,
            (x, _) => x,
        }
    }

    /// Whether values of this kind can be stored in a flat row cell.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, JsonPrimitive::Object | JsonPrimitive::Array)
    }
}
