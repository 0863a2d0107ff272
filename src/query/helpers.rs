use std::cmp::Ordering;

use serde_json::Value;

pub struct Helpers;

impl Helpers {
    /// Ordering used by `order_by`: nulls sort last in both directions, values
    /// of different kinds sort by kind.
    pub fn cmp_json_for_sort(a: &Value, b: &Value, ascending: bool) -> Ordering {
        match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => {
                let ord = Self::compare_values(a, b)
                    .unwrap_or_else(|| Self::type_rank(a).cmp(&Self::type_rank(b)));
                if ascending { ord } else { ord.reverse() }
            }
        }
    }

    /// Comparison of two values of the same kind. `None` when the kinds differ
    /// or either side is null.
    pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            (Value::Number(x), Value::Number(y)) => {
                match (x.as_i64(), y.as_i64()) {
                    (Some(x), Some(y)) => Some(x.cmp(&y)),
                    _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
                }
            }
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                Some(a.to_string().cmp(&b.to_string()))
            }
            _ => None,
        }
    }

    /// Equality that treats `1` and `1.0` as the same number.
    pub fn value_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(_), Value::Number(_)) => Self::compare_values(a, b) == Some(Ordering::Equal),
            _ => a == b,
        }
    }

    /// Text form used when a value is concatenated or searched.
    pub fn as_text(v: &Value) -> Option<String> {
        match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0, Value::Bool(_) => 1, Value::Number(_) => 2, Value::String(_) => 3,
            Value::Array(_) => 4, Value::Object(_) => 5
        }
    }
}
