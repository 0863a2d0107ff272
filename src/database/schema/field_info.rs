use serde_json::Value;

use crate::database::JsonPrimitive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: JsonPrimitive,
    pub nullable: bool,
}

impl FieldInfo {
    pub fn infer_field_info(value: &Value) -> FieldInfo {
        let ty = JsonPrimitive::of_value(value);
        FieldInfo {
            ty,
            nullable: ty == JsonPrimitive::Null,
        }
    }

    pub fn merge_field_info(&self, new: &FieldInfo) -> FieldInfo {
        FieldInfo {
            ty: JsonPrimitive::promote(self.ty, new.ty),
            nullable: self.nullable || new.nullable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_first_then_typed_keeps_nullable() {
        let first = FieldInfo::infer_field_info(&Value::Null);
        let merged = first.merge_field_info(&FieldInfo::infer_field_info(&json!("x")));
        assert_eq!(merged.ty, JsonPrimitive::String);
        assert!(merged.nullable);
    }

    #[test]
    fn int_then_float_is_float() {
        let a = FieldInfo { ty: JsonPrimitive::Int, nullable: false };
        let b = FieldInfo { ty: JsonPrimitive::Float, nullable: false };
        let c = a.merge_field_info(&b);
        assert_eq!(c.ty, JsonPrimitive::Float);
        assert!(!c.nullable);
    }
}
