use std::fmt::Display;

use serde_json::Value;
use uuid::Uuid;

use crate::database::IdType;

#[derive(Debug, Clone, PartialEq)]
pub enum IdValue {
    Uuid(String),
    Int(u64),
}

impl Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Uuid(uuid) => f.write_str(uuid),
            IdValue::Int(id) => write!(f, "{id}"),
        }
    }
}

impl IdValue {
    pub fn to_json(&self) -> Value {
        match self {
            IdValue::Uuid(uuid) => Value::String(uuid.clone()),
            IdValue::Int(id) => Value::from(*id),
        }
    }
}

/// Hands out document ids for one collection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdManager {
    pub id_type: IdType,
    pub current: Option<IdValue>,
}

impl IdManager {
    pub fn new(id_type: IdType) -> Self {
        Self {
            id_type,
            current: None
        }
    }

    /// Record an id supplied by the caller so generated int ids never collide
    /// with it.
    pub fn observe(&mut self, id: &Value) {
        if self.id_type != IdType::Int {
            return;
        }
        if let Some(id) = id.as_u64() {
            match self.current {
                Some(IdValue::Int(current)) if current >= id => {},
                _ => self.current = Some(IdValue::Int(id)),
            }
        }
    }

    /// Read the id of a document under `id_key`, as the string it is stored by.
    pub fn key_of(item: &Value, id_key: &str) -> Option<String> {
        match item.get(id_key) {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }
}

impl Iterator for IdManager {
    type Item = IdValue;
    fn next(&mut self) -> Option<Self::Item> {
        let item = match (&self.current, self.id_type) {
            (_, IdType::None) => return None,
            (Some(IdValue::Int(id)), _) => IdValue::Int(id.saturating_add(1)),
            (None, IdType::Int) => IdValue::Int(1),
            (_, IdType::Uuid) | (Some(IdValue::Uuid(_)), IdType::Int) => IdValue::Uuid(Uuid::new_v4().to_string()),
        };

        self.current = Some(item.clone());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_ids_start_at_one_and_increase() {
        let mut ids = IdManager::new(IdType::Int);
        assert_eq!(ids.next(), Some(IdValue::Int(1)));
        assert_eq!(ids.next(), Some(IdValue::Int(2)));
    }

    #[test]
    fn observed_ids_move_the_sequence_forward_only() {
        let mut ids = IdManager::new(IdType::Int);
        ids.observe(&json!(10));
        ids.observe(&json!(4));
        assert_eq!(ids.next(), Some(IdValue::Int(11)));
    }

    #[test]
    fn none_strategy_never_generates() {
        let mut ids = IdManager::new(IdType::None);
        ids.observe(&json!(3));
        assert_eq!(ids.next(), None);
    }

    #[test]
    fn uuid_strategy_generates_distinct_strings() {
        let mut ids = IdManager::new(IdType::Uuid);
        let a = ids.next().unwrap().to_string();
        let b = ids.next().unwrap().to_string();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn key_of_reads_strings_and_numbers() {
        assert_eq!(IdManager::key_of(&json!({"id": 7}), "id"), Some("7".to_string()));
        assert_eq!(IdManager::key_of(&json!({"pk": "a"}), "pk"), Some("a".to_string()));
        assert_eq!(IdManager::key_of(&json!({"id": null}), "id"), None);
    }
}
