use serde::{Deserialize, Serialize};

/// How a collection assigns the id of a stored document.
///
/// - `Uuid`: a random UUID string is generated for every added document.
/// - `Int`: ids are sequential integers, continuing after the largest id seen.
/// - `None`: nothing is generated; documents must carry their own id.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum IdType {
    #[default]
    Uuid,
    Int,
    None,
}

/// Collection configuration.
///
/// `id_key` is the JSON key holding the document id. It is also the column a
/// reference points at when the reference is inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub id_type: IdType,
    pub id_key: String,
}

pub type Config = DbConfig;

impl Default for DbConfig {
    fn default() -> Self {
        Self { id_type: Default::default(), id_key: "id".to_string() }
    }
}

impl DbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(id_type: IdType, id_key: &str) -> Self {
        Self {
            id_type,
            id_key: id_key.to_string(),
        }
    }

    pub fn int(id_key: &str) -> Self {
        Self::from(IdType::Int, id_key)
    }

    pub fn uuid(id_key: &str) -> Self {
        Self::from(IdType::Uuid, id_key)
    }

    /// No id generation; callers provide ids under `id_key`.
    pub fn none(id_key: &str) -> Self {
        Self::from(IdType::None, id_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_uuid_ids_under_id() {
        let config = DbConfig::default();
        assert_eq!(config.id_type, IdType::Uuid);
        assert_eq!(config.id_key, "id");
    }

    #[test]
    fn shorthand_constructors_set_the_strategy() {
        assert_eq!(DbConfig::int("pk"), DbConfig::from(IdType::Int, "pk"));
        assert_eq!(DbConfig::none("code").id_type, IdType::None);
        assert_eq!(DbConfig::uuid("id").id_key, "id");
    }
}
