use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::database::FieldInfo;

/// Inferred schema of a collection.
///
/// Field order is the order in which fields were first seen, which is the
/// order `fields_map` walks them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDict {
    pub fields: IndexMap<String, FieldInfo>,
}

impl SchemaDict {
    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn infer_schema_from_object(obj: &Map<String, Value>) -> SchemaDict {
        let fields = obj.iter()
            .map(|(k, v)| (k.clone(), FieldInfo::infer_field_info(v)))
            .collect();

        SchemaDict { fields }
    }

    /// Fold one more document into the schema. Fields absent from `obj` become
    /// nullable; new fields are appended.
    pub fn merge_schema(&mut self, obj: &Map<String, Value>) {
        for (key, field_info) in self.fields.iter_mut() {
            if !obj.contains_key(key) {
                field_info.nullable = true;
            }
        }

        for (key, value) in obj {
            let new_info = FieldInfo::infer_field_info(value);
            match self.fields.get_mut(key) {
                Some(old) => *old = old.merge_field_info(&new_info),
                None => {
                    // not present in earlier documents
                    let mut new_info = new_info;
                    new_info.nullable = true;
                    self.fields.insert(key.clone(), new_info);
                }
            }
        }
    }
}
