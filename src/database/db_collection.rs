use std::{path::Path, fs, sync::{Arc, PoisonError, RwLock}};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{database::{DbConfig, IdManager, SchemaDict}, error::{NestedValuesError, Result}};

/// Shared handle to a collection.
pub type MemoryCollection = Arc<RwLock<InternalMemoryCollection>>;

/// Documents of one collection, keyed by id in insertion order.
///
/// Insertion order is also scan order, which keeps query output
/// deterministic without an explicit `order_by`.
#[derive(Debug)]
pub struct InternalMemoryCollection {
    items: IndexMap<String, Value>,
    id_manager: IdManager,
    config: DbConfig,
    pub name: String,
    pub schema: Option<SchemaDict>,
}

impl InternalMemoryCollection {
    pub fn new(name: &str, config: DbConfig) -> Self {
        Self {
            items: IndexMap::new(),
            id_manager: IdManager::new(config.id_type),
            config,
            name: name.to_ascii_lowercase(),
            schema: None,
        }
    }

    pub fn into_protected(self) -> MemoryCollection {
        Arc::new(RwLock::new(self))
    }

    pub fn new_coll(name: &str, config: DbConfig) -> MemoryCollection {
        Self::new(name, config).into_protected()
    }

    pub fn schema(&self) -> Option<SchemaDict> {
        self.schema.clone()
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Default column name other collections use to point at this one:
    /// singular collection name plus `_<id_key>` (`authors` -> `author_id`).
    pub fn reference_column_name(&self) -> String {
        let name = match self.name.strip_suffix('s') {
            Some(singular) if !singular.ends_with('s') => singular,
            _ => &self.name,
        };
        format!("{}_{}", name, self.config.id_key)
    }

    fn ensure_update_schema_for_item(&mut self, item: &Value) {
        if let Value::Object(map) = item {
            match &mut self.schema {
                Some(schema) => schema.merge_schema(map),
                None => self.schema = Some(SchemaDict::infer_schema_from_object(map)),
            }
        }
    }

    /// Store one document. A generated id overrides whatever the document had;
    /// with `IdType::None` the document must carry its id.
    pub fn add(&mut self, item: Value) -> Option<Value> {
        let Value::Object(mut map) = item else {
            return None;
        };

        if let Some(existing) = map.get(&self.config.id_key) {
            self.id_manager.observe(existing);
        }

        let key = match self.id_manager.next() {
            Some(id) => {
                map.insert(self.config.id_key.clone(), id.to_json());
                id.to_string()
            }
            None => {
                let item = Value::Object(map);
                let key = IdManager::key_of(&item, &self.config.id_key)?;
                return Some(self.store(key, item));
            }
        };

        Some(self.store(key, Value::Object(map)))
    }

    /// Store documents as given, keeping their ids. Items without an id are
    /// skipped, except when ids are generated.
    pub fn add_batch(&mut self, items: Value) -> Vec<Value> {
        let Value::Array(items) = items else {
            return Vec::new();
        };

        let mut added = Vec::new();
        for item in items {
            if !item.is_object() {
                continue;
            }
            match IdManager::key_of(&item, &self.config.id_key) {
                Some(key) => {
                    if let Some(id) = item.get(&self.config.id_key) {
                        self.id_manager.observe(id);
                    }
                    added.push(self.store(key, item));
                }
                None => {
                    if let Some(item) = self.add(item) {
                        added.push(item);
                    }
                }
            }
        }

        debug!(collection = %self.name, count = added.len(), "batch added");
        added
    }

    fn store(&mut self, key: String, item: Value) -> Value {
        self.ensure_update_schema_for_item(&item);
        self.items.insert(key, item.clone());
        item
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.items.get(id)
    }

    pub fn get_all(&self) -> Vec<Value> {
        self.items.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.values()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// First document whose `column` equals `value`. Lookups on the id column
    /// go through the key index.
    pub fn find_by(&self, column: &str, value: &Value) -> Option<&Value> {
        if value.is_null() {
            return None;
        }
        if column == self.config.id_key {
            let key = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if let Some(item) = self.items.get(&key) {
                return Some(item);
            }
        }
        self.items.values().find(|item| item.get(column) == Some(value))
    }

    pub fn filter_by<'a>(&'a self, column: &'a str, value: &'a Value) -> impl Iterator<Item = &'a Value> + 'a {
        self.items.values()
            .filter(move |item| !value.is_null() && item.get(column) == Some(value))
    }

    pub fn update(&mut self, id: &str, item: Value) -> Option<Value> {
        if !self.items.contains_key(id) {
            return None;
        }
        let Value::Object(mut map) = item else {
            return None;
        };
        if let Some(current) = self.items.get(id).and_then(|v| v.get(&self.config.id_key)) {
            map.insert(self.config.id_key.clone(), current.clone());
        }
        Some(self.store(id.to_string(), Value::Object(map)))
    }

    pub fn delete(&mut self, id: &str) -> Option<Value> {
        self.items.shift_remove(id)
    }

    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn load_from_json(&mut self, json_value: Value, keep: bool) -> Result<Vec<Value>> {
        if !json_value.is_array() {
            return Err(NestedValuesError::Other(
                format!("collection {} expects a JSON array of documents", self.name)
            ));
        }

        if !keep {
            self.clear();
        }

        Ok(self.add_batch(json_value))
    }

    pub fn load_from_file(&mut self, file_path: &Path) -> Result<usize> {
        let content = fs::read_to_string(file_path)
            .map_err(|e| NestedValuesError::Io(format!("{}: {e}", file_path.display())))?;

        let json_value = serde_json::from_str::<Value>(&content)
            .map_err(|e| NestedValuesError::Io(format!("{} is not valid JSON: {e}", file_path.display())))?;

        let added = self.load_from_json(json_value, false)?;
        debug!(collection = %self.name, file = %file_path.display(), count = added.len(), "loaded documents");
        Ok(added.len())
    }
}

/// Lock-taking convenience methods on a shared collection handle.
///
/// A poisoned lock is recovered rather than propagated: documents are plain
/// JSON and stay consistent even if a writer panicked.
pub trait DbCollection {
    fn add(&self, item: Value) -> Option<Value>;
    fn add_batch(&self, items: Value) -> Vec<Value>;
    fn get(&self, id: &str) -> Option<Value>;
    fn get_all(&self) -> Vec<Value>;
    fn count(&self) -> usize;
    fn delete(&self, id: &str) -> Option<Value>;
    fn load_from_json(&self, json_value: Value) -> Result<Vec<Value>>;
    fn load_from_file(&self, file_path: &Path) -> Result<usize>;
    fn schema(&self) -> Option<SchemaDict>;
    fn get_name(&self) -> String;
    fn get_config(&self) -> DbConfig;
    fn reference_column_name(&self) -> String;
}

impl DbCollection for MemoryCollection {
    fn add(&self, item: Value) -> Option<Value> {
        self.write().unwrap_or_else(PoisonError::into_inner).add(item)
    }

    fn add_batch(&self, items: Value) -> Vec<Value> {
        self.write().unwrap_or_else(PoisonError::into_inner).add_batch(items)
    }

    fn get(&self, id: &str) -> Option<Value> {
        self.read().unwrap_or_else(PoisonError::into_inner).get(id).cloned()
    }

    fn get_all(&self) -> Vec<Value> {
        self.read().unwrap_or_else(PoisonError::into_inner).get_all()
    }

    fn count(&self) -> usize {
        self.read().unwrap_or_else(PoisonError::into_inner).count()
    }

    fn delete(&self, id: &str) -> Option<Value> {
        self.write().unwrap_or_else(PoisonError::into_inner).delete(id)
    }

    fn load_from_json(&self, json_value: Value) -> Result<Vec<Value>> {
        self.write().unwrap_or_else(PoisonError::into_inner).load_from_json(json_value, false)
    }

    fn load_from_file(&self, file_path: &Path) -> Result<usize> {
        let mut guard = self.write().unwrap_or_else(PoisonError::into_inner);
        let result = guard.load_from_file(file_path);
        if let Err(e) = &result {
            warn!(collection = %guard.name, error = %e, "initial data load skipped");
        }
        result
    }

    fn schema(&self) -> Option<SchemaDict> {
        self.read().unwrap_or_else(PoisonError::into_inner).schema()
    }

    fn get_name(&self) -> String {
        self.read().unwrap_or_else(PoisonError::into_inner).name.clone()
    }

    fn get_config(&self) -> DbConfig {
        self.read().unwrap_or_else(PoisonError::into_inner).config().clone()
    }

    fn reference_column_name(&self) -> String {
        self.read().unwrap_or_else(PoisonError::into_inner).reference_column_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn int_collection() -> InternalMemoryCollection {
        InternalMemoryCollection::new("Books", DbConfig::int("id"))
    }

    #[test]
    fn name_is_lowercased_and_reference_column_is_singular() {
        let coll = int_collection();
        assert_eq!(coll.name, "books");
        assert_eq!(coll.reference_column_name(), "book_id");

        let coll = InternalMemoryCollection::new("press", DbConfig::uuid("code"));
        assert_eq!(coll.reference_column_name(), "press_code");

        let coll = InternalMemoryCollection::new("address", DbConfig::int("id"));
        assert_eq!(coll.reference_column_name(), "address_id");
    }

    #[test]
    fn add_generates_sequential_int_ids() {
        let mut coll = int_collection();
        let a = coll.add(json!({"title": "A"})).unwrap();
        let b = coll.add(json!({"title": "B"})).unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
        assert!(coll.exists("2"));
    }

    #[test]
    fn add_batch_keeps_ids_and_moves_generator_past_them() {
        let mut coll = int_collection();
        let added = coll.add_batch(json!([
            {"id": 5, "title": "A"},
            {"id": 9, "title": "B"},
            "not an object"
        ]));
        assert_eq!(added.len(), 2);

        let next = coll.add(json!({"title": "C"})).unwrap();
        assert_eq!(next["id"], json!(10));
    }

    #[test]
    fn none_ids_require_the_key() {
        let mut coll = InternalMemoryCollection::new("tags", DbConfig::none("slug"));
        assert!(coll.add(json!({"label": "x"})).is_none());
        assert!(coll.add(json!({"slug": "rust", "label": "Rust"})).is_some());
        assert_eq!(coll.get("rust").unwrap()["label"], json!("Rust"));
    }

    #[test]
    fn iteration_follows_insertion_order_after_delete() {
        let mut coll = int_collection();
        coll.add_batch(json!([{"id": 3}, {"id": 1}, {"id": 2}]));
        coll.delete("1");
        let ids: Vec<_> = coll.iter().map(|v| v["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2)]);
    }

    #[test]
    fn find_by_uses_id_index_and_falls_back_to_scan() {
        let mut coll = int_collection();
        coll.add_batch(json!([
            {"id": 1, "isbn": "111"},
            {"id": 2, "isbn": "222"}
        ]));
        assert_eq!(coll.find_by("id", &json!(2)).unwrap()["isbn"], json!("222"));
        assert_eq!(coll.find_by("isbn", &json!("111")).unwrap()["id"], json!(1));
        assert!(coll.find_by("isbn", &Value::Null).is_none());
        assert_eq!(coll.filter_by("isbn", &json!("222")).count(), 1);
    }

    #[test]
    fn update_keeps_stored_id() {
        let mut coll = int_collection();
        coll.add(json!({"title": "A"}));
        let updated = coll.update("1", json!({"id": 99, "title": "B"})).unwrap();
        assert_eq!(updated["id"], json!(1));
        assert!(coll.update("7", json!({"title": "C"})).is_none());
    }

    #[test]
    fn schema_tracks_documents() {
        let mut coll = int_collection();
        coll.add_batch(json!([{"id": 1, "pages": 10}, {"id": 2, "pages": null}]));
        let schema = coll.schema().unwrap();
        assert!(schema.get("pages").unwrap().nullable);
    }

    #[test]
    fn load_from_json_rejects_non_arrays_and_replaces_content() {
        let mut coll = int_collection();
        coll.add(json!({"title": "old"}));
        assert!(coll.load_from_json(json!({"id": 1}), false).is_err());

        let added = coll.load_from_json(json!([{"id": 4, "title": "new"}]), false).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(coll.count(), 1);
    }

    #[test]
    fn load_from_file_reads_json_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 1, "title": "A"}}, {{"id": 2, "title": "B"}}]"#).unwrap();

        let mut coll = int_collection();
        assert_eq!(coll.load_from_file(file.path()).unwrap(), 2);
        assert!(coll.exists("2"));
    }

    #[test]
    fn load_from_file_reports_missing_and_invalid_files() {
        let mut coll = int_collection();
        let missing = coll.load_from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(NestedValuesError::Io(_))));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(coll.load_from_file(file.path()), Err(NestedValuesError::Io(_))));
    }

    #[test]
    fn shared_handle_methods_take_the_lock() {
        let coll = InternalMemoryCollection::new_coll("authors", DbConfig::int("id"));
        coll.add(json!({"name": "Ana"}));
        assert_eq!(DbCollection::count(&coll), 1);
        assert_eq!(coll.get_name(), "authors");
        assert_eq!(DbCollection::get(&coll, "1").unwrap()["name"], json!("Ana"));
    }
}
