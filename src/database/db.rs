use std::{collections::HashMap, sync::{Arc, PoisonError, RwLock}};

use tracing::debug;

use crate::{
    database::{DbCollection, DbConfig, DbReferences, InternalMemoryCollection, MemoryCollection, ReferenceColumn},
    error::{NestedValuesError, Result},
    query::ValuesQuery,
};

pub type Db = Arc<RwLock<InternalDb>>;

/// Named collections plus the references declared between them.
#[derive(Debug, Default)]
pub struct InternalDb {
    config: DbConfig,
    collections: HashMap<String, MemoryCollection>,
    references: DbReferences,
}

impl InternalDb {
    pub fn new_db_with_config(config: DbConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn into_protected(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    pub fn create_with_config(&mut self, coll_name: &str, config: DbConfig) -> MemoryCollection {
        let collection = InternalMemoryCollection::new_coll(coll_name, config);
        self.collections.insert(coll_name.to_ascii_lowercase(), Arc::clone(&collection));
        collection
    }

    pub fn get(&self, coll_name: &str) -> Option<MemoryCollection> {
        self.collections.get(&coll_name.to_ascii_lowercase()).map(Arc::clone)
    }

    pub fn references(&self) -> &DbReferences {
        &self.references
    }

    pub fn list_collections(&self) -> Vec<String> {
        let mut names = self.collections.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    fn require(&self, coll_name: &str) -> Result<MemoryCollection> {
        self.get(coll_name)
            .ok_or_else(|| NestedValuesError::UnknownCollection(coll_name.to_string()))
    }

    pub fn create_reference(&mut self, collection: &str, column: &str, ref_collection: &str, ref_column: &str) -> Result<ReferenceColumn> {
        let source = self.require(collection)?;
        let target = self.require(ref_collection)?;

        for (coll, col) in [(&source, column), (&target, ref_column)] {
            if let Some(schema) = coll.schema() {
                if !schema.contains(col) {
                    return Err(NestedValuesError::UnknownColumn { path: col.to_string(), segment: col.to_string() });
                }
            }
        }

        let reference = ReferenceColumn::new(&source.get_name(), column, &target.get_name(), ref_column);
        debug!(
            collection = %reference.collection,
            relation = %reference.relation,
            target = %reference.ref_collection,
            "reference declared"
        );
        self.references.insert(reference.clone());
        Ok(reference)
    }

    /// Declare the conventional reference `collection.<singular ref>_<id_key>`
    /// -> `ref_collection.<id_key>`.
    pub fn infer_reference(&mut self, collection: &str, ref_collection: &str) -> Result<ReferenceColumn> {
        let target = self.require(ref_collection)?;
        let column = target.reference_column_name();
        let ref_column = target.get_config().id_key;
        self.create_reference(collection, &column, ref_collection, &ref_column)
    }
}

pub trait DbCommon {
    fn new_db() -> Self;
    fn new_db_with_config(config: DbConfig) -> Self;
    fn create(&self, coll_name: &str) -> MemoryCollection;
    fn create_with_config(&self, coll_name: &str, config: DbConfig) -> MemoryCollection;
    fn get(&self, coll_name: &str) -> Option<MemoryCollection>;
    fn list_collections(&self) -> Vec<String>;
    fn create_reference(&self, collection: &str, column: &str, ref_collection: &str, ref_column: &str) -> Result<ReferenceColumn>;
    fn infer_reference(&self, collection: &str, ref_collection: &str) -> Result<ReferenceColumn>;
    /// Start a values query over `coll_name`.
    fn query(&self, coll_name: &str) -> Result<ValuesQuery>;
}

impl DbCommon for Db {
    fn new_db() -> Self {
        InternalDb::default().into_protected()
    }

    fn new_db_with_config(config: DbConfig) -> Self {
        InternalDb::new_db_with_config(config).into_protected()
    }

    fn create(&self, coll_name: &str) -> MemoryCollection {
        let mut guard = self.write().unwrap_or_else(PoisonError::into_inner);
        let config = guard.config.clone();
        guard.create_with_config(coll_name, config)
    }

    fn create_with_config(&self, coll_name: &str, config: DbConfig) -> MemoryCollection {
        self.write().unwrap_or_else(PoisonError::into_inner).create_with_config(coll_name, config)
    }

    fn get(&self, coll_name: &str) -> Option<MemoryCollection> {
        self.read().unwrap_or_else(PoisonError::into_inner).get(coll_name)
    }

    fn list_collections(&self) -> Vec<String> {
        self.read().unwrap_or_else(PoisonError::into_inner).list_collections()
    }

    fn create_reference(&self, collection: &str, column: &str, ref_collection: &str, ref_column: &str) -> Result<ReferenceColumn> {
        self.write()?.create_reference(collection, column, ref_collection, ref_column)
    }

    fn infer_reference(&self, collection: &str, ref_collection: &str) -> Result<ReferenceColumn> {
        self.write()?.infer_reference(collection, ref_collection)
    }

    fn query(&self, coll_name: &str) -> Result<ValuesQuery> {
        let collection = self.read()?.require(coll_name)?;
        Ok(ValuesQuery::new(Arc::clone(self), &collection.get_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mk_db() -> Db {
        let db = Db::new_db_with_config(DbConfig::int("id"));
        db.create("Authors").add_batch(json!([{"id": 1, "name": "Ana"}]));
        db.create("Books").add_batch(json!([{"id": 1, "title": "T", "author_id": 1}]));
        db
    }

    #[test]
    fn collections_are_case_insensitive_and_listed_sorted() {
        let db = mk_db();
        assert!(db.get("AUTHORS").is_some());
        assert_eq!(db.list_collections(), vec!["authors".to_string(), "books".to_string()]);
    }

    #[test]
    fn create_uses_db_config() {
        let db = mk_db();
        let tags = db.create("tags");
        assert_eq!(tags.get_config(), DbConfig::int("id"));
    }

    #[test]
    fn reference_requires_known_collections_and_columns() {
        let db = mk_db();
        assert!(matches!(
            db.create_reference("books", "author_id", "writers", "id"),
            Err(NestedValuesError::UnknownCollection(name)) if name == "writers"
        ));
        assert!(matches!(
            db.create_reference("books", "writer_id", "authors", "id"),
            Err(NestedValuesError::UnknownColumn { .. })
        ));

        let reference = db.create_reference("books", "author_id", "authors", "id").unwrap();
        assert_eq!(reference.relation, "author");
    }

    #[test]
    fn infer_reference_uses_singular_name_and_id_key() {
        let db = mk_db();
        let reference = db.infer_reference("books", "authors").unwrap();
        assert_eq!(reference.column, "author_id");
        assert_eq!(reference.ref_column, "id");
        assert!(db.read().unwrap().references().outbound("books", "author").is_some());
    }

    #[test]
    fn query_rejects_unknown_collections() {
        let db = mk_db();
        assert!(db.query("books").is_ok());
        assert!(matches!(db.query("nope"), Err(NestedValuesError::UnknownCollection(_))));
    }
}
