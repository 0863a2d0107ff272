use std::collections::HashMap;

use indexmap::IndexMap;

/// A foreign-key-like link from `collection.column` to
/// `ref_collection.ref_column`.
///
/// The relation is addressed in column paths by its `relation` name, which is
/// `column` without a trailing `_<ref_column>` (`author_id` -> `author`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceColumn {
    pub collection: String,
    pub column: String,
    pub ref_collection: String,
    pub ref_column: String,
    pub relation: String,
}

impl ReferenceColumn {
    pub fn new(collection: &str, column: &str, ref_collection: &str, ref_column: &str) -> Self {
        Self {
            collection: collection.to_string(),
            column: column.to_string(),
            ref_collection: ref_collection.to_string(),
            ref_column: ref_column.to_string(),
            relation: Self::relation_name(column, ref_column),
        }
    }

    pub fn relation_name(column: &str, ref_column: &str) -> String {
        match column.strip_suffix(ref_column).and_then(|rest| rest.strip_suffix('_')) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => column.to_string(),
        }
    }

    /// Whether a path segment addresses this reference, by relation name or by
    /// raw column.
    pub fn matches(&self, segment: &str) -> bool {
        self.relation == segment || self.column == segment
    }
}

/// All references declared on a `Db`, indexed both ways.
#[derive(Debug, Default, Clone)]
pub struct DbReferences {
    /// collection -> relation name -> reference held by that collection
    outbound: HashMap<String, IndexMap<String, ReferenceColumn>>,
    /// referenced collection -> references pointing at it
    inbound: HashMap<String, Vec<ReferenceColumn>>,
}

impl DbReferences {
    pub fn insert(&mut self, reference: ReferenceColumn) {
        let inbound = self.inbound.entry(reference.ref_collection.clone()).or_default();
        inbound.retain(|r| !(r.collection == reference.collection && r.column == reference.column));
        inbound.push(reference.clone());

        let outbound = self.outbound.entry(reference.collection.clone()).or_default();
        outbound.retain(|_, r| r.column != reference.column);
        outbound.insert(reference.relation.clone(), reference);
    }

    /// Forward reference of `collection` addressed by `segment`.
    pub fn outbound(&self, collection: &str, segment: &str) -> Option<&ReferenceColumn> {
        let refs = self.outbound.get(collection)?;
        refs.get(segment).or_else(|| refs.values().find(|r| r.matches(segment)))
    }

    /// Forward reference of `collection` whose raw column is `column`.
    pub fn outbound_by_column(&self, collection: &str, column: &str) -> Option<&ReferenceColumn> {
        self.outbound.get(collection)?.values().find(|r| r.column == column)
    }

    /// Reference held by `referrer` that points back at `collection`.
    pub fn inbound(&self, collection: &str, referrer: &str) -> Option<&ReferenceColumn> {
        self.inbound.get(collection)?.iter().find(|r| r.collection == referrer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_name_strips_ref_column_suffix() {
        assert_eq!(ReferenceColumn::relation_name("author_id", "id"), "author");
        assert_eq!(ReferenceColumn::relation_name("owner_code", "code"), "owner");
        assert_eq!(ReferenceColumn::relation_name("editor", "id"), "editor");
        assert_eq!(ReferenceColumn::relation_name("_id", "id"), "_id");
    }

    #[test]
    fn lookups_work_in_both_directions() {
        let mut refs = DbReferences::default();
        refs.insert(ReferenceColumn::new("books", "author_id", "authors", "id"));

        assert_eq!(refs.outbound("books", "author").unwrap().column, "author_id");
        assert_eq!(refs.outbound("books", "author_id").unwrap().relation, "author");
        assert!(refs.outbound("books", "publisher").is_none());
        assert!(refs.outbound_by_column("books", "author_id").is_some());
        assert_eq!(refs.inbound("authors", "books").unwrap().column, "author_id");
        assert!(refs.inbound("books", "authors").is_none());
    }

    #[test]
    fn redeclaring_a_reference_replaces_it() {
        let mut refs = DbReferences::default();
        refs.insert(ReferenceColumn::new("books", "author_id", "authors", "id"));
        refs.insert(ReferenceColumn::new("books", "author_id", "authors", "code"));

        assert_eq!(refs.inbound("authors", "books").unwrap().ref_column, "code");
        assert!(refs.outbound("books", "author").is_none());
        assert_eq!(refs.outbound("books", "author_id").unwrap().ref_column, "code");
    }
}
