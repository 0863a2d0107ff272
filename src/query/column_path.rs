use std::{borrow::Cow, fmt::Display};

use serde_json::Value;

use crate::{database::{DbCollection, InternalDb}, error::{NestedValuesError, Result}};

/// A column path such as `author__publisher__name` or `author.publisher.name`.
///
/// Every segment but the last follows a forward reference, addressed by
/// relation name (`author`) or raw column (`author_id`). The last segment is a
/// stored field, or a relation name standing for its raw foreign-key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    raw: String,
    segments: Vec<String>,
}

impl ColumnPath {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split("__")
            .flat_map(|part| part.split('.'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self { raw: path.to_string(), segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn unknown(&self, segment: &str) -> NestedValuesError {
        NestedValuesError::UnknownColumn { path: self.raw.clone(), segment: segment.to_string() }
    }
}

impl Display for ColumnPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ColumnPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Resolves column paths against the documents and references of a `Db`.
pub struct PathResolver<'a> {
    db: &'a InternalDb,
}

impl<'a> PathResolver<'a> {
    pub fn new(db: &'a InternalDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &'a InternalDb {
        self.db
    }

    /// Check that every segment of `path` names something, starting from
    /// `collection`. Collections with no documents yet accept any field name.
    pub fn validate(&self, collection: &str, path: &ColumnPath) -> Result<()> {
        let Some((last, hops)) = path.segments().split_last() else {
            return Err(path.unknown(""));
        };

        let mut current = collection.to_string();
        for segment in hops {
            let reference = self.db.references()
                .outbound(&current, segment)
                .ok_or_else(|| path.unknown(segment))?;
            current = reference.ref_collection.clone();
        }

        if self.db.references().outbound(&current, last).is_some() {
            return Ok(());
        }
        let coll = self.db.get(&current)
            .ok_or_else(|| NestedValuesError::UnknownCollection(current.clone()))?;
        match coll.schema() {
            Some(schema) if !schema.contains(last) => Err(path.unknown(last)),
            _ => Ok(()),
        }
    }

    /// Value of `path` for `doc`, a document of `collection`. A null or
    /// dangling reference along the way yields null.
    pub fn resolve(&self, collection: &str, doc: &Value, path: &ColumnPath) -> Result<Value> {
        let Some((last, hops)) = path.segments().split_last() else {
            return Err(path.unknown(""));
        };

        let mut current = collection.to_string();
        let mut doc = Cow::Borrowed(doc);
        for segment in hops {
            let reference = self.db.references()
                .outbound(&current, segment)
                .ok_or_else(|| path.unknown(segment))?;
            let key = doc.get(&reference.column).cloned().unwrap_or(Value::Null);
            let target = self.db.get(&reference.ref_collection)
                .ok_or_else(|| NestedValuesError::UnknownCollection(reference.ref_collection.clone()))?;
            let found = target.read()?.find_by(&reference.ref_column, &key).cloned();
            match found {
                Some(next) => doc = Cow::Owned(next),
                None => return Ok(Value::Null),
            }
            current = reference.ref_collection.clone();
        }

        if let Some(value) = doc.get(last) {
            return Ok(value.clone());
        }
        match self.db.references().outbound(&current, last) {
            Some(reference) => Ok(doc.get(&reference.column).cloned().unwrap_or(Value::Null)),
            None => Ok(Value::Null),
        }
    }
}
