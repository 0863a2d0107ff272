use std::collections::{HashMap, HashSet};

use crate::{database::{Db, DbCollection}, error::{NestedValuesError, Result}, nested::FieldSpec};

/// Options for [`fields_map`].
///
/// `attname` picks how foreign keys are addressed: `true` uses the raw column
/// (`author_id`), `false` the relation name (`author`). Both resolve to the
/// same stored value.
#[derive(Debug, Clone)]
pub struct FieldsMapOptions {
    pub fields: Option<HashSet<String>>,
    pub exclude: HashSet<String>,
    pub prefix: String,
    pub key_prefix: String,
    pub attname: bool,
    pub rename: HashMap<String, String>,
}

impl Default for FieldsMapOptions {
    fn default() -> Self {
        Self {
            fields: None,
            exclude: HashSet::new(),
            prefix: String::new(),
            key_prefix: String::new(),
            attname: true,
            rename: HashMap::new(),
        }
    }
}

impl FieldsMapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Column path prefix, e.g. `"author__"` to reach a related collection.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Prefix added to every output key.
    pub fn key_prefix(mut self, key_prefix: &str) -> Self {
        self.key_prefix = key_prefix.to_string();
        self
    }

    pub fn attname(mut self, attname: bool) -> Self {
        self.attname = attname;
        self
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.rename.insert(from.to_string(), to.to_string());
        self
    }
}

/// Field specs for every stored field of `collection`, in schema order.
///
/// A field is matched against `fields` and `exclude` by either of its names
/// (raw column or relation name).
pub fn fields_map(db: &Db, collection: &str, options: &FieldsMapOptions) -> Result<Vec<FieldSpec>> {
    let coll_name = collection.to_ascii_lowercase();
    let guard = db.read()?;
    let schema = guard.get(&coll_name)
        .ok_or_else(|| NestedValuesError::UnknownCollection(collection.to_string()))?
        .schema()
        .unwrap_or_default();

    let mut specs = Vec::with_capacity(schema.fields.len());
    for (column, info) in &schema.fields {
        if !info.ty.is_scalar() {
            continue;
        }
        let name = guard.references()
            .outbound_by_column(&coll_name, column)
            .map(|r| r.relation.as_str())
            .unwrap_or(column);

        if let Some(fields) = &options.fields {
            if !fields.contains(column) && !fields.contains(name) {
                continue;
            }
        }
        if options.exclude.contains(column) || options.exclude.contains(name) {
            continue;
        }

        let param = if options.attname { column.as_str() } else { name };
        let key = options.rename.get(param).map(String::as_str).unwrap_or(param);
        specs.push(FieldSpec::new(
            &format!("{}{}", options.prefix, param),
            &format!("{}{}", options.key_prefix, key),
        ));
    }

    Ok(specs)
}
