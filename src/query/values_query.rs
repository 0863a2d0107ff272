use std::{cmp::Ordering, collections::BTreeMap};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::{
    database::Db,
    error::{NestedValuesError, Result},
    nested::{NestedSpec, NestedValuesQuery, RowLayout},
    query::{Annotation, ColumnPath, Expr, Helpers, Lookup, PathResolver, RowSource, Rows},
};

#[derive(Debug, Clone)]
struct Filter {
    path: String,
    lookup: Lookup,
    negated: bool,
}

#[derive(Debug, Clone)]
struct OrderKey {
    path: String,
    ascending: bool,
}

/// A `values_list`-style query over one collection of a [`Db`].
///
/// Builder methods consume and return the query, so deriving a query from
/// another is a clone plus a modification. Rows follow the physical layout
/// `extras, plain fields, annotations`; extras keep declaration order and
/// annotations are sorted by name.
#[derive(Debug, Clone)]
pub struct ValuesQuery {
    db: Db,
    collection: String,
    filters: Vec<Filter>,
    ordering: Vec<OrderKey>,
    extras: IndexMap<String, Expr>,
    annotations: BTreeMap<String, Annotation>,
    offset: usize,
    limit: Option<usize>,
}

impl ValuesQuery {
    pub fn new(db: Db, collection: &str) -> Self {
        Self {
            db,
            collection: collection.to_ascii_lowercase(),
            filters: Vec::new(),
            ordering: Vec::new(),
            extras: IndexMap::new(),
            annotations: BTreeMap::new(),
            offset: 0,
            limit: None,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filter(mut self, path: &str, lookup: impl Into<Lookup>) -> Self {
        self.filters.push(Filter { path: path.to_string(), lookup: lookup.into(), negated: false });
        self
    }

    pub fn exclude(mut self, path: &str, lookup: impl Into<Lookup>) -> Self {
        self.filters.push(Filter { path: path.to_string(), lookup: lookup.into(), negated: true });
        self
    }

    /// Order by a column path, extra or annotation; a leading `-` sorts
    /// descending. Nulls always sort last.
    pub fn order_by(mut self, path: &str) -> Self {
        let (path, ascending) = match path.strip_prefix('-') {
            Some(path) => (path, false),
            None => (path, true),
        };
        self.ordering.push(OrderKey { path: path.to_string(), ascending });
        self
    }

    pub fn extra(mut self, name: &str, expr: Expr) -> Self {
        self.extras.insert(name.to_string(), expr);
        self
    }

    pub fn annotate(mut self, name: &str, annotation: impl Into<Annotation>) -> Self {
        self.annotations.insert(name.to_string(), annotation.into());
        self
    }

    pub fn slice(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Physical layout of the rows returned for `columns`. Every extra is
    /// selected; annotations only when requested, each once.
    pub fn layout_for(&self, columns: &[String]) -> RowLayout {
        let fields = columns.iter()
            .filter(|c| !self.extras.contains_key(*c) && !self.annotations.contains_key(*c))
            .cloned()
            .collect();
        let annotations = self.annotations.keys()
            .filter(|name| columns.contains(name))
            .cloned()
            .collect();

        RowLayout::new(self.extras.keys().cloned().collect(), fields, annotations)
    }

    /// Attach a nested projection; rows then come back as nested maps.
    pub fn nested_values(self, spec: impl Into<NestedSpec>) -> NestedValuesQuery<ValuesQuery> {
        NestedValuesQuery::new(self, spec)
    }

    /// Flat rows for `columns`, in physical layout order.
    pub fn values_list(&self, columns: &[&str]) -> Result<Vec<Vec<Value>>> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.values_rows(&columns)?.rows.collect()
    }
}

impl RowSource for ValuesQuery {
    fn values_rows(&self, columns: &[String]) -> Result<Rows<'_>> {
        let layout = self.layout_for(columns);
        trace!(
            collection = %self.collection,
            extras = layout.extras().len(),
            fields = layout.fields().len(),
            annotations = layout.annotations().len(),
            "values query"
        );

        let selected = {
            let guard = self.db.read()?;
            let ctx = QueryContext { resolver: PathResolver::new(&guard), query: self };
            ctx.validate(&layout)?;

            let docs = guard.get(&self.collection)
                .ok_or_else(|| NestedValuesError::UnknownCollection(self.collection.clone()))?
                .read()?
                .get_all();

            let mut selected = Vec::new();
            for doc in docs {
                if ctx.accepts(&doc)? {
                    selected.push(doc);
                }
            }

            if !self.ordering.is_empty() {
                selected = ctx.sorted(selected)?;
            }
            selected
        };

        // rows are built as they are pulled
        let row_layout = layout.clone();
        let rows = selected.into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .map(move |doc| -> Result<Vec<Value>> {
                let guard = self.db.read()?;
                let ctx = QueryContext { resolver: PathResolver::new(&guard), query: self };
                ctx.row(&doc, &row_layout)
            });

        Ok(Rows::new(layout, rows))
    }
}

struct QueryContext<'a> {
    resolver: PathResolver<'a>,
    query: &'a ValuesQuery,
}

impl QueryContext<'_> {
    fn collection(&self) -> &str {
        &self.query.collection
    }

    fn is_computed(&self, path: &str) -> bool {
        self.query.extras.contains_key(path) || self.query.annotations.contains_key(path)
    }

    fn validate_path(&self, collection: &str, path: &str) -> Result<()> {
        self.resolver.validate(collection, &ColumnPath::parse(path))
    }

    fn validate(&self, layout: &RowLayout) -> Result<()> {
        for path in layout.fields() {
            self.validate_path(self.collection(), path)?;
        }
        let referenced = self.query.filters.iter().map(|f| &f.path)
            .chain(self.query.ordering.iter().map(|o| &o.path));
        for path in referenced {
            if !self.is_computed(path) {
                self.validate_path(self.collection(), path)?;
            }
        }
        for expr in self.query.extras.values() {
            for path in expr.paths() {
                self.validate_path(self.collection(), path)?;
            }
        }
        for annotation in self.query.annotations.values() {
            match annotation {
                Annotation::Expr(expr) => {
                    for path in expr.paths() {
                        self.validate_path(self.collection(), path)?;
                    }
                }
                Annotation::Aggregate(call) => {
                    let (referrer, inner) = self.split_aggregate(&call.path)?;
                    if let Some(inner) = inner {
                        self.resolver.validate(&referrer, &inner)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Referring collection of an aggregate path, plus the path inside it.
    fn split_aggregate(&self, path: &str) -> Result<(String, Option<ColumnPath>)> {
        let parsed = ColumnPath::parse(path);
        let unknown = |segment: &str| NestedValuesError::UnknownColumn {
            path: path.to_string(),
            segment: segment.to_string(),
        };
        let (referrer, rest) = parsed.segments().split_first().ok_or_else(|| unknown(""))?;
        if self.resolver.db().references().inbound(self.collection(), referrer).is_none() {
            return Err(unknown(referrer.as_str()));
        }
        let inner = (!rest.is_empty()).then(|| ColumnPath::parse(&rest.join("__")));
        Ok((referrer.clone(), inner))
    }

    fn value_of(&self, doc: &Value, path: &str) -> Result<Value> {
        if let Some(expr) = self.query.extras.get(path) {
            return self.eval(doc, expr);
        }
        if let Some(annotation) = self.query.annotations.get(path) {
            return self.annotation(doc, annotation);
        }
        self.resolver.resolve(self.collection(), doc, &ColumnPath::parse(path))
    }

    fn eval(&self, doc: &Value, expr: &Expr) -> Result<Value> {
        expr.eval(&mut |path: &str| self.resolver.resolve(self.collection(), doc, &ColumnPath::parse(path)))
    }

    fn annotation(&self, doc: &Value, annotation: &Annotation) -> Result<Value> {
        let call = match annotation {
            Annotation::Expr(expr) => return self.eval(doc, expr),
            Annotation::Aggregate(call) => call,
        };

        let (referrer, inner) = self.split_aggregate(&call.path)?;
        let db = self.resolver.db();
        let Some(reference) = db.references().inbound(self.collection(), &referrer) else {
            return Ok(Value::Null);
        };
        let key = doc.get(&reference.ref_column).cloned().unwrap_or(Value::Null);
        let related: Vec<Value> = db.get(&reference.collection)
            .ok_or_else(|| NestedValuesError::UnknownCollection(reference.collection.clone()))?
            .read()?
            .filter_by(&reference.column, &key)
            .cloned()
            .collect();

        let mut acc = call.func.create_accumulator();
        for item in &related {
            let value = match &inner {
                Some(path) => self.resolver.resolve(&reference.collection, item, path)?,
                None => item.clone(),
            };
            if !value.is_null() {
                acc.update(&value)?;
            }
        }
        Ok(acc.finalize())
    }

    fn accepts(&self, doc: &Value) -> Result<bool> {
        for filter in &self.query.filters {
            let value = self.value_of(doc, &filter.path)?;
            if filter.lookup.matches(&value) == filter.negated {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn sorted(&self, docs: Vec<Value>) -> Result<Vec<Value>> {
        let ordering = &self.query.ordering;
        let mut keyed = docs.into_iter()
            .map(|doc| {
                let keys = ordering.iter()
                    .map(|o| self.value_of(&doc, &o.path))
                    .collect::<Result<Vec<_>>>()?;
                Ok((keys, doc))
            })
            .collect::<Result<Vec<_>>>()?;

        // stable sort
        keyed.sort_by(|(a, _), (b, _)| {
            for ((x, y), key) in a.iter().zip(b).zip(ordering) {
                let ord = Helpers::cmp_json_for_sort(x, y, key.ascending);
                if !ord.is_eq() {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, doc)| doc).collect())
    }

    fn row(&self, doc: &Value, layout: &RowLayout) -> Result<Vec<Value>> {
        let mut row = Vec::with_capacity(layout.width());
        for name in layout.extras() {
            row.push(self.value_of(doc, name)?);
        }
        for path in layout.fields() {
            row.push(self.resolver.resolve(self.collection(), doc, &ColumnPath::parse(path))?);
        }
        for name in layout.annotations() {
            row.push(self.value_of(doc, name)?);
        }
        Ok(row)
    }
}

/// Query-building shortcuts that derive a new nested query from this one.
impl NestedValuesQuery<ValuesQuery> {
    pub fn filter(&self, path: &str, lookup: impl Into<Lookup>) -> Self {
        self.derive(|q| q.filter(path, lookup))
    }

    pub fn exclude(&self, path: &str, lookup: impl Into<Lookup>) -> Self {
        self.derive(|q| q.exclude(path, lookup))
    }

    pub fn order_by(&self, path: &str) -> Self {
        self.derive(|q| q.order_by(path))
    }

    pub fn extra(&self, name: &str, expr: Expr) -> Self {
        self.derive(|q| q.extra(name, expr))
    }

    pub fn annotate(&self, name: &str, annotation: impl Into<Annotation>) -> Self {
        self.derive(|q| q.annotate(name, annotation))
    }

    pub fn slice(&self, offset: usize, limit: Option<usize>) -> Self {
        self.derive(|q| q.slice(offset, limit))
    }
}
