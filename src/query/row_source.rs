use serde_json::Value;

use crate::{error::Result, nested::RowLayout};

/// Rows returned for one execution, with the physical layout they follow.
pub struct Rows<'a> {
    pub layout: RowLayout,
    pub rows: Box<dyn Iterator<Item = Result<Vec<Value>>> + 'a>,
}

impl<'a> Rows<'a> {
    pub fn new<I>(layout: RowLayout, rows: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<Value>>>,
        I::IntoIter: 'a,
    {
        Self { layout, rows: Box::new(rows.into_iter()) }
    }
}

/// Anything that can run a query for a flat list of column paths.
///
/// `Clone` is the copy-on-modify hook: a derived query is a modified clone,
/// and nested projections ride along on every clone.
pub trait RowSource: Clone {
    fn values_rows(&self, columns: &[String]) -> Result<Rows<'_>>;
}
