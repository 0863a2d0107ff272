use std::borrow::Cow;

use tracing::debug;

use crate::nested::CompiledSpec;

/// Physical layout of the rows a source returns: extra columns first, then
/// plain fields in request order, then annotation columns sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLayout {
    extras: Vec<String>,
    fields: Vec<String>,
    annotations: Vec<String>,
}

impl RowLayout {
    pub fn new(extras: Vec<String>, fields: Vec<String>, mut annotations: Vec<String>) -> Self {
        annotations.sort();
        Self { extras, fields, annotations }
    }

    /// Rows made of the requested plain fields and nothing else.
    pub fn plain(fields: Vec<String>) -> Self {
        Self { fields, ..Default::default() }
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn width(&self) -> usize {
        self.extras.len() + self.fields.len() + self.annotations.len()
    }

    pub fn is_plain(&self) -> bool {
        self.extras.is_empty() && self.annotations.is_empty()
    }

    /// Physical row offset of each requested column, indexed by its position
    /// in `columns`.
    pub fn physical_offsets(&self, columns: &[String]) -> Vec<usize> {
        let annotations_start = self.extras.len() + self.fields.len();
        // plain fields shift right by the extras and left by every computed
        // column requested before them
        let mut plain_seen = 0;

        columns.iter()
            .map(|column| {
                if let Ok(rank) = self.annotations.binary_search(column) {
                    annotations_start + rank
                } else if let Some(offset) = self.extras.iter().position(|e| e == column) {
                    offset
                } else {
                    plain_seen += 1;
                    self.extras.len() + plain_seen - 1
                }
            })
            .collect()
    }
}

impl CompiledSpec {
    /// Indices adjusted to `layout`. Plain layouts need no rewriting and borrow
    /// `self`; otherwise a corrected copy is returned and `self` is untouched,
    /// so the same compiled spec can serve any number of executions.
    pub fn corrected_for(&self, layout: &RowLayout) -> Cow<'_, CompiledSpec> {
        if layout.is_plain() {
            return Cow::Borrowed(self);
        }

        let offsets = layout.physical_offsets(&self.columns);
        debug!(
            extras = layout.extras().len(),
            annotations = layout.annotations().len(),
            "rewriting projection indices for row layout"
        );

        let mut corrected = self.clone();
        corrected.root.remap(&offsets);
        Cow::Owned(corrected)
    }
}
