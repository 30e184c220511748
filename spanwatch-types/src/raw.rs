//! Raw tabular input, exactly as an ingestion adapter read it.

use std::collections::BTreeMap;

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawValue {
    /// A number the adapter already recognised.
    Number(f64),
    /// Anything else, verbatim.
    Text(String),
    /// An absent cell.
    Empty,
}

impl RawValue {
    /// Build a text cell, mapping blank strings to [`RawValue::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s)
        }
    }

    /// Whether the cell carries no content at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, RawValue::Empty)
    }

    /// The cell rendered as a trimmed string, if it has content.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            RawValue::Empty => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::text(s)
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::text(s)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Empty, Into::into)
    }
}

/// One input row: column name to cell.
pub type RawRow = BTreeMap<String, RawValue>;

/// A fully materialised batch of input rows.
///
/// `columns` preserves header order as first seen across all sources; it is
/// the basis for metric-column discovery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    /// Column names in first-seen order.
    pub columns: Vec<String>,
    /// Rows in input order.
    pub rows: Vec<RawRow>,
}

impl RawBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, registering any columns not seen before.
    pub fn push(&mut self, row: RawRow) {
        for name in row.keys() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
            }
        }
        self.rows.push(row);
    }

    /// Append every row of another batch.
    pub fn extend(&mut self, other: RawBatch) {
        for name in other.columns {
            if !self.columns.contains(&name) {
                self.columns.push(name);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Create a builder for assembling batches in tests and adapters.
    pub fn builder() -> RawBatchBuilder {
        RawBatchBuilder::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builder for [`RawBatch`].
#[derive(Debug, Default)]
pub struct RawBatchBuilder {
    batch: RawBatch,
}

impl RawBatchBuilder {
    /// Add a row from `(column, value)` pairs.
    pub fn row<I, K, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        let row: RawRow = cells
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.batch.push(row);
        self
    }

    /// Build the batch.
    pub fn build(self) -> RawBatch {
        self.batch
    }
}
