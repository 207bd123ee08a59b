mod decoder;

pub use decoder::{Entities, Entity, EntityDecoder, KeyDecoder};

use rusqlite::types::Value as SqlValue;

use crate::error::DecodeError;

/// One row of the generated-key result, tagged with the batch row that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawKeyRow {
    pub batch_row: usize,
    pub values: Vec<SqlValue>,
}

impl RawKeyRow {
    pub fn get(&self, column: usize) -> Option<&SqlValue> {
        self.values.get(column)
    }
}

/// Generated-key rows in the order the backend returned them.
///
/// Consumed by value: once decoded the rows are gone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawKeyRows {
    columns: Vec<String>,
    rows: Vec<RawKeyRow>,
}

impl RawKeyRows {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: RawKeyRow) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawKeyRow> {
        self.rows.iter()
    }

    /// Check that there is exactly one key row per batch row, in submission order.
    pub fn verify_order(&self, batch_len: usize) -> Result<(), DecodeError> {
        if self.rows.len() != batch_len {
            return Err(DecodeError::KeyCount {
                expected: batch_len,
                actual: self.rows.len(),
            });
        }
        match self
            .rows
            .iter()
            .enumerate()
            .find(|(position, row)| row.batch_row != *position)
        {
            Some((position, row)) => Err(DecodeError::OutOfOrder {
                position,
                batch_row: row.batch_row,
            }),
            None => Ok(()),
        }
    }
}

impl IntoIterator for RawKeyRows {
    type Item = RawKeyRow;
    type IntoIter = std::vec::IntoIter<RawKeyRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
