mod value;

use std::fmt;

pub use value::{SqlType, Value};

use crate::error::BindError;

/// Ordered parameter rows for repeated executions of one statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBatch {
    rows: Vec<Vec<Value>>,
    types: Option<Vec<SqlType>>,
}

impl ParameterBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        Self { rows, types: None }
    }

    /// Declare the SQL type of every column; binding rejects values that don't fit.
    pub fn with_types(mut self, types: Vec<SqlType>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn push<I, V>(&mut self, row: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn types(&self) -> Option<&[SqlType]> {
        self.types.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Arity shared by all rows, taken from the first one.
    pub fn arity(&self) -> Option<usize> {
        self.rows.first().map(Vec::len)
    }

    /// Reject ragged batches: every row must have the arity of row 0, and
    /// declared types (if any) must cover exactly that many columns.
    pub fn check_uniform(&self) -> Result<(), BindError> {
        let Some(expected) = self.types.as_ref().map(Vec::len).or(self.arity()) else {
            return Ok(());
        };
        match self.rows.iter().position(|row| row.len() != expected) {
            Some(row) => Err(BindError::Arity {
                row,
                expected,
                actual: self.rows[row].len(),
            }),
            None => Ok(()),
        }
    }
}

impl<R, V> FromIterator<R> for ParameterBatch
where
    R: IntoIterator<Item = V>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        let mut batch = ParameterBatch::new();
        for row in iter {
            batch.push(row);
        }
        batch
    }
}

impl fmt::Display for ParameterBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{value}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}
