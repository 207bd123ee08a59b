use rusqlite::types::Type;
use thiserror::Error;

use crate::batch::{ParameterBatch, SqlType};

/// A row could not be bound to the prepared statement.
///
/// `row` is the 0-based batch row; `parameter` is the 1-based placeholder index.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("wrong number of parameters in row {row}: expected {expected}, was given {actual}")]
    Arity {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} parameter {parameter}: expected {expected}, got {actual}")]
    Type {
        row: usize,
        parameter: usize,
        expected: SqlType,
        actual: &'static str,
    },
    #[error("row {row} was enqueued without being bound")]
    Unbound { row: usize },
    #[error("row {row} parameter {parameter}: {source}")]
    Backend {
        row: usize,
        parameter: usize,
        #[source]
        source: rusqlite::Error,
    },
}

impl BindError {
    pub fn row(&self) -> usize {
        match self {
            BindError::Arity { row, .. }
            | BindError::Type { row, .. }
            | BindError::Unbound { row }
            | BindError::Backend { row, .. } => *row,
        }
    }
}

/// The generated-key result could not be turned into output values.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("key row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },
    #[error("key row {row} column {column}: cannot read {found} as {expected}")]
    Coercion {
        row: usize,
        column: usize,
        expected: &'static str,
        found: Type,
    },
    #[error("expected {expected} generated keys, backend returned {actual}")]
    KeyCount { expected: usize, actual: usize },
    #[error("generated key at position {position} belongs to batch row {batch_row}")]
    OutOfOrder { position: usize, batch_row: usize },
    #[error("key row {row}: {reason}")]
    Invalid { row: usize, reason: String },
}

/// Failure inside the statement executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("connection unusable: {0}")]
    Connection(#[source] rusqlite::Error),
    #[error("malformed statement: {0}")]
    Statement(#[source] rusqlite::Error),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("batch execution failed{}: {source}", at_row(.row))]
    Execution {
        row: Option<usize>,
        #[source]
        source: rusqlite::Error,
    },
    #[error("generated keys are only available after a successful batch execution")]
    KeysUnavailable,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ExecutorError {
    /// Index of the batch row that caused the failure, when known.
    pub fn row(&self) -> Option<usize> {
        match self {
            ExecutorError::Bind(e) => Some(e.row()),
            ExecutorError::Execution { row, .. } => *row,
            _ => None,
        }
    }

    /// Whether the backend gave up waiting for a lock.
    pub fn is_timeout(&self) -> bool {
        match self {
            ExecutorError::Execution { source, .. } => matches!(
                source.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

fn at_row(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at row {row}"),
        None => String::new(),
    }
}

/// Error returned by [`crate::QueryRunner::insert_batch`].
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("null connection")]
    NullConnection,
    #[error("null SQL statement")]
    NullStatement,
    #[error("null parameters; if parameters aren't needed, pass an empty batch")]
    NullParameters,
    #[error("{source} Query: {sql} Parameters: {params}")]
    Query {
        sql: String,
        params: ParameterBatch,
        #[source]
        source: ExecutorError,
    },
}

impl BatchError {
    pub fn executor(&self) -> Option<&ExecutorError> {
        match self {
            BatchError::Query { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn row(&self) -> Option<usize> {
        self.executor().and_then(ExecutorError::row)
    }
}
