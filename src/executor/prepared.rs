use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Statement};

use super::BatchResult;
use crate::batch::{SqlType, Value};
use crate::error::{BindError, ExecutorError};
use crate::keys::{RawKeyRow, RawKeyRows};

const SAVEPOINT: &str = "SAVEPOINT keybatch_insert";
const RELEASE: &str = "RELEASE keybatch_insert";
const ROLLBACK: &str = "ROLLBACK TO keybatch_insert; RELEASE keybatch_insert";

/// One prepared statement plus the rows queued against it.
///
/// Executed rows stay inside a savepoint until [`PreparedBatch::commit`].
/// Dropping or releasing the handle before that rolls them back.
pub struct PreparedBatch<'conn> {
    conn: &'conn Connection,
    stmt: Statement<'conn>,
    sql: String,
    columns: Vec<String>,
    types: Option<Vec<SqlType>>,
    bound: Option<Vec<Value>>,
    pending: Vec<Vec<Value>>,
    keys: Option<RawKeyRows>,
    savepoint_open: bool,
}

impl<'conn> PreparedBatch<'conn> {
    pub(super) fn new(conn: &'conn Connection, stmt: Statement<'conn>, sql: String) -> Self {
        let columns = stmt.column_names().into_iter().map(str::to_owned).collect();
        Self {
            conn,
            stmt,
            sql,
            columns,
            types: None,
            bound: None,
            pending: Vec::new(),
            keys: None,
            savepoint_open: false,
        }
    }

    /// Statement text as sent to the backend, including the `RETURNING` clause.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    pub fn key_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn pending_rows(&self) -> usize {
        self.pending.len()
    }

    pub fn declare_types(&mut self, types: &[SqlType]) {
        self.types = Some(types.to_vec());
    }

    /// Bind the values of the next row. Replaces a bound but not yet enqueued row.
    pub fn bind_row(&mut self, values: &[Value]) -> Result<(), BindError> {
        let row = self.pending.len();
        let expected = self.parameter_count();
        if values.len() != expected {
            return Err(BindError::Arity {
                row,
                expected,
                actual: values.len(),
            });
        }
        if let Some(types) = &self.types {
            for (i, (value, ty)) in values.iter().zip(types).enumerate() {
                if !value.fits(*ty) {
                    return Err(BindError::Type {
                        row,
                        parameter: i + 1,
                        expected: *ty,
                        actual: value.kind(),
                    });
                }
            }
        }
        self.bound = Some(values.to_vec());
        Ok(())
    }

    /// Queue the currently bound row. Nothing is executed yet.
    pub fn enqueue(&mut self) -> Result<(), BindError> {
        let row = self.pending.len();
        let values = self.bound.take().ok_or(BindError::Unbound { row })?;
        self.pending.push(values);
        Ok(())
    }

    /// Execute every queued row in submission order.
    ///
    /// The rows run inside a savepoint that stays open until [`Self::commit`].
    /// Any failure rolls back everything executed since the last commit.
    pub fn execute_batch(&mut self) -> Result<BatchResult, ExecutorError> {
        let pending = std::mem::take(&mut self.pending);
        self.keys = None;
        if pending.is_empty() {
            self.keys = Some(RawKeyRows::new(self.columns.clone()));
            return Ok(BatchResult::default());
        }

        log::debug!("executing batch of {} rows", pending.len());
        if !self.savepoint_open {
            self.conn
                .execute_batch(SAVEPOINT)
                .map_err(|source| ExecutorError::Execution { row: None, source })?;
            self.savepoint_open = true;
        }

        match self.run_rows(&pending) {
            Ok((result, keys)) => {
                self.keys = Some(keys);
                Ok(result)
            }
            Err(e) => {
                log::warn!("batch failed, rolling back: {}", e);
                self.rollback();
                Err(e)
            }
        }
    }

    fn run_rows(&mut self, pending: &[Vec<Value>]) -> Result<(BatchResult, RawKeyRows), ExecutorError> {
        let width = self.columns.len();
        let mut keys = RawKeyRows::new(self.columns.clone());
        let mut update_counts = Vec::with_capacity(pending.len());

        for (row, values) in pending.iter().enumerate() {
            for (i, value) in values.iter().enumerate() {
                self.stmt
                    .raw_bind_parameter(i + 1, value)
                    .map_err(|source| BindError::Backend {
                        row,
                        parameter: i + 1,
                        source,
                    })?;
            }

            let execution = |source: rusqlite::Error| ExecutorError::Execution {
                row: Some(row),
                source,
            };
            let mut rows = self.stmt.raw_query();
            while let Some(key_row) = rows.next().map_err(execution)? {
                let mut cells = Vec::with_capacity(width);
                for column in 0..width {
                    cells.push(key_row.get::<_, SqlValue>(column).map_err(execution)?);
                }
                keys.push(RawKeyRow {
                    batch_row: row,
                    values: cells,
                });
            }
            drop(rows);
            update_counts.push(self.conn.changes() as usize);
        }

        Ok((BatchResult { update_counts }, keys))
    }

    fn rollback(&mut self) {
        if !self.savepoint_open {
            return;
        }
        if let Err(e) = self.conn.execute_batch(ROLLBACK) {
            log::error!("failed to roll back batch savepoint: {}", e);
        }
        self.savepoint_open = false;
    }

    /// Take the generated keys of the last successful [`Self::execute_batch`].
    pub fn fetch_generated_keys(&mut self) -> Result<RawKeyRows, ExecutorError> {
        self.keys.take().ok_or(ExecutorError::KeysUnavailable)
    }

    /// Make the executed rows permanent and finalize the statement.
    ///
    /// Inside a caller's transaction the rows become part of that transaction.
    pub fn commit(mut self) -> Result<(), ExecutorError> {
        if self.savepoint_open {
            if let Err(source) = self.conn.execute_batch(RELEASE) {
                self.rollback();
                return Err(ExecutorError::Execution { row: None, source });
            }
            self.savepoint_open = false;
        }
        log::trace!("committed prepared statement: {}", self.sql);
        Ok(())
    }

    /// Finalize the statement now instead of at end of scope, discarding
    /// anything executed but not committed.
    pub fn release(mut self) {
        self.rollback();
        log::trace!("releasing prepared statement: {}", self.sql);
    }
}

impl Drop for PreparedBatch<'_> {
    fn drop(&mut self) {
        self.rollback();
    }
}
