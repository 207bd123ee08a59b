use std::time::Instant;

use rusqlite::Connection;

use crate::batch::ParameterBatch;
use crate::error::{BatchError, ExecutorError};
use crate::executor::{KeyColumns, StatementExecutor};
use crate::keys::KeyDecoder;

/// Runs batched inserts and hands back the generated keys, decoded.
#[derive(Clone, Debug, Default)]
pub struct QueryRunner {
    key_columns: KeyColumns,
}

impl QueryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_columns(mut self, key_columns: KeyColumns) -> Self {
        self.key_columns = key_columns;
        self
    }

    /// Insert every row of `params` with one prepared `sql` statement and
    /// decode the generated keys, one per row, in submission order.
    ///
    /// Missing arguments are rejected before the connection is touched.
    /// Any later failure rolls the batch back and is reported together
    /// with the statement and its parameters.
    pub fn insert_batch<'a, T, D>(
        &self,
        conn: impl Into<Option<&'a Connection>>,
        sql: impl Into<Option<&'a str>>,
        decoder: D,
        params: impl Into<Option<&'a ParameterBatch>>,
    ) -> Result<T, BatchError>
    where
        D: KeyDecoder<T>,
    {
        let conn = conn.into().ok_or(BatchError::NullConnection)?;
        let sql = sql
            .into()
            .filter(|sql| !sql.trim().is_empty())
            .ok_or(BatchError::NullStatement)?;
        let params = params.into().ok_or(BatchError::NullParameters)?;

        let _span = tracing::debug_span!("insert_batch", rows = params.len()).entered();
        self.run(conn, sql, &decoder, params)
            .map_err(|source| BatchError::Query {
                sql: sql.to_owned(),
                params: params.clone(),
                source,
            })
    }

    fn run<T, D>(
        &self,
        conn: &Connection,
        sql: &str,
        decoder: &D,
        params: &ParameterBatch,
    ) -> Result<T, ExecutorError>
    where
        D: KeyDecoder<T>,
    {
        params.check_uniform()?;

        let mut prepared = StatementExecutor::new(conn).prepare(sql, &self.key_columns)?;
        if let Some(types) = params.types() {
            prepared.declare_types(types);
        }
        // bind and enqueue each row before touching the next one
        for row in params.rows() {
            prepared.bind_row(row)?;
            prepared.enqueue()?;
        }

        let started = Instant::now();
        let result = prepared.execute_batch()?;
        let keys = prepared.fetch_generated_keys()?;
        keys.verify_order(params.len())?;
        // dropping `prepared` on any error here rolls the rows back
        let decoded = decoder.decode(keys)?;
        prepared.commit()?;
        log::debug!(
            "batch of {} rows affected {} rows in {:?}",
            params.len(),
            result.total(),
            started.elapsed()
        );
        Ok(decoded)
    }
}
