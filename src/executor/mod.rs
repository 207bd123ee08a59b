mod prepared;

pub use prepared::PreparedBatch;

use rusqlite::{Connection, ErrorCode};

use crate::error::ExecutorError;

/// Which columns the backend should hand back as generated keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyColumns {
    /// Every column of the inserted row (`RETURNING *`).
    #[default]
    All,
    Named(Vec<String>),
}

/// Affected-row count for each executed batch row, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub update_counts: Vec<usize>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.update_counts.iter().sum()
    }
}

/// Prepares batched statements against one borrowed connection.
///
/// The connection stays owned by the caller; the executor never closes it.
pub struct StatementExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> StatementExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Prepare `sql` with generated-key capture.
    ///
    /// A template that yields no result columns gets a `RETURNING` clause
    /// for `keys` appended; one that already returns rows is used as is.
    pub fn prepare(&self, sql: &str, keys: &KeyColumns) -> Result<PreparedBatch<'conn>, ExecutorError> {
        let stmt = self.conn.prepare(sql).map_err(classify_prepare_error)?;
        if stmt.column_count() > 0 {
            log::debug!("preparing batch statement: {}", sql);
            return Ok(PreparedBatch::new(self.conn, stmt, sql.to_owned()));
        }
        drop(stmt);

        let sql = with_returning(sql, keys);
        log::debug!("preparing batch statement: {}", sql);
        let stmt = self.conn.prepare(&sql).map_err(classify_prepare_error)?;
        Ok(PreparedBatch::new(self.conn, stmt, sql))
    }
}

fn classify_prepare_error(err: rusqlite::Error) -> ExecutorError {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::SystemIoFailure
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked,
        ) => ExecutorError::Connection(err),
        _ => ExecutorError::Statement(err),
    }
}

fn with_returning(sql: &str, keys: &KeyColumns) -> String {
    let body = sql.trim_end().trim_end_matches(';').trim_end();
    match keys {
        KeyColumns::All => format!("{body} RETURNING *"),
        KeyColumns::Named(columns) => format!("{body} RETURNING {}", columns.join(", ")),
    }
}
