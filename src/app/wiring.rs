use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;

use crate::batch::{ParameterBatch, SqlType, Value};
use crate::configuration::Configuration;
use crate::db::{SqliteDb, INSERT_SQL};
use crate::keys::{Entity, EntityDecoder};
use crate::QueryRunner;

pub fn init_db(cfg: &Configuration) -> Result<Connection> {
    let db = SqliteDb::new(&cfg.db_path).with_busy_timeout(cfg.busy_timeout);
    if cfg.reset {
        db.reset_all().context("resetting database")?;
    }
    db.open().context("opening database")
}

/// `rows` rows of `(i + 1, payload)`, all sharing the same payload buffer.
pub fn build_batch(rows: usize, payload: &Arc<[u8]>) -> ParameterBatch {
    (1..=rows as i64)
        .map(|id| vec![Value::Integer(id), Value::Blob(payload.clone())])
        .collect::<ParameterBatch>()
        .with_types(vec![SqlType::Integer, SqlType::Blob])
}

pub fn insert_with_runner(conn: &Connection, batch: &ParameterBatch) -> Result<Vec<Entity>> {
    let entities = QueryRunner::new().insert_batch(conn, INSERT_SQL, EntityDecoder, batch)?;
    Ok(entities)
}

/// The same insert without the runner: one statement, one query per row.
pub fn insert_direct(conn: &Connection, batch: &ParameterBatch) -> Result<Vec<Entity>> {
    let tx = conn.unchecked_transaction()?;
    let entities = {
        let mut stmt = tx.prepare(&format!("{INSERT_SQL} RETURNING id, some_blob"))?;
        batch
            .rows()
            .iter()
            .map(|row| {
                stmt.query_row(rusqlite::params_from_iter(row.iter()), |r| {
                    Ok(Entity {
                        id: r.get(0)?,
                        payload: r.get(1)?,
                    })
                })
            })
            .collect::<rusqlite::Result<Vec<_>>>()?
    };
    tx.commit()?;
    Ok(entities)
}
