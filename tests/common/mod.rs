#![allow(dead_code)]

use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;

use keybatch::{ParameterBatch, Value};

pub const SQL: &str = "INSERT INTO some_table(id, some_blob) VALUES (?, ?)";

pub struct TestDb {
    pub dir: TempDir,
    pub conn: Connection,
}

impl TestDb {
    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("keybatch_test.sqlite")
    }
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir for db");
    let conn = Connection::open(dir.path().join("keybatch_test.sqlite")).expect("open db");
    conn.execute_batch(
        "CREATE TABLE some_table (id INTEGER PRIMARY KEY, some_blob BLOB NOT NULL)",
    )
    .expect("create table");
    TestDb { dir, conn }
}

pub fn payload(len: usize) -> Arc<[u8]> {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()
}

pub fn rows(ids: impl IntoIterator<Item = i64>, payload: &Arc<[u8]>) -> ParameterBatch {
    ids.into_iter()
        .map(|id| vec![Value::Integer(id), Value::Blob(payload.clone())])
        .collect()
}

pub fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM some_table", [], |row| row.get(0))
        .expect("count rows")
}
