mod common;

use common::{count, payload, rows, test_db, SQL};
use keybatch::{
    BatchError, BindError, DecodeError, Entity, EntityDecoder, ExecutorError, ParameterBatch,
    QueryRunner, RawKeyRows, Value,
};
use rusqlite::Connection;
use std::time::{Duration, Instant};

#[test]
fn five_large_rows_come_back_in_submission_order() {
    let db = test_db();
    let blob = payload(2 * 1024 * 1024);
    let params = rows(1..=5, &blob);

    let entities: Vec<Entity> = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &params)
        .unwrap();

    assert_eq!(entities.len(), 5);
    for (i, entity) in entities.iter().enumerate() {
        assert_eq!(entity.id, i as i64 + 1);
        assert_eq!(entity.payload_len(), blob.len());
    }
    assert_eq!(entities[4].payload.as_deref(), Some(&blob[..]));
    assert_eq!(count(&db.conn), 5);
}

#[test]
fn generated_ids_follow_rows_without_explicit_ids() {
    let db = test_db();
    let blob = payload(16);
    let params: ParameterBatch = (0..4).map(|_| vec![Value::Blob(blob.clone())]).collect();

    let entities = QueryRunner::new()
        .insert_batch(
            &db.conn,
            "INSERT INTO some_table(some_blob) VALUES (?)",
            EntityDecoder,
            &params,
        )
        .unwrap();

    let ids: Vec<i64> = entities.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn empty_batch_yields_no_entities() {
    let db = test_db();
    let entities = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &ParameterBatch::new())
        .unwrap();
    assert!(entities.is_empty());
    assert_eq!(count(&db.conn), 0);
}

#[test]
fn missing_arguments_fail_without_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.sqlite");
    std::fs::write(&path, vec![0x42u8; 4096]).unwrap();
    // any query on this connection would fail with "file is not a database"
    let broken = Connection::open(&path).unwrap();
    let runner = QueryRunner::new();

    let err = runner
        .insert_batch(None::<&Connection>, SQL, EntityDecoder, &ParameterBatch::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::NullConnection));

    let err = runner
        .insert_batch(&broken, None::<&str>, EntityDecoder, &ParameterBatch::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::NullStatement));

    let err = runner
        .insert_batch(&broken, SQL, EntityDecoder, None::<&ParameterBatch>)
        .unwrap_err();
    assert!(matches!(err, BatchError::NullParameters));
    assert!(err.to_string().contains("pass an empty batch"));

    let err = runner
        .insert_batch(&broken, SQL, EntityDecoder, &ParameterBatch::new())
        .unwrap_err();
    assert!(matches!(err.executor(), Some(ExecutorError::Connection(_))));
}

#[test]
fn short_row_is_rejected_before_any_row_runs() {
    let db = test_db();
    let blob = payload(8);
    let mut params = rows(1..=2, &blob);
    params.push([Value::Integer(3)]);

    let err = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &params)
        .unwrap_err();

    assert_eq!(err.row(), Some(2));
    assert!(matches!(
        err.executor(),
        Some(ExecutorError::Bind(BindError::Arity {
            row: 2,
            expected: 2,
            actual: 1
        }))
    ));
    assert_eq!(count(&db.conn), 0);
}

#[test]
fn uniformly_wrong_arity_is_caught_against_the_statement() {
    let db = test_db();
    let params = ParameterBatch::from_rows(vec![vec![Value::Integer(1)], vec![Value::Integer(2)]]);

    let err = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &params)
        .unwrap_err();

    assert!(matches!(
        err.executor(),
        Some(ExecutorError::Bind(BindError::Arity { row: 0, .. }))
    ));
    assert!(err.to_string().contains("wrong number of parameters"));
}

#[test]
fn mid_batch_failure_rolls_back_and_leaves_connection_usable() {
    let db = test_db();
    let blob = payload(32);
    let params = rows([1, 2, 2, 4], &blob);

    let err = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &params)
        .unwrap_err();

    assert_eq!(err.row(), Some(2));
    assert!(matches!(
        err.executor(),
        Some(ExecutorError::Execution { row: Some(2), .. })
    ));
    let msg = err.to_string();
    assert!(msg.contains("UNIQUE constraint failed"));
    assert!(msg.contains(SQL));
    assert!(msg.contains("[4, <blob 32 bytes>]"));
    assert_eq!(count(&db.conn), 0);
    assert!(db.conn.is_autocommit());

    let entities = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &rows(1..=3, &blob))
        .unwrap();
    assert_eq!(entities.len(), 3);
    assert_eq!(count(&db.conn), 3);
}

#[test]
fn trigger_abort_surfaces_as_execution_error() {
    let db = test_db();
    db.conn
        .execute_batch(
            r#"
            CREATE TRIGGER reject_seven BEFORE INSERT ON some_table
            WHEN NEW.id = 7
            BEGIN
                SELECT RAISE(ABORT, 'id 7 is reserved');
            END;
            "#,
        )
        .unwrap();
    let blob = payload(4);

    let err = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &rows(5..=8, &blob))
        .unwrap_err();

    assert_eq!(err.row(), Some(2));
    assert!(err.to_string().contains("id 7 is reserved"));
    assert_eq!(count(&db.conn), 0);
}

#[test]
fn sequential_calls_do_not_interfere() {
    let db = test_db();
    let runner = QueryRunner::new();
    let small = payload(10);
    let large = payload(10_000);

    let first = runner
        .insert_batch(&db.conn, SQL, EntityDecoder, &rows(1..=3, &small))
        .unwrap();
    let second = runner
        .insert_batch(&db.conn, SQL, EntityDecoder, &rows(4..=5, &large))
        .unwrap();

    assert_eq!(first.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(first.iter().all(|e| e.payload_len() == 10));
    assert_eq!(second.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 5]);
    assert!(second.iter().all(|e| e.payload_len() == 10_000));
    assert_eq!(count(&db.conn), 5);
}

#[test]
fn locked_database_times_out_instead_of_hanging() {
    let db = test_db();
    let holder = Connection::open(db.path()).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE").unwrap();

    let victim = Connection::open(db.path()).unwrap();
    victim.busy_timeout(Duration::from_millis(50)).unwrap();

    let started = Instant::now();
    let err = QueryRunner::new()
        .insert_batch(&victim, SQL, EntityDecoder, &rows(1..=2, &payload(4)))
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    let executor = err.executor().expect("executor error");
    assert!(executor.is_timeout(), "{executor:?}");
    assert!(matches!(executor, ExecutorError::Execution { .. }));

    holder.execute_batch("ROLLBACK").unwrap();
    let entities = QueryRunner::new()
        .insert_batch(&victim, SQL, EntityDecoder, &rows(1..=2, &payload(4)))
        .unwrap();
    assert_eq!(entities.len(), 2);
}

#[test]
fn custom_decoder_shapes_the_output() {
    let db = test_db();
    let blob = payload(3);
    let id_and_row = |keys: RawKeyRows| -> Result<Vec<(usize, i64)>, DecodeError> {
        keys.into_iter()
            .map(|key| match key.get(0) {
                Some(rusqlite::types::Value::Integer(id)) => Ok((key.batch_row, *id)),
                _ => Err(DecodeError::MissingColumn {
                    row: key.batch_row,
                    column: 0,
                }),
            })
            .collect()
    };

    let pairs = QueryRunner::new()
        .insert_batch(&db.conn, SQL, id_and_row, &rows([30, 10, 20], &blob))
        .unwrap();

    assert_eq!(pairs, vec![(0, 30), (1, 10), (2, 20)]);
}

#[test]
fn decoder_failure_leaves_no_rows_and_the_call_can_be_retried() {
    let db = test_db();
    let blob = payload(8);
    let params = rows(1..=3, &blob);
    let rejecting = |_: RawKeyRows| -> Result<Vec<Entity>, DecodeError> {
        Err(DecodeError::Invalid {
            row: 1,
            reason: "rejected by caller".into(),
        })
    };

    let err = QueryRunner::new()
        .insert_batch(&db.conn, SQL, rejecting, &params)
        .unwrap_err();
    assert!(matches!(err.executor(), Some(ExecutorError::Decode(_))));
    assert_eq!(count(&db.conn), 0);
    assert!(db.conn.is_autocommit());

    let entities = QueryRunner::new()
        .insert_batch(&db.conn, SQL, EntityDecoder, &params)
        .unwrap();
    assert_eq!(entities.len(), 3);
    assert_eq!(count(&db.conn), 3);
}

#[test]
fn missing_generated_keys_roll_the_batch_back() {
    let db = test_db();
    let blob = payload(8);
    let sql = "INSERT OR IGNORE INTO some_table(id, some_blob) VALUES (?, ?)";

    let err = QueryRunner::new()
        .insert_batch(&db.conn, sql, EntityDecoder, &rows([1, 1, 2], &blob))
        .unwrap_err();
    assert!(matches!(
        err.executor(),
        Some(ExecutorError::Decode(DecodeError::KeyCount {
            expected: 3,
            actual: 2
        }))
    ));
    assert_eq!(count(&db.conn), 0);

    let entities = QueryRunner::new()
        .insert_batch(&db.conn, sql, EntityDecoder, &rows([1, 2], &blob))
        .unwrap();
    assert_eq!(entities.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn keyword_inside_a_string_literal_does_not_disable_key_capture() {
    let db = test_db();
    db.conn
        .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, note TEXT, v INTEGER)")
        .unwrap();
    let params = ParameterBatch::from_rows(vec![vec![Value::Integer(10)], vec![Value::Integer(20)]]);

    let entities = QueryRunner::new()
        .insert_batch(
            &db.conn,
            "INSERT INTO notes(note, v) VALUES ('returning customer', ?)",
            EntityDecoder,
            &params,
        )
        .unwrap();

    assert_eq!(entities.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(entities[0].payload.as_deref(), Some(&b"returning customer"[..]));
}
