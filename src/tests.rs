//! Unit tests for the stepping driver.

use crate::{Connection, DbError, Value, MAX_SAFE_INTEGER};

fn fixture() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.exec("CREATE TABLE t(a INTEGER, b TEXT)").expect("create table");
    conn.exec("INSERT INTO t VALUES (1,'x'),(2,'y')").expect("insert");
    conn
}

#[test]
fn test_step_and_get_by_index_and_name() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a, b FROM t ORDER BY a").expect("prepare");

    assert!(stmt.step().expect("step 1"));
    assert_eq!(stmt.get(0).expect("get a"), Value::Integer(1));
    assert_eq!(stmt.get("b").expect("get b"), Value::Text("x".into()));

    assert!(stmt.step().expect("step 2"));
    assert_eq!(stmt.get(1).expect("get b"), Value::Text("y".into()));

    assert!(!stmt.step().expect("step 3"));
}

#[test]
fn test_safe_integer_boundary() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let cases = [
        (MAX_SAFE_INTEGER, Value::Integer(MAX_SAFE_INTEGER)),
        (-MAX_SAFE_INTEGER, Value::Integer(-MAX_SAFE_INTEGER)),
        (MAX_SAFE_INTEGER + 1, Value::BigInt(MAX_SAFE_INTEGER + 1)),
        (-MAX_SAFE_INTEGER - 1, Value::BigInt(-MAX_SAFE_INTEGER - 1)),
        (i64::MAX, Value::BigInt(i64::MAX)),
        (i64::MIN, Value::BigInt(i64::MIN)),
        (0, Value::Integer(0)),
    ];
    for (literal, expected) in cases {
        let mut stmt = conn.prepare(&format!("SELECT {literal}")).expect("prepare");
        assert!(stmt.step().expect("step"));
        assert_eq!(stmt.get(0).expect("get"), expected, "literal {literal}");
    }
}

#[test]
fn test_big_integer_not_rounded() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT 9223372036854775807").expect("prepare");
    assert!(stmt.step().expect("step"));
    let value = stmt.get(0).expect("get");
    assert_eq!(value, Value::BigInt(9_223_372_036_854_775_807));
    assert_eq!(value.as_i64(), Some(i64::MAX));
}

#[test]
fn test_exhaustion_is_sticky_until_reset() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a FROM t ORDER BY a").expect("prepare");

    while stmt.step().expect("step") {}
    // Repeated steps keep reporting exhaustion; the query does not re-run.
    assert!(!stmt.step().expect("step after done"));
    assert!(!stmt.step().expect("step after done again"));

    stmt.reset();
    assert!(stmt.step().expect("step after reset"));
    assert_eq!(stmt.get(0).expect("get"), Value::Integer(1));
}

#[test]
fn test_next_implicit_reset_replays_rows() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a, b FROM t ORDER BY a").expect("prepare");

    let mut first = Vec::new();
    loop {
        let item = stmt.next().expect("next");
        if item.done {
            assert!(item.value.is_none());
            break;
        }
        first.push(item.value.expect("row"));
    }
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].get("a"), Some(&Value::Integer(1)));
    assert_eq!(first[0].get("b"), Some(&Value::Text("x".into())));

    // The terminal next() reset the statement; a second traversal must
    // reproduce the same rows in the same order.
    let mut second = Vec::new();
    loop {
        let item = stmt.next().expect("next");
        if item.done {
            break;
        }
        second.push(item.value.expect("row"));
    }
    assert_eq!(first, second);
}

#[test]
fn test_for_loop_iteration() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a, b FROM t ORDER BY a").expect("prepare");

    let mut seen = Vec::new();
    for row in stmt.iterate() {
        let row = row.expect("row");
        let a = row.get("a").expect("a").as_i64().expect("int");
        let b = row.get("b").expect("b").as_str().expect("text").to_owned();
        seen.push((a, b));
    }
    assert_eq!(seen, vec![(1, "x".to_owned()), (2, "y".to_owned())]);

    // Restartable: the loop left the statement reset.
    let count = (&mut stmt).count();
    assert_eq!(count, 2);
}

#[test]
fn test_column_selector_errors() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a, b FROM t ORDER BY a").expect("prepare");
    assert!(stmt.step().expect("step"));

    assert_eq!(
        stmt.get("missing_column"),
        Err(DbError::ColumnNotFound("missing_column".into()))
    );
    assert_eq!(stmt.get(-1), Err(DbError::IndexOutOfRange(-1)));
    assert_eq!(stmt.get(2), Err(DbError::IndexOutOfRange(2)));
    assert_eq!(stmt.get(2_i64), Err(DbError::IndexOutOfRange(2)));
}

#[test]
fn test_column_names_are_case_sensitive() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT 1 AS Abc").expect("prepare");
    assert!(stmt.step().expect("step"));
    assert_eq!(stmt.get("Abc").expect("get"), Value::Integer(1));
    assert_eq!(stmt.get("abc"), Err(DbError::ColumnNotFound("abc".into())));
}

#[test]
fn test_get_without_buffered_row() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a FROM t").expect("prepare");

    // Before the first step there is no buffered row.
    assert_eq!(stmt.get(0), Err(DbError::NoRow));

    while stmt.step().expect("step") {}
    // After exhaustion the buffer is gone again.
    assert_eq!(stmt.get(0), Err(DbError::NoRow));
}

#[test]
fn test_finalized_statement_behavior() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a FROM t").expect("prepare");
    assert!(stmt.step().expect("step"));

    stmt.finalize();
    stmt.finalize(); // idempotent

    assert_eq!(stmt.step(), Err(DbError::StatementFinalized));
    assert_eq!(stmt.get(0), Err(DbError::StatementFinalized));
    stmt.reset(); // no-op, no panic
    assert_eq!(stmt.column_count(), 0);

    // next() past finalization is a designed sentinel, not an error.
    let item = stmt.next().expect("next");
    assert!(item.done);
    assert!(item.value.is_none());
}

#[test]
fn test_early_finalize_terminates_iteration() {
    let conn = fixture();
    let mut stmt = conn.prepare("SELECT a FROM t ORDER BY a").expect("prepare");

    let first = stmt.next().expect("next");
    assert!(!first.done);
    stmt.finalize();

    let mut remaining = 0;
    for row in &mut stmt {
        row.expect("row");
        remaining += 1;
    }
    assert_eq!(remaining, 0);
}

#[test]
fn test_close_is_idempotent_and_invalidates() {
    let mut conn = fixture();
    conn.close();
    conn.close(); // no-op

    assert!(!conn.is_open());
    assert_eq!(conn.exec("SELECT 1"), Err(DbError::ConnectionClosed));
    assert!(matches!(
        conn.prepare("SELECT 1"),
        Err(DbError::ConnectionClosed)
    ));
}

#[test]
fn test_statement_outlives_connection_close() {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT 1").expect("prepare");
    conn.close();

    // Finalizing (or dropping) the statement after the connection closed is
    // legal; the engine defers the real close until the last finalize.
    stmt.finalize();
    let item = stmt.next().expect("next");
    assert!(item.done);
}

#[test]
fn test_null_is_distinguishable() {
    let conn = Connection::open_in_memory().expect("open in-memory db");

    let mut stmt = conn.prepare("SELECT NULL, '', 0").expect("prepare");
    assert!(stmt.step().expect("step"));
    let null = stmt.get(0).expect("get null");
    let empty = stmt.get(1).expect("get empty text");
    let zero = stmt.get(2).expect("get zero");

    assert!(null.is_null());
    assert_eq!(empty, Value::Text(String::new()));
    assert_eq!(zero, Value::Integer(0));
    assert_ne!(null, empty);
    assert_ne!(null, zero);
}

#[test]
fn test_float_passthrough() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT 1.5, -0.25").expect("prepare");
    assert!(stmt.step().expect("step"));
    assert_eq!(stmt.get(0).expect("get"), Value::Float(1.5));
    assert_eq!(stmt.get(1).expect("get").as_f64(), Some(-0.25));
}

#[test]
fn test_blob_copy_and_empty_blob() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT x'DEADBEEF', x''").expect("prepare");
    assert!(stmt.step().expect("step"));
    assert_eq!(
        stmt.get(0).expect("get"),
        Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF])
    );
    assert_eq!(stmt.get(1).expect("get"), Value::Blob(Vec::new()));
}

#[test]
fn test_utf16_text_round_trip() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.exec("CREATE TABLE s(txt TEXT)").expect("create table");

    let samples = ["Hello World", "日本語", "Émojis: 🎉🌟✨", "Русский текст"];
    for sample in samples {
        conn.exec(&format!("INSERT INTO s VALUES ('{sample}')"))
            .expect("insert");
    }

    let mut stmt = conn.prepare("SELECT txt FROM s ORDER BY rowid").expect("prepare");
    for sample in samples {
        assert!(stmt.step().expect("step"));
        assert_eq!(stmt.get(0).expect("get"), Value::Text(sample.to_owned()));
    }
    assert!(!stmt.step().expect("step"));
}

#[test]
fn test_database_encoding_is_utf16() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("PRAGMA encoding").expect("prepare");
    assert!(stmt.step().expect("step"));
    let encoding = stmt.get(0).expect("get");
    let encoding = encoding.as_str().expect("text");
    assert!(encoding.starts_with("UTF-16"), "got encoding {encoding}");
}

#[test]
fn test_duplicate_column_names_keep_last_value() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let mut stmt = conn.prepare("SELECT 1 AS a, 2 AS a, 3 AS b").expect("prepare");

    let item = stmt.next().expect("next");
    let row = item.value.expect("row");
    assert_eq!(row.len(), 2);
    assert_eq!(row.get("a"), Some(&Value::Integer(2)));
    assert_eq!(row.get("b"), Some(&Value::Integer(3)));

    // Ordered-insertion overwrite: "a" keeps its original position.
    let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_exec_partial_failure_keeps_committed_work() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.exec("CREATE TABLE t(id INTEGER)").expect("create table");

    let err = conn
        .exec("INSERT INTO t VALUES (1); INSERT INTO missing VALUES (2);")
        .expect_err("second statement must fail");
    assert!(matches!(err, DbError::Engine(_)));

    // The first insert committed before the failure and stays committed.
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM t").expect("prepare");
    assert!(stmt.step().expect("step"));
    assert_eq!(stmt.get(0).expect("get"), Value::Integer(1));
}

#[test]
fn test_prepare_syntax_error_carries_engine_message() {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let err = conn.prepare("SELEKT nonsense").expect_err("must fail");
    match err {
        DbError::Prepare(msg) => assert!(!msg.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_open_failure_carries_engine_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("db.sqlite");
    let err = Connection::open(&path).expect_err("open must fail");
    match err {
        DbError::Open(msg) => assert!(!msg.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_file_backed_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("round-trip.sqlite");

    {
        let conn = Connection::open(&path).expect("open");
        conn.exec("CREATE TABLE t(v TEXT)").expect("create table");
        conn.exec("INSERT INTO t VALUES ('persisted')").expect("insert");
    }

    let conn = Connection::open(&path).expect("reopen");
    let mut stmt = conn.prepare("SELECT v FROM t").expect("prepare");
    assert!(stmt.step().expect("step"));
    assert_eq!(stmt.get(0).expect("get"), Value::Text("persisted".into()));
}
