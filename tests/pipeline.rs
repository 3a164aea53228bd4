use columnardb::{Database, EvictionPolicy, PipelineStatus, TransactionContext, Value};

#[test]
fn select_after_insert_returns_the_inserted_rows() {
    let db = Database::new();
    db.query("CREATE TABLE users (id INT, name TEXT)").unwrap();
    db.query("INSERT INTO users VALUES (1, 'alice'), (2, 'bob')").unwrap();

    let result = db.query("SELECT * FROM users WHERE id = 1").unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0].values()[1], Value::String("alice".to_string()));
}

#[test]
fn repeating_a_query_shape_with_different_literals_is_a_cache_hit() {
    let db = Database::new();
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("INSERT INTO t VALUES (1), (2), (3)").unwrap();

    let (_, first) = db.execute("SELECT * FROM t WHERE a = 1").unwrap();
    let (_, second) = db.execute("SELECT * FROM t WHERE a = 2").unwrap();
    assert_eq!(first.row_count(), 1);
    assert_eq!(second.row_count(), 1);
}

#[test]
fn dropping_a_table_makes_it_unavailable_to_later_statements() {
    let db = Database::new();
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("DROP TABLE t").unwrap();
    assert!(!db.storage().has_table("t"));
    assert!(db.query("SELECT * FROM t").is_err());
}

#[test]
fn recreating_a_dropped_table_does_not_resurrect_a_stale_cached_plan() {
    let db = Database::new();
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("INSERT INTO t VALUES (1)").unwrap();
    db.query("SELECT * FROM t WHERE a = 1").unwrap();

    db.query("DROP TABLE t").unwrap();
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("INSERT INTO t VALUES (2)").unwrap();

    let result = db.query("SELECT * FROM t WHERE a = 1").unwrap();
    assert_eq!(result.row_count(), 0);
}

#[test]
fn a_script_with_a_failing_statement_aborts_subsequent_statements() {
    let db = Database::new();
    db.query("CREATE TABLE t (a INT)").unwrap();
    let ctx = TransactionContext::new(false);
    let outcome = db
        .execute_script(
            "SELECT * FROM t WHERE 1 / 0 = 1; INSERT INTO t VALUES (1);",
            Some(ctx),
        )
        .unwrap();
    assert!(outcome.aborted);
    assert_eq!(outcome.statements.len(), 1);
    assert_eq!(outcome.statements[0].status, PipelineStatus::RolledBack);
    assert!(db.storage().get_table_rows("t").unwrap().is_empty());
}

#[test]
fn auto_commit_mode_commits_each_statement_independently() {
    let db = Database::new();
    let outcome = db
        .execute_script("CREATE TABLE t (a INT); INSERT INTO t VALUES (1); SELECT * FROM t;", None)
        .unwrap();
    assert!(!outcome.aborted);
    assert_eq!(outcome.statements.len(), 3);
    assert_eq!(outcome.statements[2].result.row_count(), 1);
}

#[test]
fn gdfs_eviction_policy_can_be_selected_explicitly() {
    let db = Database::new().with_eviction_policy(EvictionPolicy::Gdfs);
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("INSERT INTO t VALUES (1)").unwrap();
    let result = db.query("SELECT * FROM t").unwrap();
    assert_eq!(result.row_count(), 1);
}

#[test]
fn prepared_plan_round_trips_through_storage() {
    let db = Database::new();
    db.query("CREATE TABLE t (a INT)").unwrap();
    db.query("INSERT INTO t VALUES (1), (2), (3)").unwrap();
    db.query("PREPARE p1 AS SELECT * FROM t WHERE a = 1").unwrap();
    assert!(db.storage().has_prepared_plan("p1"));
}
