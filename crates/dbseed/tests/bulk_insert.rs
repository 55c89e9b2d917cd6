//! End-to-end behavior of the bulk insert operation against a recording
//! connection.

use dbseed::drivers::{DryRunConnection, MssqlDialect, MysqlDialect, PostgresDialect, Recorded};
use dbseed::{
    BulkInsert, DatabaseOperation, DataTable, Direction, MemoryDataSet, MemoryTable, SeedError,
    SqlValue, TableMetadata,
};

// =============================================================================
// Fixtures
// =============================================================================

fn users(rows: i64) -> MemoryTable {
    let mut table = MemoryTable::new("users", ["id", "name", "email"]);
    for i in 1..=rows {
        table
            .add_row(vec![
                SqlValue::I64(i),
                SqlValue::Text(format!("user{}", i)),
                SqlValue::Text(format!("user{}@example.com", i)),
            ])
            .unwrap();
    }
    table
}

fn accounts() -> MemoryTable {
    let mut table = MemoryTable::new("accounts", ["id", "owner"]);
    for i in 1..=5 {
        table
            .add_row(vec![SqlValue::I64(i), SqlValue::Text(format!("owner{}", i))])
            .unwrap();
    }
    table
}

fn dataset(tables: Vec<MemoryTable>) -> MemoryDataSet {
    let mut ds = MemoryDataSet::new();
    for table in tables {
        ds.add_table(table).unwrap();
    }
    ds
}

fn group_count(sql: &str) -> usize {
    sql.split(" VALUES ").nth(1).unwrap_or("").matches('(').count()
}

// =============================================================================
// Chunking
// =============================================================================

#[tokio::test]
async fn test_users_split_into_three_statements() {
    let ds = dataset(vec![users(250)]);
    let mut conn = DryRunConnection::new(PostgresDialect).with_dataset(&ds);

    let report = BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    let statements: Vec<_> = conn.statements().collect();
    assert_eq!(statements.len(), 3);
    let groups: Vec<usize> = statements.iter().map(|(sql, _)| group_count(sql)).collect();
    assert_eq!(groups, [100, 100, 50]);
    let arg_counts: Vec<usize> = statements.iter().map(|(_, args)| args.len()).collect();
    assert_eq!(arg_counts, [300, 300, 150]);

    // no primary key on the destination: no guard calls
    assert!(!conn
        .recorded()
        .iter()
        .any(|r| matches!(r, Recorded::DisablePrimaryKeys(_) | Recorded::EnablePrimaryKeys(_))));

    assert_eq!(report.total_rows(), 250);
    assert_eq!(report.tables[0].statements, 3);
}

#[tokio::test]
async fn test_arguments_are_rows_in_order() {
    let ds = dataset(vec![users(250)]);
    let mut conn = DryRunConnection::new(PostgresDialect).with_dataset(&ds);
    BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    let (_, last_args) = conn.statements().last().unwrap();
    assert_eq!(last_args[0], SqlValue::I64(201));
    assert_eq!(last_args[1], SqlValue::from("user201"));
    assert_eq!(last_args[147], SqlValue::I64(250));
    assert_eq!(last_args[149], SqlValue::from("user250@example.com"));
}

#[tokio::test]
async fn test_statement_text_is_identical_across_full_chunks() {
    let ds = dataset(vec![users(250)]);
    let mut conn = DryRunConnection::new(MssqlDialect).with_dataset(&ds);
    BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    let sql: Vec<&str> = conn.statements().map(|(sql, _)| sql).collect();
    assert_eq!(sql[0], sql[1]);
    assert_ne!(sql[1], sql[2]);
    assert!(sql[2].starts_with("INSERT INTO [users] ([id], [name], [email]) VALUES (@P1, @P2, @P3), (@P4"));
    assert!(sql[2].ends_with("(@P148, @P149, @P150)"));
}

#[tokio::test]
async fn test_custom_chunk_size() {
    let ds = dataset(vec![users(10)]);
    let mut conn = DryRunConnection::new(MysqlDialect).with_dataset(&ds);
    BulkInsert::new()
        .with_chunk_size(4)
        .execute(&mut conn, &ds)
        .await
        .unwrap();

    let groups: Vec<usize> = conn.statements().map(|(sql, _)| group_count(sql)).collect();
    assert_eq!(groups, [4, 4, 2]);
    let (sql, _) = conn.statements().next().unwrap();
    assert!(sql.starts_with("INSERT INTO `users` (`id`, `name`, `email`) VALUES (?, ?, ?)"));
}

// =============================================================================
// Primary keys
// =============================================================================

#[tokio::test]
async fn test_accounts_with_primary_key() {
    let ds = dataset(vec![accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect)
        .with_table(TableMetadata::new("accounts", ["id", "owner"]).with_primary_keys(["id"]));

    BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    let calls = conn.recorded();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], Recorded::Metadata("accounts".into()));
    assert_eq!(calls[1], Recorded::DisablePrimaryKeys("accounts".into()));
    match &calls[2] {
        Recorded::Execute { sql, params } => {
            assert_eq!(group_count(sql), 5);
            assert!(sql.ends_with("($9, $10)"));
            assert_eq!(params.len(), 10);
        }
        other => panic!("expected a statement, got {:?}", other),
    }
    assert_eq!(calls[3], Recorded::EnablePrimaryKeys("accounts".into()));
}

#[tokio::test]
async fn test_primary_keys_restored_after_failed_chunk() {
    let ds = dataset(vec![accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect)
        .with_table(TableMetadata::new("accounts", ["id", "owner"]).with_primary_keys(["id"]))
        .fail_on_statement(1, "duplicate key value violates unique constraint");

    let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
    assert!(matches!(err, SeedError::Execution { .. }));

    let kinds: Vec<&str> = conn.recorded().iter().map(Recorded::kind).collect();
    assert_eq!(kinds, ["metadata", "disable_pk", "execute", "enable_pk"]);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failure_on_second_chunk_reports_that_chunk() {
    let ds = dataset(vec![users(250), accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect)
        .with_dataset(&ds)
        .fail_on_statement(2, "value too long for type character varying(8)");

    let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();

    let (failed_sql, failed_args) = {
        let (sql, args) = conn.statements().nth(1).unwrap();
        (sql.to_string(), args.to_vec())
    };
    match &err {
        SeedError::Execution {
            operation,
            table,
            query,
            args,
            message,
        } => {
            assert_eq!(operation, "BULK_INSERT");
            assert_eq!(table, "users");
            assert_eq!(query, &failed_sql);
            assert_eq!(args, &failed_args);
            assert_eq!(args[0], SqlValue::I64(101));
            assert!(message.contains("character varying(8)"));
        }
        other => panic!("expected an execution error, got {:?}", other),
    }

    // third chunk and the accounts table are never attempted
    assert_eq!(conn.statements().count(), 2);
    assert!(!conn
        .recorded()
        .contains(&Recorded::Metadata("accounts".into())));

    let msg = err.to_string();
    assert!(msg.starts_with("BULK_INSERT operation failed on query: INSERT INTO \"users\""));
    assert!(msg.contains("using args: [101, 'user101', 'user101@example.com', 102"));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_zero_column_destination_is_fatal() {
    let ds = dataset(vec![users(3)]);
    // destination has no registered columns
    let mut conn = DryRunConnection::new(PostgresDialect);

    let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
    match &err {
        SeedError::NoColumns { operation, table } => {
            assert_eq!(operation, "BULK_INSERT");
            assert_eq!(table, "users");
        }
        other => panic!("expected NoColumns, got {:?}", other),
    }
    assert_eq!(conn.statements().count(), 0);
    assert!(!err.to_string().contains("INSERT INTO"));
}

#[tokio::test]
async fn test_missing_dataset_column_wrapped_as_execution_error() {
    let ds = dataset(vec![users(3)]);
    let mut conn = DryRunConnection::new(PostgresDialect).with_table(TableMetadata::new(
        "users",
        ["id", "name", "email", "created_at"],
    ));

    let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
    match &err {
        SeedError::Execution {
            query,
            args,
            message,
            ..
        } => {
            assert!(query.contains("\"created_at\""));
            assert!(args.is_empty());
            assert!(message.contains("created_at"));
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
    assert_eq!(conn.statements().count(), 0);
}

// =============================================================================
// Ordering and skipping
// =============================================================================

#[tokio::test]
async fn test_empty_table_is_skipped_silently() {
    let ds = dataset(vec![MemoryTable::new("audit_log", ["id"]), accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect).with_dataset(&ds);

    let report = BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    assert!(!conn
        .recorded()
        .contains(&Recorded::Metadata("audit_log".into())));
    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.tables[0].table, "audit_log");
    assert_eq!(report.tables[0].rows, 0);
    assert_eq!(report.tables[0].statements, 0);
}

#[tokio::test]
async fn test_reverse_direction() {
    let ds = dataset(vec![users(2), accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect).with_dataset(&ds);

    let report = BulkInsert::new()
        .with_direction(Direction::Reverse)
        .execute(&mut conn, &ds)
        .await
        .unwrap();

    let order: Vec<&str> = report.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(order, ["accounts", "users"]);
    let (first_sql, _) = conn.statements().next().unwrap();
    assert!(first_sql.starts_with("INSERT INTO \"accounts\""));
}

#[tokio::test]
async fn test_destination_column_order_wins() {
    let ds = dataset(vec![accounts()]);
    let mut conn = DryRunConnection::new(PostgresDialect)
        .with_table(TableMetadata::new("accounts", ["owner", "id"]));

    BulkInsert::new().execute(&mut conn, &ds).await.unwrap();

    let (sql, args) = conn.statements().next().unwrap();
    assert!(sql.starts_with("INSERT INTO \"accounts\" (\"owner\", \"id\")"));
    assert_eq!(args[0], SqlValue::from("owner1"));
    assert_eq!(args[1], SqlValue::I64(1));
}

#[tokio::test]
async fn test_schema_qualified_table() {
    let table = MemoryTable::new("sales.orders", ["id"])
        .with_row([SqlValue::I64(1)])
        .unwrap();
    assert_eq!(table.name(), "sales.orders");
    let ds = dataset(vec![table]);
    let mut conn = DryRunConnection::new(MssqlDialect).with_dataset(&ds);

    BulkInsert::new().execute(&mut conn, &ds).await.unwrap();
    let (sql, _) = conn.statements().next().unwrap();
    assert_eq!(sql, "INSERT INTO [sales].[orders] ([id]) VALUES (@P1)");
}
