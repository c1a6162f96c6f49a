//! End-to-end tool calls: registry, invoker and rendered outcomes.

use dbcatalog_mcp::catalog::{Catalog, CatalogSnapshot};
use dbcatalog_mcp::database::DatabaseConnection;
use dbcatalog_mcp::tools::info::EXIT_MESSAGE;
use dbcatalog_mcp::tools::{
    FailureKind, NO_RESULTS, ToolContext, ToolInvoker, ToolOutcome, builtin_tools, create_registry,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn snapshot() -> Value {
    json!({
        "database-info": { "product-name": "HSQL Database Engine", "product-version": "2.7.1" },
        "tables": [
            {
                "name": "AUTHORS",
                "columns": [
                    { "name": "ID", "data-type": "INTEGER", "nullable": false },
                    { "name": "NAME", "data-type": "VARCHAR(100)", "nullable": false }
                ],
                "primary-key": { "name": "PK_AUTHORS", "columns": ["ID"] }
            },
            {
                "name": "BOOKS",
                "columns": [
                    { "name": "ID", "data-type": "INTEGER", "nullable": false },
                    { "name": "TITLE", "data-type": "VARCHAR(255)", "nullable": false },
                    { "name": "AUTHOR_ID", "data-type": "INTEGER", "nullable": false }
                ],
                "primary-key": { "name": "PK_BOOKS", "columns": ["ID"] },
                "foreign-keys": [{
                    "name": "FK_BOOKS_AUTHORS",
                    "referenced-table": { "name": "AUTHORS" },
                    "column-references": [{ "column": "AUTHOR_ID", "referenced-column": "ID" }]
                }]
            }
        ],
        "routines": [{
            "name": "NEW_AUTHOR",
            "parameters": [{ "name": "AUTHOR_NAME", "data-type": "VARCHAR(100)" }]
        }],
        "samples": {
            "BOOKS": [{ "ID": 1, "TITLE": "Dune", "AUTHOR_ID": 1 }]
        }
    })
}

fn invoker() -> ToolInvoker {
    let (catalog, rows) = CatalogSnapshot::from_json(&snapshot().to_string())
        .unwrap()
        .into_parts();
    let connection: Arc<dyn DatabaseConnection> = Arc::new(rows.unwrap());
    let context = ToolContext::new(Arc::new(catalog)).with_connection(connection);
    ToolInvoker::new(Arc::new(create_registry()), context)
}

fn json_of(outcome: ToolOutcome) -> Value {
    match outcome {
        ToolOutcome::Json(value) => value,
        other => panic!("expected json, got {:?}", other),
    }
}

#[tokio::test]
async fn list_tables_omits_blank_schema() {
    let outcome = invoker()
        .execute("list", r#"{"database-object-type": "TABLES"}"#)
        .await;

    assert_eq!(
        json_of(outcome),
        json!({
            "database-objects": [
                { "name": "AUTHORS", "type": "TABLE" },
                { "name": "BOOKS", "type": "TABLE" }
            ]
        })
    );
}

#[tokio::test]
async fn describe_unknown_table_has_no_results() {
    let outcome = invoker()
        .execute("describe-tables", r#"{"table-name": "NOT_A_TABLE"}"#)
        .await;

    assert_eq!(outcome, ToolOutcome::NoResults);
    assert_eq!(outcome.render(), NO_RESULTS);
}

#[tokio::test]
async fn describe_tables_default_scope() {
    let value = json_of(
        invoker()
            .execute("describe-tables", r#"{"table-name": "BOOKS"}"#)
            .await,
    );

    let books = &value["tables"][0];
    assert_eq!(value["db"], "HSQL Database Engine");
    assert_eq!(books["name"], "BOOKS");
    assert_eq!(books["columns"].as_array().unwrap().len(), 3);
    assert!(books["foreign-keys"].is_array());
    assert!(books.get("indexes").is_none());
}

#[tokio::test]
async fn exit_replies_with_farewell() {
    let outcome = invoker().execute("exit", "").await;
    assert_eq!(outcome.render(), EXIT_MESSAGE);
    assert!(!outcome.into_call_result().is_error.unwrap_or(false));
}

#[tokio::test]
async fn malformed_arguments_fall_back_to_defaults() {
    let invoker = invoker();
    for definition in builtin_tools() {
        let outcome = invoker.execute(definition.name(), "invalid-json").await;
        if definition.name() == "diagram" {
            // The diagram type has no default.
            assert_eq!(
                outcome.failure().map(|f| f.kind),
                Some(FailureKind::ExecutionFailure)
            );
        } else {
            assert!(!outcome.is_error(), "{} failed: {}", definition.name(), outcome.render());
        }
    }
}

#[tokio::test]
async fn unknown_tool_is_reported_not_raised() {
    let outcome = invoker().execute("drop-table", "{}").await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::ToolNotFound);
    let envelope: Value = serde_json::from_str(&outcome.render()).unwrap();
    assert_eq!(envelope["exception"]["type"], "ToolNotFound");
    assert_eq!(envelope["exception"]["message"], "Cannot find tool 'drop-table'");
}

#[tokio::test]
async fn sampling_uses_connection() {
    let value = json_of(invoker().execute("table-sample", "{}").await);
    assert_eq!(value["samples"][0]["table"], "BOOKS");
    assert_eq!(value["samples"][0]["rows"][0]["TITLE"], "Dune");

    let without = ToolInvoker::new(
        Arc::new(create_registry()),
        ToolContext::new(Arc::new(Catalog::default())),
    );
    let outcome = without.execute("table-sample", "{}").await;
    assert_eq!(
        outcome.failure().map(|f| f.kind),
        Some(FailureKind::ExecutionFailure)
    );
}

#[tokio::test]
async fn specifications_are_deterministic() {
    let first: Vec<String> = builtin_tools()
        .iter()
        .map(|d| serde_json::to_string(d.specification()).unwrap())
        .collect();
    let second: Vec<String> = builtin_tools()
        .iter()
        .map(|d| serde_json::to_string(d.specification()).unwrap())
        .collect();
    assert_eq!(first, second);

    let registry = create_registry();
    let diagram = registry.lookup("diagram").unwrap();
    assert_eq!(
        diagram.specification().parameters["required"],
        json!(["diagram-type"])
    );
}

#[tokio::test]
async fn concurrent_calls_do_not_share_projections() {
    let invoker = invoker();
    let mut handles = Vec::new();
    for i in 0..16 {
        let invoker = invoker.clone();
        handles.push(tokio::spawn(async move {
            let table = if i % 2 == 0 { "AUTHORS" } else { "BOOKS" };
            let args = json!({ "database-object-type": "TABLES", "database-object-name": table });
            let value = json_of(invoker.execute_value("list", &args).await);
            (table, value)
        }));
    }

    for handle in handles {
        let (table, value) = handle.await.unwrap();
        let objects = value["database-objects"].as_array().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["name"], table);
    }

    // The shared scope is untouched afterwards.
    assert_eq!(invoker.context().catalog().table_count(), 2);
}
