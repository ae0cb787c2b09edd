//! Integration tests for the table catalog

mod fixtures;

use lakeql_catalog::{Catalog, CatalogError, TableKind};

fn populated_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add(fixtures::events_table()).unwrap();
    catalog.add(fixtures::stock_table("aapl_stock")).unwrap();
    catalog.add(fixtures::stock_table("aapl_stock_2")).unwrap();
    catalog.add(fixtures::numbers_table()).unwrap();
    catalog
}

#[test]
fn test_mixed_catalog_lookup() {
    let catalog = populated_catalog();

    assert_eq!(catalog.len(), 4);
    assert_eq!(
        catalog.table_names(),
        vec!["events", "aapl_stock", "aapl_stock_2", "numbers"]
    );

    let events = catalog.lookup("events").unwrap();
    assert!(!events.is_virtual());
    assert_eq!(events.scoping().unwrap().column, "team_id");

    let stock = catalog.lookup("aapl_stock_2").unwrap();
    assert!(stock.is_virtual());
    assert_eq!(stock.name, "aapl_stock_2");
}

#[test]
fn test_wildcard_order_is_declaration_order() {
    let catalog = populated_catalog();
    let stock = catalog.lookup("aapl_stock").unwrap();

    assert_eq!(
        stock.column_names(),
        vec!["Date", "Open", "High", "Low", "Close", "Volume", "OpenInt"]
    );
}

#[test]
fn test_duplicate_is_rejected_and_first_kept() {
    let mut catalog = populated_catalog();

    let result = catalog.register("events", fixtures::stock_table("whatever"));
    assert_eq!(result, Err(CatalogError::DuplicateTable("events".to_string())));

    // The first registration survives untouched
    let events = catalog.lookup("events").unwrap();
    assert!(matches!(events.kind, TableKind::Physical(_)));
    assert_eq!(catalog.len(), 4);
}

#[test]
fn test_unknown_table_error_message() {
    let catalog = populated_catalog();
    let err = catalog.lookup("persons").unwrap_err();

    assert_eq!(err.to_string(), "Unknown table: persons");
}

#[test]
fn test_backend_name_is_kept() {
    let catalog = populated_catalog();
    let numbers = catalog.lookup("numbers").unwrap();

    match &numbers.kind {
        TableKind::Physical(physical) => {
            assert_eq!(physical.backend_name.as_deref(), Some("system.numbers"));
            assert!(physical.scoping.is_none());
        }
        TableKind::Virtual(_) => panic!("numbers should be physical"),
    }
}

#[test]
fn test_private_descriptor_arguments() {
    let table = fixtures::private_stock_table("private_stock");

    match &table.kind {
        TableKind::Virtual(descriptor) => {
            assert_eq!(descriptor.provider, "lake");
            assert_eq!(descriptor.arguments().len(), 5);
            assert_eq!(descriptor.arguments()[1], "AKIAEXAMPLE");
        }
        TableKind::Physical(_) => panic!("private_stock should be virtual"),
    }
}

#[test]
fn test_catalog_is_shareable_across_threads() {
    let catalog = std::sync::Arc::new(populated_catalog());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = std::sync::Arc::clone(&catalog);
            std::thread::spawn(move || catalog.lookup("aapl_stock").map(|t| t.columns.len()))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(7));
    }
}

#[test]
fn test_definition_json_roundtrip() {
    let table = fixtures::private_stock_table("private_stock");
    let json = serde_json::to_string(&table).unwrap();
    assert!(json.contains("\"kind\":\"virtual\""));

    let parsed: lakeql_catalog::TableDefinition = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, table);
}
