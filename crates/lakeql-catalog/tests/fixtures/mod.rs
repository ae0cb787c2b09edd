//! Test fixtures for catalog integration tests
//!
//! Reusable table definitions mirroring a small analytics deployment: a
//! tenant-scoped events table in the backend and stock-price CSVs in object
//! storage.

use lakeql_catalog::{AccessDescriptor, Credentials, ScopingPredicate, TableDefinition};
use lakeql_core::{Column, LogicalType};

/// Columns of the daily stock-price CSVs
///
/// Order matters: wildcard expansion follows it.
pub fn stock_columns() -> Vec<Column> {
    vec![
        Column::new("Date", LogicalType::Date),
        Column::new("Open", LogicalType::Float),
        Column::new("High", LogicalType::Float),
        Column::new("Low", LogicalType::Float),
        Column::new("Close", LogicalType::Float),
        Column::new("Volume", LogicalType::Int),
        Column::new("OpenInt", LogicalType::Int),
    ]
}

/// Virtual table over a public stock-price CSV
pub fn stock_table(name: &str) -> TableDefinition {
    TableDefinition::virtual_table(
        name,
        stock_columns(),
        AccessDescriptor::new(
            "lake",
            "https://datasets.example.com/stocks/aapl.us.txt",
            "CSVWithNames",
        ),
    )
}

/// Virtual table over a private bucket with explicit structure
pub fn private_stock_table(name: &str) -> TableDefinition {
    TableDefinition::virtual_table(
        name,
        stock_columns(),
        AccessDescriptor::new("lake", "https://private.example.com/stocks/*.parquet", "Parquet")
            .with_structure("Date Date, Open Float64")
            .with_credentials(Credentials::new("AKIAEXAMPLE", "s3cr3t")),
    )
}

/// Tenant-scoped physical events table
pub fn events_table() -> TableDefinition {
    TableDefinition::physical(
        "events",
        vec![
            Column::new("uuid", LogicalType::String),
            Column::new("event", LogicalType::String),
            Column::new("timestamp", LogicalType::DateTime),
            Column::new("distinct_id", LogicalType::String),
            Column::new("properties", LogicalType::Json),
            Column::new("team_id", LogicalType::Int),
        ],
    )
    .with_scoping(ScopingPredicate::on("team_id"))
}

/// Physical table with no scoping predicate
pub fn numbers_table() -> TableDefinition {
    TableDefinition::physical("numbers", vec![Column::new("number", LogicalType::Int)])
        .with_backend_name("system.numbers")
}
