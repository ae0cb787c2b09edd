//! Test fixtures for compiler integration tests

use lakeql_catalog::{AccessDescriptor, Catalog, Credentials, ScopingPredicate, TableDefinition};
use lakeql_core::{Column, LogicalType};

pub const STOCK_URL: &str = "https://datasets.example.com/stocks/aapl.us.txt";

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

fn stock_table() -> TableDefinition {
    TableDefinition::virtual_table(
        "stock",
        stock_columns(),
        AccessDescriptor::new("lake", STOCK_URL, "CSVWithNames"),
    )
}

/// Catalog with two registrations of the same CSV, a private bucket, the
/// scoped events table and a renamed system table
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.register("aapl_stock", stock_table()).unwrap();
    catalog.register("aapl_stock_2", stock_table()).unwrap();
    catalog
        .add(TableDefinition::virtual_table(
            "private_stock",
            stock_columns(),
            AccessDescriptor::new("lake", "https://private.example.com/stocks/*.parquet", "Parquet")
                .with_structure("Date Date, Open Float64")
                .with_credentials(Credentials::new("AKIAEXAMPLE", "s3cr3t")),
        ))
        .unwrap();
    catalog
        .add(
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
            .with_scoping(ScopingPredicate::on("team_id")),
        )
        .unwrap();
    catalog
        .add(
            TableDefinition::physical("numbers", vec![Column::new("number", LogicalType::Int)])
                .with_backend_name("system.numbers"),
        )
        .unwrap();
    catalog
}

/// The stock CTE with placeholders starting at `first`
pub fn stock_cte(name: &str, first: usize) -> String {
    format!(
        "{} AS (SELECT * FROM s3Cluster('lake', %(lakeql_val_{})s, %(lakeql_val_{})s))",
        name,
        first,
        first + 1
    )
}

/// `q.Date, q.Open, ...` over every stock column
pub fn qualified_stock_columns(qualifier: &str) -> String {
    stock_columns()
        .iter()
        .map(|c| format!("{}.{}", qualifier, c.name))
        .collect::<Vec<_>>()
        .join(", ")
}
