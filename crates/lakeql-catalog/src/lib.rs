//! Table catalog for query compilation
//!
//! This crate holds the registry of queryable tables:
//! - `Physical` tables already resident in the backend, optionally carrying a
//!   tenant scoping predicate
//! - `Virtual` tables backed by object storage, carrying the access
//!   descriptor the printer turns into a storage-read call
//!
//! ## Example
//!
//! ```rust,ignore
//! use lakeql_catalog::{AccessDescriptor, Catalog, TableDefinition};
//! use lakeql_core::{Column, LogicalType};
//!
//! let mut catalog = Catalog::new();
//! catalog.add(TableDefinition::virtual_table(
//!     "aapl_stock",
//!     vec![Column::new("Date", LogicalType::Date)],
//!     AccessDescriptor::new("lake", "https://bucket/aapl.csv", "CSVWithNames"),
//! ))?;
//! ```

pub mod catalog;
pub mod table;

pub use catalog::{Catalog, CatalogError};
pub use table::{AccessDescriptor, Credentials, PhysicalTable, ScopingPredicate, TableDefinition, TableKind};
