//! In-memory registry of queryable tables
//!
//! The catalog is populated once during setup and then shared read-only by
//! every compilation. Registration takes `&mut self`, so the borrow checker
//! keeps it from overlapping with compilations holding `&Catalog`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lakeql_catalog::{Catalog, TableDefinition, ScopingPredicate};
//! use lakeql_core::{Column, LogicalType};
//!
//! let mut catalog = Catalog::new();
//! catalog.add(
//!     TableDefinition::physical("events", vec![Column::new("team_id", LogicalType::Int)])
//!         .with_scoping(ScopingPredicate::on("team_id")),
//! )?;
//!
//! let events = catalog.lookup("events")?;
//! ```

use crate::table::TableDefinition;
use std::collections::HashMap;

/// Errors raised while registering or looking up tables
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Table already registered: {0}")]
    DuplicateTable(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

/// Mapping from table name to definition
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Definitions by registered name
    tables: HashMap<String, TableDefinition>,

    /// Registration order
    order: Vec<String>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` under `name`
    ///
    /// The stored definition takes the registered name, so the same column
    /// signature can be registered several times under different names.
    pub fn register(&mut self, name: impl Into<String>, mut definition: TableDefinition) -> Result<(), CatalogError> {
        let name = name.into();

        if self.tables.contains_key(&name) {
            return Err(CatalogError::DuplicateTable(name));
        }

        definition.name = name.clone();
        tracing::debug!(table = %definition, "registered table");

        self.order.push(name.clone());
        self.tables.insert(name, definition);

        Ok(())
    }

    /// Register `definition` under its own name
    pub fn add(&mut self, definition: TableDefinition) -> Result<(), CatalogError> {
        let name = definition.name.clone();
        self.register(name, definition)
    }

    /// Look up a table by name
    pub fn lookup(&self, name: &str) -> Result<&TableDefinition, CatalogError> {
        self.tables
            .get(name)
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    /// Check whether a table is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in registration order
    pub fn table_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
