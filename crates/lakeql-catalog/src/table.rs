//! Table definitions held by the catalog

use lakeql_core::Column;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mandatory equality that isolates one tenant's rows of a physical table
///
/// Renders as `equals(<reference>.<column>, <value>)` where the value is
/// looked up under `context_key` in the per-call execution context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopingPredicate {
    /// Column compared against the context value (e.g. `team_id`)
    pub column: String,

    /// Key of the value in the execution context
    pub context_key: String,
}

impl ScopingPredicate {
    /// Create a predicate binding `column` to the context value under `context_key`
    pub fn new(column: impl Into<String>, context_key: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            context_key: context_key.into(),
        }
    }

    /// Predicate where the column and the context key share a name
    pub fn on(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            context_key: column.clone(),
            column,
        }
    }
}

/// Static credentials for an object-storage bucket
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    pub access_secret: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, access_secret: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            access_secret: access_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

/// Where and how the backend reads a virtual table's data
///
/// Every value except `provider` is an opaque literal that the printer turns
/// into a placeholder; the provider is printed inline as the first argument
/// of the storage-read call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDescriptor {
    /// Cluster/provider identifier the storage read runs on
    pub provider: String,

    /// Object URL or path template
    pub url: String,

    /// Data format (e.g. `CSVWithNames`, `Parquet`)
    pub format: String,

    /// Explicit column structure, when the format cannot carry one
    #[serde(default)]
    pub structure: Option<String>,

    /// Bucket credentials, when the bucket is not public
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl AccessDescriptor {
    /// Create a descriptor without structure or credentials
    pub fn new(provider: impl Into<String>, url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            url: url.into(),
            format: format.into(),
            structure: None,
            credentials: None,
        }
    }

    /// Set the column structure
    pub fn with_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    /// Set the bucket credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Literal values in storage-read argument order (after the provider)
    pub fn arguments(&self) -> Vec<&str> {
        let mut args = vec![self.url.as_str()];
        if let Some(creds) = &self.credentials {
            args.push(creds.access_key.as_str());
            args.push(creds.access_secret.as_str());
        }
        args.push(self.format.as_str());
        if let Some(structure) = &self.structure {
            args.push(structure.as_str());
        }
        args
    }
}

/// A table already resident in the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalTable {
    /// Name of the table in the backend, when it differs from the catalog name
    #[serde(default)]
    pub backend_name: Option<String>,

    /// Tenant isolation predicate injected into every statement using the table
    #[serde(default)]
    pub scoping: Option<ScopingPredicate>,
}

/// What backs a catalog table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableKind {
    /// Referenced by name directly in FROM/JOIN
    Physical(PhysicalTable),

    /// Materialized through a generated result-set block
    Virtual(AccessDescriptor),
}

/// A queryable table and its ordered column signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Catalog name
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<Column>,

    /// Physical or virtual backing
    pub kind: TableKind,
}

impl TableDefinition {
    /// Create a physical table without scoping
    pub fn physical(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            kind: TableKind::Physical(PhysicalTable::default()),
        }
    }

    /// Create a virtual table read through `descriptor`
    pub fn virtual_table(name: impl Into<String>, columns: Vec<Column>, descriptor: AccessDescriptor) -> Self {
        Self {
            name: name.into(),
            columns,
            kind: TableKind::Virtual(descriptor),
        }
    }

    /// Attach a scoping predicate. No-op for virtual tables.
    pub fn with_scoping(mut self, predicate: ScopingPredicate) -> Self {
        if let TableKind::Physical(physical) = &mut self.kind {
            physical.scoping = Some(predicate);
        }
        self
    }

    /// Set the backend table name. No-op for virtual tables.
    pub fn with_backend_name(mut self, backend_name: impl Into<String>) -> Self {
        if let TableKind::Physical(physical) = &mut self.kind {
            physical.backend_name = Some(backend_name.into());
        }
        self
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, TableKind::Virtual(_))
    }

    /// Scoping predicate of a physical table, if declared
    pub fn scoping(&self) -> Option<&ScopingPredicate> {
        match &self.kind {
            TableKind::Physical(physical) => physical.scoping.as_ref(),
            TableKind::Virtual(_) => None,
        }
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TableKind::Physical(_) => "physical",
            TableKind::Virtual(_) => "virtual",
        };
        write!(f, "{} ({}, {} columns)", self.name, kind, self.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeql_core::LogicalType;

    #[test]
    fn descriptor_argument_order() {
        let plain = AccessDescriptor::new("lake", "https://bucket/a.csv", "CSVWithNames");
        assert_eq!(plain.arguments(), vec!["https://bucket/a.csv", "CSVWithNames"]);

        let full = plain
            .with_structure("a Int64")
            .with_credentials(Credentials::new("key", "secret"));
        assert_eq!(
            full.arguments(),
            vec!["https://bucket/a.csv", "key", "secret", "CSVWithNames", "a Int64"]
        );
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials::new("AKIA", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn scoping_only_applies_to_physical_tables() {
        let events = TableDefinition::physical("events", vec![Column::new("team_id", LogicalType::Int)])
            .with_scoping(ScopingPredicate::on("team_id"));
        assert_eq!(events.scoping(), Some(&ScopingPredicate::new("team_id", "team_id")));

        let lake = TableDefinition::virtual_table(
            "lake",
            vec![],
            AccessDescriptor::new("lake", "u", "Parquet"),
        )
        .with_scoping(ScopingPredicate::on("team_id"));
        assert!(lake.scoping().is_none());
        assert!(lake.is_virtual());
    }

    #[test]
    fn table_kind_serialization() {
        let table = TableDefinition::physical("events", vec![Column::new("event", LogicalType::String)])
            .with_backend_name("sharded_events");
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"kind\":\"physical\""));

        let parsed: TableDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn display_summarizes_table() {
        let table = TableDefinition::physical(
            "events",
            vec![Column::new("event", LogicalType::String), Column::new("team_id", LogicalType::Int)],
        );
        assert_eq!(table.to_string(), "events (physical, 2 columns)");
    }
}
