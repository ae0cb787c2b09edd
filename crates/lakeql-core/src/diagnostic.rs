//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Catalog (1xxx)
    /// A table name is not registered in the catalog
    UnknownTable,

    /// A table name was registered twice
    DuplicateTable,

    // Resolution (2xxx)
    /// A column is not part of any table in scope
    UnknownColumn,

    /// An unqualified column is owned by more than one table in scope
    AmbiguousColumn,

    /// Two table references in one scope share an effective name
    AmbiguousTable,

    /// The execution context lacks a value a scoping predicate needs
    MissingContextValue,

    // Printing and parsing (3xxx)
    /// Construct has no rendering in the requested dialect
    UnsupportedConstruct,

    /// Failed to parse query text
    ParseError,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTable => "UNKNOWN_TABLE",
            Self::DuplicateTable => "DUPLICATE_TABLE",
            Self::UnknownColumn => "UNKNOWN_COLUMN",
            Self::AmbiguousColumn => "AMBIGUOUS_COLUMN",
            Self::AmbiguousTable => "AMBIGUOUS_TABLE",
            Self::MissingContextValue => "MISSING_CONTEXT_VALUE",
            Self::UnsupportedConstruct => "UNSUPPORTED_CONSTRUCT",
            Self::ParseError => "PARSE_ERROR",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a node in the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed)
    pub column: usize,
}

impl Location {
    /// Create a location from a line and column
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Human-readable message
    pub message: String,

    /// Offending identifier (table, column or alias name)
    pub identifier: Option<String>,

    /// Source location (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            identifier: None,
            location: None,
        }
    }

    /// Set the offending identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set the location, if known
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "[{}] {} (at {})", self.code, self.message, loc),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
