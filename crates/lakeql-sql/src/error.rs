//! Compilation errors
//!
//! Every error is terminal for the compilation that raised it: no partial
//! text is ever returned alongside one.

use crate::parser::ParseError;
use lakeql_core::{Diagnostic, DiagnosticCode, Location};

/// Errors raised while resolving or printing a query
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Unknown table: {name}")]
    UnknownTable {
        name: String,
        location: Option<Location>,
    },

    #[error("Unknown column: {name}")]
    UnknownColumn {
        name: String,
        location: Option<Location>,
    },

    #[error("Ambiguous column {name}: found in {}", .candidates.join(", "))]
    AmbiguousColumn {
        name: String,
        /// Effective names of the table references owning the column
        candidates: Vec<String>,
        location: Option<Location>,
    },

    #[error("Ambiguous table reference: {name} is bound twice in one scope")]
    AmbiguousTable {
        name: String,
        location: Option<Location>,
    },

    #[error("Unsupported construct: {construct}")]
    UnsupportedConstruct {
        construct: String,
        location: Option<Location>,
    },

    #[error("Missing execution context value '{key}' required by table {table}")]
    MissingContextValue { key: String, table: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CompileError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            location: None,
        }
    }

    /// Stable diagnostic code for this error
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::UnknownTable { .. } => DiagnosticCode::UnknownTable,
            Self::UnknownColumn { .. } => DiagnosticCode::UnknownColumn,
            Self::AmbiguousColumn { .. } => DiagnosticCode::AmbiguousColumn,
            Self::AmbiguousTable { .. } => DiagnosticCode::AmbiguousTable,
            Self::UnsupportedConstruct { .. } => DiagnosticCode::UnsupportedConstruct,
            Self::MissingContextValue { .. } => DiagnosticCode::MissingContextValue,
            Self::Parse(e) => e.code(),
        }
    }

    /// The offending identifier, if the error names one
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::UnknownTable { name, .. }
            | Self::UnknownColumn { name, .. }
            | Self::AmbiguousColumn { name, .. }
            | Self::AmbiguousTable { name, .. } => Some(name),
            Self::MissingContextValue { key, .. } => Some(key),
            Self::UnsupportedConstruct { .. } | Self::Parse(_) => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Self::UnknownTable { location, .. }
            | Self::UnknownColumn { location, .. }
            | Self::AmbiguousColumn { location, .. }
            | Self::AmbiguousTable { location, .. }
            | Self::UnsupportedConstruct { location, .. } => *location,
            Self::MissingContextValue { .. } | Self::Parse(_) => None,
        }
    }

    /// Convert to a LakeQL diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.to_string()).with_location(self.location());

        match self.identifier() {
            Some(identifier) => diag.with_identifier(identifier),
            None => diag,
        }
    }
}
