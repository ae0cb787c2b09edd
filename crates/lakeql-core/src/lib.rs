//! LakeQL Core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod schema;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Location};
pub use schema::{LogicalType, Column};
pub use config::{CompilerConfig, ConfigError};
