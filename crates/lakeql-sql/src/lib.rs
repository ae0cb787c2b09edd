//! Query compilation for LakeQL
//!
//! This crate handles:
//! - Parsing SQL text into the normalized AST using sqlparser
//! - Resolving table and column references against the catalog
//! - Printing resolved queries in the surface or execution dialect
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lakeql_sql::{Compiler, Dialect, ExecutionContext};
//!
//! let compiler = Compiler::new(&catalog, &config);
//! let query = compiler.compile_sql(
//!     "SELECT event FROM events LIMIT 10",
//!     Dialect::Execution,
//!     &ExecutionContext::new().with_value("team_id", 42_i64),
//! )?;
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod parser;
pub mod printer;
pub mod resolver;

pub use ast::{Call, Constant, Expr, FieldRef, FromItem, Join, JoinKind, OrderExpr, Select, TableRef};
pub use compiler::{CompiledQuery, Compiler};
pub use error::CompileError;
pub use parser::{ParseError, ParseErrorKind, SqlParser};
pub use printer::{render, ContextValue, Dialect, ExecutionContext, Parameter, ParameterAccumulator};
pub use resolver::{bind, ResolvedExpr, ResolvedSelect, Resolver, Scope};
