//! Compilation facade: parse, resolve, print

use crate::ast::Select;
use crate::error::CompileError;
use crate::parser::SqlParser;
use crate::printer::{render, Dialect, ExecutionContext, Parameter};
use crate::resolver::bind;
use lakeql_catalog::Catalog;
use lakeql_core::CompilerConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Output of one compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,

    /// Placeholder values in allocation order; empty for surface output
    pub parameters: Vec<Parameter>,

    pub dialect: Dialect,
}

impl CompiledQuery {
    /// Stable digest of the statement and its bound values
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        for parameter in &self.parameters {
            hasher.update([0u8]);
            hasher.update(parameter.name.as_bytes());
            hasher.update([b'=']);
            hasher.update(parameter.value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Placeholder values keyed by name, for drivers binding `%(name)s`
    pub fn parameter_values(&self) -> Vec<(&str, &str)> {
        self.parameters
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }
}

/// Compiles queries against one catalog and configuration
///
/// Holds only shared references, so one compiler can serve concurrent
/// compilations. Query text is read with the ClickHouse dialect, which
/// accepts the backslash escapes surface output writes in strings.
pub struct Compiler<'a> {
    catalog: &'a Catalog,
    config: &'a CompilerConfig,
    parser: SqlParser,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a CompilerConfig) -> Self {
        Self {
            catalog,
            config,
            parser: SqlParser::clickhouse(),
        }
    }

    /// Resolve and print an already-built query
    pub fn compile(
        &self,
        select: &Select,
        dialect: Dialect,
        context: &ExecutionContext,
    ) -> Result<CompiledQuery, CompileError> {
        let result = bind(select, self.catalog).and_then(|resolved| {
            let tables = resolved.scope.len();
            render(&resolved, dialect, self.config, context).map(|out| (out, tables))
        });

        match result {
            Ok(((sql, parameters), tables)) => {
                tracing::debug!(
                    %dialect,
                    tables,
                    parameters = parameters.len(),
                    "compiled query"
                );
                Ok(CompiledQuery {
                    sql,
                    parameters,
                    dialect,
                })
            }
            Err(e) => {
                tracing::warn!(%dialect, code = e.code().as_str(), error = %e, "compilation failed");
                Err(e)
            }
        }
    }

    /// Parse `sql` and compile it
    pub fn compile_sql(
        &self,
        sql: &str,
        dialect: Dialect,
        context: &ExecutionContext,
    ) -> Result<CompiledQuery, CompileError> {
        let select = self.parser.parse_select(sql).map_err(|e| {
            tracing::warn!(%dialect, error = %e, "query did not parse");
            CompileError::from(e)
        })?;

        self.compile(&select, dialect, context)
    }
}
