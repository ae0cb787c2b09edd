//! Dual-dialect printer
//!
//! Renders a [`ResolvedSelect`] either back into the surface syntax or into
//! an executable statement for the analytical backend. In the execution
//! dialect every virtual table reference is materialized as a WITH block
//! over the storage table function, tenant scoping predicates are injected
//! into WHERE, and string values are lifted into ordered `%(name)s`
//! placeholders.
//!
//! Placeholders are numbered in text order. The WITH blocks are built
//! first from the table references in FROM order, then the select list,
//! FROM with its ON predicates, WHERE (scoping predicates leading), GROUP
//! BY, HAVING, ORDER BY, LIMIT and OFFSET are printed in turn.

use crate::error::CompileError;
use crate::resolver::{ResolvedExpr, ResolvedFrom, ResolvedOrder, ResolvedSelect, ResolvedTable};
use crate::ast::Constant;
use lakeql_catalog::{AccessDescriptor, ScopingPredicate, TableKind};
use lakeql_core::CompilerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static PLAIN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Normalized re-rendering of the input syntax
    Surface,
    /// Executable backend statement with placeholders
    Execution,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

/// A value bound to one placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    /// Placeholder text as it appears in the statement
    pub fn placeholder(&self) -> String {
        format!("%({})s", self.name)
    }
}

/// Allocates placeholders in print order
///
/// Indices start at 0 and are never reused within one compilation.
#[derive(Debug, Clone)]
pub struct ParameterAccumulator {
    prefix: String,
    values: Vec<Parameter>,
}

impl ParameterAccumulator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: Vec::new(),
        }
    }

    /// Bind `value` to a fresh placeholder and return its text
    pub fn add(&mut self, value: impl Into<String>) -> String {
        let parameter = Parameter {
            name: format!("{}_{}", self.prefix, self.values.len()),
            value: value.into(),
        };
        let placeholder = parameter.placeholder();
        self.values.push(parameter);
        placeholder
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.values
    }
}

/// A per-call value feeding scoping predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Int(i64),
    String(String),
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Per-call values such as the tenant id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    values: BTreeMap<String, ContextValue>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }
}

/// A scoping predicate met while printing FROM, rendered later in WHERE
struct Guard {
    effective_name: String,
    table: String,
    predicate: ScopingPredicate,
}

/// Mutable state threaded through one rendering
struct PrintContext {
    dialect: Dialect,
    params: ParameterAccumulator,
    /// Effective names of virtual references already materialized
    materialized: Vec<String>,
    /// Materialization blocks in first-encountered order
    ctes: Vec<String>,
    /// Scoping predicates in first-encountered order
    guards: Vec<Guard>,
}

struct Printer<'c> {
    config: &'c CompilerConfig,
    context: &'c ExecutionContext,
    state: PrintContext,
}

/// Render `resolved` in `dialect`
///
/// Returns the statement text and, for the execution dialect, the ordered
/// placeholder values. Nothing is returned when any part fails to print.
pub fn render(
    resolved: &ResolvedSelect<'_>,
    dialect: Dialect,
    config: &CompilerConfig,
    context: &ExecutionContext,
) -> Result<(String, Vec<Parameter>), CompileError> {
    let mut printer = Printer {
        config,
        context,
        state: PrintContext {
            dialect,
            params: ParameterAccumulator::new(config.placeholder_prefix.as_str()),
            materialized: Vec::new(),
            ctes: Vec::new(),
            guards: Vec::new(),
        },
    };

    let sql = printer.print_select(resolved)?;
    Ok((sql, printer.state.params.into_parameters()))
}

impl<'c> Printer<'c> {
    fn execution(&self) -> bool {
        self.state.dialect == Dialect::Execution
    }

    fn print_select(&mut self, select: &ResolvedSelect<'_>) -> Result<String, CompileError> {
        if self.execution() {
            if let Some(from) = &select.from {
                for table in from.tables() {
                    if let TableKind::Virtual(descriptor) = &table.definition.kind {
                        self.materialize(&table.effective_name, descriptor)?;
                    }
                }
            }
        }

        let columns = self.print_list(&select.columns)?;
        let from = select.from.as_ref().map(|f| self.print_from(f)).transpose()?;
        let where_clause = self.print_where(select.where_clause.as_ref())?;
        let group_by = self.print_list(&select.group_by)?;
        let having = select.having.as_ref().map(|e| self.print_expr(e)).transpose()?;
        let order_by = self.print_order(&select.order_by)?;
        let limit = self.print_limit(select.limit.as_ref())?;
        let offset = select.offset.as_ref().map(|e| self.print_expr(e)).transpose()?;

        let mut sql = String::new();
        if !self.state.ctes.is_empty() {
            sql.push_str("WITH ");
            sql.push_str(&self.state.ctes.join(", "));
            sql.push(' ');
        }

        sql.push_str("SELECT ");
        if select.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns);

        if let Some(from) = from {
            sql.push_str(" FROM ");
            sql.push_str(&from);
        }
        if let Some(where_clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by);
        }
        if let Some(having) = having {
            sql.push_str(" HAVING ");
            sql.push_str(&having);
        }
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by);
        }
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit);
        }
        if let Some(offset) = offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&offset);
        }

        Ok(sql)
    }

    fn print_from(&mut self, from: &ResolvedFrom<'_>) -> Result<String, CompileError> {
        match from {
            ResolvedFrom::Table(table) => self.print_table(table),
            ResolvedFrom::Join(join) => {
                let left = self.print_from(&join.left)?;
                let right = self.print_from(&join.right)?;
                let right = match join.right {
                    ResolvedFrom::Join(_) => format!("({})", right),
                    ResolvedFrom::Table(_) => right,
                };

                let mut out = format!("{} {} {}", left, join.kind.keyword(), right);
                if let Some(on) = &join.on {
                    out.push_str(" ON ");
                    out.push_str(&self.print_expr(on)?);
                }
                Ok(out)
            }
        }
    }

    fn print_table(&mut self, table: &ResolvedTable<'_>) -> Result<String, CompileError> {
        let written = self.print_written_table(table)?;
        if !self.execution() {
            return Ok(written);
        }

        let physical = match &table.definition.kind {
            TableKind::Virtual(_) => return Ok(written),
            TableKind::Physical(physical) => physical,
        };

        let printed = match &physical.backend_name {
            Some(backend_name) => backend_name
                .split('.')
                .map(|segment| self.identifier(segment))
                .collect::<Result<Vec<_>, _>>()?
                .join("."),
            None => self.identifier(&table.definition.name)?,
        };
        let printed_name = physical.backend_name.as_deref().unwrap_or(&table.definition.name);

        if let Some(predicate) = table.definition.scoping() {
            self.state.guards.push(Guard {
                effective_name: table.effective_name.clone(),
                table: table.definition.name.clone(),
                predicate: predicate.clone(),
            });
        }

        if table.effective_name == printed_name {
            Ok(printed)
        } else {
            Ok(format!("{} AS {}", printed, self.identifier(&table.effective_name)?))
        }
    }

    /// `name [AS alias]` exactly as written
    fn print_written_table(&self, table: &ResolvedTable<'_>) -> Result<String, CompileError> {
        let name = self.identifier(&table.table_ref.name)?;
        match &table.table_ref.alias {
            Some(alias) => Ok(format!("{} AS {}", name, self.identifier(alias)?)),
            None => Ok(name),
        }
    }

    fn materialize(&mut self, effective_name: &str, descriptor: &AccessDescriptor) -> Result<(), CompileError> {
        if self.state.materialized.iter().any(|name| name == effective_name) {
            return Ok(());
        }

        if descriptor.provider.contains('%') {
            return Err(CompileError::unsupported(format!(
                "provider {} contains the placeholder character %",
                descriptor.provider
            )));
        }

        let function = self.identifier(&self.config.storage_function)?;
        let mut args = vec![quote_string(&descriptor.provider)];
        for value in descriptor.arguments() {
            args.push(self.state.params.add(value));
        }

        let block = format!(
            "{} AS (SELECT * FROM {}({}))",
            self.identifier(effective_name)?,
            function,
            args.join(", ")
        );

        tracing::trace!(table = effective_name, "materialized virtual table");
        self.state.materialized.push(effective_name.to_string());
        self.state.ctes.push(block);
        Ok(())
    }

    fn print_guard(&mut self, guard: &Guard) -> Result<String, CompileError> {
        let value = match self.context.get(&guard.predicate.context_key) {
            Some(ContextValue::Int(value)) => value.to_string(),
            Some(ContextValue::String(value)) => self.state.params.add(value.as_str()),
            None => {
                return Err(CompileError::MissingContextValue {
                    key: guard.predicate.context_key.clone(),
                    table: guard.table.clone(),
                })
            }
        };

        Ok(format!(
            "equals({}.{}, {})",
            self.identifier(&guard.effective_name)?,
            self.identifier(&guard.predicate.column)?,
            value
        ))
    }

    /// Conjoin scoping predicates with the user's WHERE
    ///
    /// Guards lead the conjunction, so their values are allocated first.
    fn print_where(&mut self, user: Option<&ResolvedExpr>) -> Result<Option<String>, CompileError> {
        let guards = std::mem::take(&mut self.state.guards);
        if guards.is_empty() {
            return user.map(|e| self.print_expr(e)).transpose();
        }

        let mut args = Vec::with_capacity(guards.len());
        for guard in &guards {
            args.push(self.print_guard(guard)?);
        }

        match user {
            Some(ResolvedExpr::Call { name, args: user_args, distinct: false }) if name == "and" => {
                for arg in user_args {
                    args.push(self.print_expr(arg)?);
                }
            }
            Some(other) => args.push(self.print_expr(other)?),
            None => {}
        }

        if args.len() == 1 {
            return Ok(args.pop());
        }
        Ok(Some(format!("and({})", args.join(", "))))
    }

    fn print_limit(&mut self, limit: Option<&ResolvedExpr>) -> Result<Option<String>, CompileError> {
        let max = match self.config.max_limit {
            Some(max) if self.execution() => i64::try_from(max).unwrap_or(i64::MAX),
            _ => return limit.map(|e| self.print_expr(e)).transpose(),
        };

        match limit {
            Some(ResolvedExpr::Constant(Constant::Int(n))) => Ok(Some((*n).min(max).to_string())),
            Some(other) => Ok(Some(format!("min2({}, {})", self.print_expr(other)?, max))),
            None => Ok(Some(max.to_string())),
        }
    }

    fn print_order(&mut self, order_by: &[ResolvedOrder]) -> Result<String, CompileError> {
        let mut items = Vec::with_capacity(order_by.len());
        for item in order_by {
            let direction = if item.descending { "DESC" } else { "ASC" };
            items.push(format!("{} {}", self.print_expr(&item.expr)?, direction));
        }
        Ok(items.join(", "))
    }

    fn print_list(&mut self, exprs: &[ResolvedExpr]) -> Result<String, CompileError> {
        let mut items = Vec::with_capacity(exprs.len());
        for expr in exprs {
            items.push(self.print_expr(expr)?);
        }
        Ok(items.join(", "))
    }

    fn print_expr(&mut self, expr: &ResolvedExpr) -> Result<String, CompileError> {
        match expr {
            ResolvedExpr::Field { written, resolved } => {
                let parts = if self.execution() {
                    vec![
                        self.identifier(&resolved.effective_name)?,
                        self.identifier(&resolved.column)?,
                    ]
                } else {
                    written
                        .chain
                        .iter()
                        .map(|part| self.identifier(part))
                        .collect::<Result<Vec<_>, _>>()?
                };
                Ok(parts.join("."))
            }
            ResolvedExpr::Constant(constant) => self.print_constant(constant),
            ResolvedExpr::Call { name, args, distinct } => {
                if !PLAIN_IDENTIFIER.is_match(name) {
                    return Err(CompileError::unsupported(format!("function name {}", name)));
                }

                let args = self.print_list(args)?;
                if *distinct {
                    Ok(format!("{}(DISTINCT {})", name, args))
                } else {
                    Ok(format!("{}({})", name, args))
                }
            }
            ResolvedExpr::Alias { expr, alias } => {
                let expr = self.print_expr(expr)?;
                Ok(format!("{} AS {}", expr, self.identifier(alias)?))
            }
            // Select aliases shadow columns and the backend resolves them in every clause
            ResolvedExpr::AliasRef(alias) => self.identifier(alias),
        }
    }

    fn print_constant(&mut self, constant: &Constant) -> Result<String, CompileError> {
        match constant {
            Constant::Null => Ok("NULL".to_string()),
            Constant::Bool(value) => Ok(value.to_string()),
            Constant::Int(value) => Ok(value.to_string()),
            Constant::Float(value) if value.is_finite() => Ok(format!("{:?}", value)),
            Constant::Float(value) => Err(CompileError::unsupported(format!("float constant {}", value))),
            Constant::String(value) if self.execution() => Ok(self.state.params.add(value.as_str())),
            Constant::String(value) => Ok(quote_string(value)),
        }
    }

    fn identifier(&self, name: &str) -> Result<String, CompileError> {
        if self.execution() && name.contains('%') {
            return Err(CompileError::unsupported(format!(
                "identifier {} contains the placeholder character %",
                name
            )));
        }
        Ok(escape_identifier(name))
    }
}

/// Print `name` bare when it is a plain identifier, else backtick-quoted
pub fn escape_identifier(name: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(name) {
        return name.to_string();
    }

    let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{}`", escaped)
}

/// Single-quoted string literal
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
