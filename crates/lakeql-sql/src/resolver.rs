//! Name resolution for table references and columns
//!
//! Binds every table reference in FROM/JOIN to its catalog definition and
//! every field to exactly one column of a table reference in scope. The
//! result borrows the definitions from the catalog, so a resolved query
//! cannot outlive the catalog it was bound against.

use crate::ast::{Constant, Expr, FieldRef, FromItem, JoinKind, Select, TableRef};
use crate::error::CompileError;
use lakeql_catalog::{Catalog, CatalogError, TableDefinition};
use lakeql_core::{Location, LogicalType};

/// A table reference visible in a scope
#[derive(Debug, Clone)]
pub struct ScopeEntry<'a> {
    /// Alias if present, else the bare table name
    pub effective_name: String,

    pub table: &'a TableDefinition,
}

/// Ordered table references visible to one FROM/JOIN level
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    entries: Vec<ScopeEntry<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Bind `table` under `effective_name`
    pub fn bind(
        &mut self,
        effective_name: impl Into<String>,
        table: &'a TableDefinition,
        location: Option<Location>,
    ) -> Result<(), CompileError> {
        let effective_name = effective_name.into();

        if self.entry(&effective_name).is_some() {
            return Err(CompileError::AmbiguousTable {
                name: effective_name,
                location,
            });
        }

        self.entries.push(ScopeEntry { effective_name, table });
        Ok(())
    }

    /// Fold another scope's entries into this one, keeping order
    pub fn merge(&mut self, other: Scope<'a>) -> Result<(), CompileError> {
        for entry in other.entries {
            self.bind(entry.effective_name, entry.table, None)?;
        }
        Ok(())
    }

    pub fn entry(&self, effective_name: &str) -> Option<&ScopeEntry<'a>> {
        self.entries.iter().find(|e| e.effective_name == effective_name)
    }

    pub fn entries(&self) -> &[ScopeEntry<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a field against the entries of this scope
    pub fn resolve_field(&self, field: &FieldRef) -> Result<ResolvedColumn, CompileError> {
        match field.chain.as_slice() {
            [column] => {
                let owners: Vec<&ScopeEntry<'a>> = self
                    .entries
                    .iter()
                    .filter(|e| e.table.find_column(column).is_some())
                    .collect();

                match owners.as_slice() {
                    [] => Err(CompileError::UnknownColumn {
                        name: column.clone(),
                        location: field.location,
                    }),
                    [owner] => Ok(ResolvedColumn::of(owner, column)),
                    _ => Err(CompileError::AmbiguousColumn {
                        name: column.clone(),
                        candidates: owners.iter().map(|e| e.effective_name.clone()).collect(),
                        location: field.location,
                    }),
                }
            }
            [qualifier, column] => {
                let entry = self.entry(qualifier).ok_or_else(|| CompileError::UnknownTable {
                    name: qualifier.clone(),
                    location: field.location,
                })?;

                if entry.table.find_column(column).is_none() {
                    return Err(CompileError::UnknownColumn {
                        name: field.to_string(),
                        location: field.location,
                    });
                }

                Ok(ResolvedColumn::of(entry, column))
            }
            _ => Err(CompileError::UnsupportedConstruct {
                construct: format!("field reference {}", field),
                location: field.location,
            }),
        }
    }
}

/// What a field reference resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Effective name of the owning table reference
    pub effective_name: String,

    pub column: String,

    pub logical_type: LogicalType,
}

impl ResolvedColumn {
    fn of(entry: &ScopeEntry<'_>, column: &str) -> Self {
        let logical_type = entry
            .table
            .find_column(column)
            .map(|c| c.logical_type.clone())
            .unwrap_or(LogicalType::Unknown);

        Self {
            effective_name: entry.effective_name.clone(),
            column: column.to_string(),
            logical_type,
        }
    }
}

/// Expression with every field bound
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedExpr {
    Field {
        /// The reference as written (or as produced by wildcard expansion)
        written: FieldRef,
        resolved: ResolvedColumn,
    },
    Constant(Constant),
    Call {
        name: String,
        args: Vec<ResolvedExpr>,
        distinct: bool,
    },
    Alias {
        expr: Box<ResolvedExpr>,
        alias: String,
    },
    /// Bare reference to an alias defined in the SELECT list
    AliasRef(String),
}

/// A table reference bound to its catalog definition
#[derive(Debug, Clone)]
pub struct ResolvedTable<'a> {
    /// The reference as written
    pub table_ref: TableRef,

    pub effective_name: String,

    pub definition: &'a TableDefinition,
}

#[derive(Debug, Clone)]
pub struct ResolvedJoin<'a> {
    pub left: ResolvedFrom<'a>,
    pub right: ResolvedFrom<'a>,
    pub kind: JoinKind,
    pub on: Option<ResolvedExpr>,
}

#[derive(Debug, Clone)]
pub enum ResolvedFrom<'a> {
    Table(ResolvedTable<'a>),
    Join(Box<ResolvedJoin<'a>>),
}

impl<'a> ResolvedFrom<'a> {
    /// Table references in first-encountered (left-to-right) order
    pub fn tables(&self) -> Vec<&ResolvedTable<'a>> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'s>(&'s self, out: &mut Vec<&'s ResolvedTable<'a>>) {
        match self {
            Self::Table(table) => out.push(table),
            Self::Join(join) => {
                join.left.collect_tables(out);
                join.right.collect_tables(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrder {
    pub expr: ResolvedExpr,
    pub descending: bool,
}

/// A SELECT with all references resolved
#[derive(Debug, Clone)]
pub struct ResolvedSelect<'a> {
    pub distinct: bool,
    /// Select list with wildcards expanded
    pub columns: Vec<ResolvedExpr>,
    pub from: Option<ResolvedFrom<'a>>,
    pub where_clause: Option<ResolvedExpr>,
    pub group_by: Vec<ResolvedExpr>,
    pub having: Option<ResolvedExpr>,
    pub order_by: Vec<ResolvedOrder>,
    pub limit: Option<ResolvedExpr>,
    pub offset: Option<ResolvedExpr>,
    /// Combined scope of the FROM clause
    pub scope: Scope<'a>,
}

/// Binds queries against a catalog
pub struct Resolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve every table and field reference of `select`
    pub fn resolve(&self, select: &Select) -> Result<ResolvedSelect<'a>, CompileError> {
        let (from, scope) = match &select.from {
            Some(item) => {
                let (from, scope) = self.resolve_from(item)?;
                (Some(from), scope)
            }
            None => (None, Scope::new()),
        };

        // Aliases are not visible inside the select list itself
        let mut columns = Vec::with_capacity(select.columns.len());
        for expr in &select.columns {
            match expr {
                Expr::Asterisk { qualifier, location } => {
                    columns.extend(self.expand_wildcard(qualifier.as_deref(), *location, &scope)?);
                }
                other => columns.push(self.resolve_expr(other, &scope, &[])?),
            }
        }

        let aliases: Vec<String> = columns
            .iter()
            .filter_map(|c| match c {
                ResolvedExpr::Alias { alias, .. } => Some(alias.clone()),
                _ => None,
            })
            .collect();

        let resolve = |expr: &Expr| self.resolve_expr(expr, &scope, &aliases);

        let where_clause = select.where_clause.as_ref().map(resolve).transpose()?;
        let group_by = select.group_by.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
        let having = select.having.as_ref().map(resolve).transpose()?;

        let mut order_by = Vec::with_capacity(select.order_by.len());
        for item in &select.order_by {
            order_by.push(ResolvedOrder {
                expr: resolve(&item.expr)?,
                descending: item.descending,
            });
        }

        let limit = select.limit.as_ref().map(resolve).transpose()?;
        let offset = select.offset.as_ref().map(resolve).transpose()?;

        Ok(ResolvedSelect {
            distinct: select.distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
            scope,
        })
    }

    /// Resolve a FROM item into its bound form and the scope it introduces
    fn resolve_from(&self, item: &FromItem) -> Result<(ResolvedFrom<'a>, Scope<'a>), CompileError> {
        match item {
            FromItem::Table(table_ref) => {
                let definition = self.catalog.lookup(&table_ref.name).map_err(|e| match e {
                    CatalogError::UnknownTable(name) | CatalogError::DuplicateTable(name) => {
                        CompileError::UnknownTable {
                            name,
                            location: table_ref.location,
                        }
                    }
                })?;

                let effective_name = table_ref.effective_name().to_string();
                let mut scope = Scope::new();
                scope.bind(effective_name.clone(), definition, table_ref.location)?;

                let resolved = ResolvedTable {
                    table_ref: table_ref.clone(),
                    effective_name,
                    definition,
                };

                Ok((ResolvedFrom::Table(resolved), scope))
            }
            FromItem::Join(join) => {
                let (left, mut scope) = self.resolve_from(&join.left)?;
                let (right, right_scope) = self.resolve_from(&join.right)?;

                if let FromItem::Table(table_ref) = &join.right {
                    // Report the clash at the right-hand reference
                    if scope.entry(table_ref.effective_name()).is_some() {
                        return Err(CompileError::AmbiguousTable {
                            name: table_ref.effective_name().to_string(),
                            location: table_ref.location,
                        });
                    }
                }
                scope.merge(right_scope)?;

                // ON sees both sides of this join and nothing to its right
                let on = join
                    .on
                    .as_ref()
                    .map(|expr| self.resolve_expr(expr, &scope, &[]))
                    .transpose()?;

                let resolved = ResolvedJoin {
                    left,
                    right,
                    kind: join.kind,
                    on,
                };

                Ok((ResolvedFrom::Join(Box::new(resolved)), scope))
            }
        }
    }

    /// Expand `*` or `qualifier.*` in catalog declaration order
    fn expand_wildcard(
        &self,
        qualifier: Option<&str>,
        location: Option<Location>,
        scope: &Scope<'a>,
    ) -> Result<Vec<ResolvedExpr>, CompileError> {
        let entry = match qualifier {
            Some(qualifier) => scope.entry(qualifier).ok_or_else(|| CompileError::UnknownTable {
                name: qualifier.to_string(),
                location,
            })?,
            None => match scope.entries() {
                [] => {
                    return Err(CompileError::UnsupportedConstruct {
                        construct: "* without a FROM clause".to_string(),
                        location,
                    })
                }
                [entry] => entry,
                entries => {
                    return Err(CompileError::AmbiguousColumn {
                        name: "*".to_string(),
                        candidates: entries.iter().map(|e| e.effective_name.clone()).collect(),
                        location,
                    })
                }
            },
        };

        Ok(entry
            .table
            .columns
            .iter()
            .map(|column| {
                let written = match qualifier {
                    Some(q) => FieldRef::new([q, column.name.as_str()]),
                    None => FieldRef::new([column.name.as_str()]),
                };
                ResolvedExpr::Field {
                    written,
                    resolved: ResolvedColumn::of(entry, &column.name),
                }
            })
            .collect())
    }

    fn resolve_expr(&self, expr: &Expr, scope: &Scope<'a>, aliases: &[String]) -> Result<ResolvedExpr, CompileError> {
        match expr {
            Expr::Field(field) => {
                if let [name] = field.chain.as_slice() {
                    // SELECT-list aliases shadow columns, as in the backend
                    if aliases.contains(name) {
                        return Ok(ResolvedExpr::AliasRef(name.clone()));
                    }
                }

                Ok(ResolvedExpr::Field {
                    written: field.clone(),
                    resolved: scope.resolve_field(field)?,
                })
            }
            Expr::Constant(constant) => Ok(ResolvedExpr::Constant(constant.clone())),
            Expr::Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.resolve_expr(arg, scope, aliases))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ResolvedExpr::Call {
                    name: call.name.clone(),
                    args,
                    distinct: call.distinct,
                })
            }
            Expr::Alias { expr, alias } => Ok(ResolvedExpr::Alias {
                expr: Box::new(self.resolve_expr(expr, scope, aliases)?),
                alias: alias.clone(),
            }),
            Expr::Asterisk { .. } => Err(CompileError::unsupported("* outside the select list")),
        }
    }
}

/// Resolve `select` against `catalog`
pub fn bind<'a>(select: &Select, catalog: &'a Catalog) -> Result<ResolvedSelect<'a>, CompileError> {
    Resolver::new(catalog).resolve(select)
}
