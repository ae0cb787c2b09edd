//! Normalized query AST
//!
//! Operators are already rewritten into canonical function-call form
//! (`a = b` is `equals(a, b)`), so the resolver and printer never interpret
//! operator semantics.

use lakeql_core::Location;
use std::fmt;

/// A single SELECT statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,
    pub columns: Vec<Expr>,
    pub from: Option<FromItem>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderExpr>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

impl Select {
    /// Create a SELECT over the given columns with no FROM clause
    pub fn new(columns: Vec<Expr>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn from(mut self, from: FromItem) -> Self {
        self.from = Some(from);
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn order_by(mut self, expr: Expr, descending: bool) -> Self {
        self.order_by.push(OrderExpr { expr, descending });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(Expr::int(limit));
        self
    }
}

/// A table named in FROM/JOIN
///
/// Equality ignores the source location.
#[derive(Debug, Clone)]
pub struct TableRef {
    /// Catalog name as written
    pub name: String,

    pub alias: Option<String>,

    pub location: Option<Location>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            location: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Alias if present, else the bare table name
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.alias == other.alias
    }
}

impl Eq for TableRef {}

/// Join kinds, carried through unchanged from the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A join of two FROM items
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: FromItem,
    pub right: FromItem,
    pub kind: JoinKind,
    /// ON predicate, in function-call form
    pub on: Option<Expr>,
}

/// The FROM clause tree
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Table(TableRef),
    Join(Box<Join>),
}

impl FromItem {
    pub fn table(table: TableRef) -> Self {
        Self::Table(table)
    }

    /// Join `right` onto `self`
    pub fn join(self, kind: JoinKind, right: FromItem, on: Option<Expr>) -> Self {
        Self::Join(Box::new(Join {
            left: self,
            right,
            kind,
            on,
        }))
    }
}

impl From<TableRef> for FromItem {
    fn from(table: TableRef) -> Self {
        Self::Table(table)
    }
}

/// Column reference, optionally qualified by a table reference name
///
/// Equality ignores the source location.
#[derive(Debug, Clone)]
pub struct FieldRef {
    /// `[column]` or `[qualifier, column]`
    pub chain: Vec<String>,

    pub location: Option<Location>,
}

impl FieldRef {
    pub fn new<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chain: chain.into_iter().map(Into::into).collect(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.chain == other.chain
    }
}

impl Eq for FieldRef {}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chain.join("."))
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Function call; every operator is one of these
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(FieldRef),
    Constant(Constant),
    Call(Call),
    Alias { expr: Box<Expr>, alias: String },
    /// `*` or `qualifier.*`
    Asterisk {
        qualifier: Option<String>,
        location: Option<Location>,
    },
}

impl Expr {
    pub fn field<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Field(FieldRef::new(chain))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call(Call {
            name: name.into(),
            args,
            distinct: false,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Constant(Constant::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::Constant(Constant::Int(value))
    }

    pub fn star() -> Self {
        Self::Asterisk {
            qualifier: None,
            location: None,
        }
    }

    /// `qualifier.*`
    pub fn qualified_star(qualifier: impl Into<String>) -> Self {
        Self::Asterisk {
            qualifier: Some(qualifier.into()),
            location: None,
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    pub expr: Expr,
    pub descending: bool,
}
