//! Query text front end using datafusion-sqlparser-rs
//!
//! Parses SQL text and lowers it into the normalized AST: operators become
//! canonical function calls (`a = b` → `equals(a, b)`), parentheses are
//! dropped, and anything the compiler cannot render is rejected up front.

use crate::ast::{Constant, Expr, FieldRef, FromItem, JoinKind, OrderExpr, Select, TableRef};
use lakeql_core::{Diagnostic, DiagnosticCode, Location};
use sqlparser::ast::{
    self as sql, BinaryOperator, DuplicateTreatment, FunctionArg, FunctionArgExpr, FunctionArguments,
    GroupByExpr, JoinConstraint, JoinOperator, SelectItem, SetExpr, Statement, TableFactor,
    UnaryOperator, Value,
};
use sqlparser::dialect::{ClickHouseDialect, Dialect, GenericDialect};
use sqlparser::parser::{Parser, ParserError};

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl SqlParser {
    /// Create a new SQL parser with the default (generic) dialect
    pub fn new() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a SQL parser for ClickHouse syntax
    pub fn clickhouse() -> Self {
        Self {
            dialect: Box::new(ClickHouseDialect {}),
        }
    }

    /// Parse a single SELECT statement into the normalized AST
    pub fn parse_select(&self, sql: &str) -> Result<Select, ParseError> {
        let wrap = |kind: ParseErrorKind| ParseError {
            sql: sql.to_string(),
            kind,
        };

        let statements = Parser::parse_sql(&*self.dialect, sql).map_err(|e| wrap(e.into()))?;

        if statements.len() != 1 {
            return Err(wrap(ParseErrorKind::StatementCount(statements.len())));
        }

        match &statements[0] {
            Statement::Query(query) => lower_query(query).map_err(wrap),
            other => Err(wrap(ParseErrorKind::Unsupported(format!(
                "only SELECT statements are supported, got: {}",
                other
            )))),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Why parsing failed
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("{0}")]
    Syntax(#[from] ParserError),

    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),

    #[error("unsupported syntax: {0}")]
    Unsupported(String),
}

/// SQL parsing error with diagnostic information
#[derive(Debug)]
pub struct ParseError {
    /// SQL text as given
    pub sql: String,

    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn code(&self) -> DiagnosticCode {
        match self.kind {
            ParseErrorKind::Unsupported(_) => DiagnosticCode::UnsupportedConstruct,
            ParseErrorKind::Syntax(_) | ParseErrorKind::StatementCount(_) => DiagnosticCode::ParseError,
        }
    }

    /// Convert to a LakeQL diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.code(), format!("Failed to parse SQL: {}", self.kind))
    }

    /// Check if the text was valid SQL that the compiler cannot handle
    pub fn is_unsupported_syntax(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Unsupported(_))
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SQL parse error: {}", self.kind)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

type Lowered<T> = Result<T, ParseErrorKind>;

fn unsupported<T>(what: impl Into<String>) -> Lowered<T> {
    Err(ParseErrorKind::Unsupported(what.into()))
}

fn lower_query(query: &sql::Query) -> Lowered<Select> {
    if query.with.is_some() {
        return unsupported("WITH clauses");
    }
    if query.fetch.is_some() {
        return unsupported("FETCH");
    }

    let mut select = match query.body.as_ref() {
        SetExpr::Select(select) => lower_select(select)?,
        other => return unsupported(format!("set expression: {}", other)),
    };

    if let Some(order_by) = &query.order_by {
        for item in &order_by.exprs {
            select.order_by.push(OrderExpr {
                expr: lower_expr(&item.expr)?,
                descending: item.asc == Some(false),
            });
        }
    }

    select.limit = query.limit.as_ref().map(lower_expr).transpose()?;
    select.offset = query.offset.as_ref().map(|o| lower_expr(&o.value)).transpose()?;

    Ok(select)
}

fn lower_select(select: &sql::Select) -> Lowered<Select> {
    let distinct = match &select.distinct {
        None => false,
        Some(sql::Distinct::Distinct) => true,
        Some(sql::Distinct::On(_)) => return unsupported("DISTINCT ON"),
    };

    if select.top.is_some() {
        return unsupported("TOP");
    }

    let mut columns = Vec::with_capacity(select.projection.len());
    for item in &select.projection {
        columns.push(lower_select_item(item)?);
    }

    // Comma-separated FROM items are cross joins
    let mut from: Option<FromItem> = None;
    for table_with_joins in &select.from {
        let item = lower_table_with_joins(table_with_joins)?;
        from = Some(match from {
            None => item,
            Some(left) => left.join(JoinKind::Cross, item, None),
        });
    }

    let group_by = match &select.group_by {
        GroupByExpr::All(_) => return unsupported("GROUP BY ALL"),
        GroupByExpr::Expressions(exprs, modifiers) => {
            if !modifiers.is_empty() {
                return unsupported("GROUP BY modifiers");
            }
            exprs.iter().map(lower_expr).collect::<Lowered<Vec<_>>>()?
        }
    };

    Ok(Select {
        distinct,
        columns,
        from,
        where_clause: select.selection.as_ref().map(lower_expr).transpose()?,
        group_by,
        having: select.having.as_ref().map(lower_expr).transpose()?,
        order_by: Vec::new(),
        limit: None,
        offset: None,
    })
}

fn lower_select_item(item: &SelectItem) -> Lowered<Expr> {
    match item {
        SelectItem::UnnamedExpr(expr) => lower_expr(expr),
        SelectItem::ExprWithAlias { expr, alias } => Ok(lower_expr(expr)?.alias(alias.value.clone())),
        SelectItem::Wildcard(_) => Ok(Expr::star()),
        SelectItem::QualifiedWildcard(name, _) => Ok(Expr::Asterisk {
            qualifier: Some(object_name(name)),
            location: name.0.first().and_then(location_of),
        }),
    }
}

fn lower_table_with_joins(table: &sql::TableWithJoins) -> Lowered<FromItem> {
    let mut from = lower_table_factor(&table.relation)?;

    for join in &table.joins {
        let right = lower_table_factor(&join.relation)?;
        let (kind, constraint) = match &join.join_operator {
            JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
            JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
            JoinOperator::RightOuter(c) => (JoinKind::Right, Some(c)),
            JoinOperator::FullOuter(c) => (JoinKind::Full, Some(c)),
            JoinOperator::CrossJoin => (JoinKind::Cross, None),
            other => return unsupported(format!("join operator {:?}", other)),
        };

        let on = match constraint {
            None | Some(JoinConstraint::None) => None,
            Some(JoinConstraint::On(expr)) => Some(lower_expr(expr)?),
            Some(JoinConstraint::Using(_)) => return unsupported("JOIN ... USING"),
            Some(JoinConstraint::Natural) => return unsupported("NATURAL JOIN"),
        };

        from = from.join(kind, right, on);
    }

    Ok(from)
}

fn lower_table_factor(factor: &TableFactor) -> Lowered<FromItem> {
    match factor {
        TableFactor::Table { name, alias, args, .. } => {
            if args.is_some() {
                return unsupported("table functions");
            }
            let mut table = TableRef::new(object_name(name));
            table.location = name.0.first().and_then(location_of);
            if let Some(alias) = alias {
                if !alias.columns.is_empty() {
                    return unsupported("column aliases on tables");
                }
                table = table.with_alias(alias.name.value.clone());
            }
            Ok(FromItem::Table(table))
        }
        TableFactor::NestedJoin { table_with_joins, alias } => {
            if alias.is_some() {
                return unsupported("aliased nested joins");
            }
            lower_table_with_joins(table_with_joins)
        }
        TableFactor::Derived { .. } => unsupported("subqueries in FROM"),
        other => unsupported(format!("table factor: {}", other)),
    }
}

fn object_name(name: &sql::ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Start of an identifier in the query text; sqlparser uses line 0 for
/// identifiers it synthesized
fn location_of(ident: &sql::Ident) -> Option<Location> {
    let start = ident.span.start;
    (start.line > 0).then(|| Location::new(start.line as usize, start.column as usize))
}

fn field(idents: &[sql::Ident]) -> FieldRef {
    let mut field = FieldRef::new(idents.iter().map(|i| i.value.clone()));
    field.location = idents.first().and_then(location_of);
    field
}

fn binary_function(op: &BinaryOperator) -> Option<&'static str> {
    let name = match op {
        BinaryOperator::Eq => "equals",
        BinaryOperator::NotEq => "notEquals",
        BinaryOperator::Lt => "less",
        BinaryOperator::LtEq => "lessOrEquals",
        BinaryOperator::Gt => "greater",
        BinaryOperator::GtEq => "greaterOrEquals",
        BinaryOperator::And => "and",
        BinaryOperator::Or => "or",
        BinaryOperator::Plus => "plus",
        BinaryOperator::Minus => "minus",
        BinaryOperator::Multiply => "multiply",
        BinaryOperator::Divide => "divide",
        BinaryOperator::Modulo => "modulo",
        _ => return None,
    };
    Some(name)
}

/// Collect the operands of a chain of the same boolean connective
///
/// `a AND b AND c` lowers to `and(a, b, c)` rather than `and(and(a, b), c)`.
fn flatten_connective<'e>(expr: &'e sql::Expr, connective: &BinaryOperator, out: &mut Vec<&'e sql::Expr>) {
    match expr {
        sql::Expr::BinaryOp { left, op, right } if op == connective => {
            flatten_connective(left, connective, out);
            flatten_connective(right, connective, out);
        }
        sql::Expr::Nested(inner) => match inner.as_ref() {
            sql::Expr::BinaryOp { op, .. } if op == connective => flatten_connective(inner, connective, out),
            _ => out.push(expr),
        },
        _ => out.push(expr),
    }
}

fn lower_value(value: &Value) -> Lowered<Constant> {
    match value {
        Value::Number(text, _) => {
            if let Ok(int) = text.parse::<i64>() {
                Ok(Constant::Int(int))
            } else if let Ok(float) = text.parse::<f64>() {
                Ok(Constant::Float(float))
            } else {
                unsupported(format!("numeric literal {}", text))
            }
        }
        Value::SingleQuotedString(s) => Ok(Constant::String(s.clone())),
        Value::Boolean(b) => Ok(Constant::Bool(*b)),
        Value::Null => Ok(Constant::Null),
        other => unsupported(format!("literal {}", other)),
    }
}

fn lower_expr(expr: &sql::Expr) -> Lowered<Expr> {
    match expr {
        sql::Expr::Identifier(ident) => Ok(Expr::Field(field(std::slice::from_ref(ident)))),

        sql::Expr::CompoundIdentifier(idents) => Ok(Expr::Field(field(idents))),

        sql::Expr::Value(value) => Ok(Expr::Constant(lower_value(value)?)),

        sql::Expr::Nested(inner) => lower_expr(inner),

        sql::Expr::BinaryOp { left, op, right } => {
            let name = match binary_function(op) {
                Some(name) => name,
                None => return unsupported(format!("operator {}", op)),
            };

            let args = if matches!(op, BinaryOperator::And | BinaryOperator::Or) {
                let mut operands = Vec::new();
                flatten_connective(expr, op, &mut operands);
                operands.into_iter().map(lower_expr).collect::<Lowered<Vec<_>>>()?
            } else {
                vec![lower_expr(left)?, lower_expr(right)?]
            };

            Ok(Expr::call(name, args))
        }

        sql::Expr::UnaryOp { op, expr: inner } => match op {
            UnaryOperator::Not => Ok(Expr::call("not", vec![lower_expr(inner)?])),
            UnaryOperator::Plus => lower_expr(inner),
            UnaryOperator::Minus => match lower_expr(inner)? {
                Expr::Constant(Constant::Int(i)) => Ok(Expr::Constant(Constant::Int(-i))),
                Expr::Constant(Constant::Float(f)) => Ok(Expr::Constant(Constant::Float(-f))),
                other => Ok(Expr::call("negate", vec![other])),
            },
            other => unsupported(format!("unary operator {}", other)),
        },

        sql::Expr::IsNull(inner) => Ok(Expr::call("isNull", vec![lower_expr(inner)?])),
        sql::Expr::IsNotNull(inner) => Ok(Expr::call("isNotNull", vec![lower_expr(inner)?])),

        sql::Expr::Like { negated, expr: inner, pattern, escape_char, .. } => {
            if escape_char.is_some() {
                return unsupported("LIKE ... ESCAPE");
            }
            let name = if *negated { "notLike" } else { "like" };
            Ok(Expr::call(name, vec![lower_expr(inner)?, lower_expr(pattern)?]))
        }

        sql::Expr::ILike { negated, expr: inner, pattern, escape_char, .. } => {
            if escape_char.is_some() {
                return unsupported("ILIKE ... ESCAPE");
            }
            let name = if *negated { "notILike" } else { "ilike" };
            Ok(Expr::call(name, vec![lower_expr(inner)?, lower_expr(pattern)?]))
        }

        sql::Expr::Function(func) => lower_function(func),

        other => unsupported(format!("expression {}", other)),
    }
}

fn lower_function(func: &sql::Function) -> Lowered<Expr> {
    if func.over.is_some() {
        return unsupported("window functions");
    }
    if func.filter.is_some() {
        return unsupported("aggregate FILTER");
    }

    let name = object_name(&func.name);
    let mut args = Vec::new();
    let mut distinct = false;

    match &func.args {
        FunctionArguments::None => {}
        FunctionArguments::Subquery(_) => return unsupported("subquery function arguments"),
        FunctionArguments::List(list) => {
            distinct = matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct));

            for arg in &list.args {
                match arg {
                    FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => args.push(lower_expr(expr)?),
                    // count(*) counts rows, which the backend spells count()
                    FunctionArg::Unnamed(FunctionArgExpr::Wildcard) if name.eq_ignore_ascii_case("count") => {}
                    other => return unsupported(format!("function argument {}", other)),
                }
            }
        }
    }

    Ok(Expr::Call(crate::ast::Call { name, args, distinct }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Select {
        SqlParser::new().parse_select(sql).unwrap()
    }

    #[test]
    fn parse_simple_select() {
        let select = parse("SELECT High, Low FROM aapl_stock AS a LIMIT 10");

        assert_eq!(
            select.columns,
            vec![Expr::field(["High"]), Expr::field(["Low"])]
        );
        assert_eq!(
            select.from,
            Some(FromItem::Table(TableRef::new("aapl_stock").with_alias("a")))
        );
        assert_eq!(select.limit, Some(Expr::int(10)));
    }

    #[test]
    fn comparison_becomes_equals_call() {
        let select = parse(
            "SELECT aapl_stock.High FROM aapl_stock JOIN aapl_stock_2 ON aapl_stock.High = aapl_stock_2.High",
        );

        match select.from {
            Some(FromItem::Join(join)) => {
                assert_eq!(join.kind, JoinKind::Inner);
                assert_eq!(
                    join.on,
                    Some(Expr::call(
                        "equals",
                        vec![
                            Expr::field(["aapl_stock", "High"]),
                            Expr::field(["aapl_stock_2", "High"]),
                        ]
                    ))
                );
            }
            other => panic!("expected join, got {:?}", other),
        }
    }

    #[test]
    fn and_chains_flatten() {
        let select = parse("SELECT a FROM t WHERE a = 1 AND (b > 2 AND c < 3)");

        assert_eq!(
            select.where_clause,
            Some(Expr::call(
                "and",
                vec![
                    Expr::call("equals", vec![Expr::field(["a"]), Expr::int(1)]),
                    Expr::call("greater", vec![Expr::field(["b"]), Expr::int(2)]),
                    Expr::call("less", vec![Expr::field(["c"]), Expr::int(3)]),
                ]
            ))
        );
    }

    #[test]
    fn literals_and_unary_ops() {
        let select = parse("SELECT -5, 1.5, 'x', NULL, true, NOT flag FROM t");

        assert_eq!(
            select.columns,
            vec![
                Expr::int(-5),
                Expr::Constant(Constant::Float(1.5)),
                Expr::string("x"),
                Expr::Constant(Constant::Null),
                Expr::Constant(Constant::Bool(true)),
                Expr::call("not", vec![Expr::field(["flag"])]),
            ]
        );
    }

    #[test]
    fn order_by_and_offset() {
        let select = parse("SELECT a FROM t ORDER BY a DESC, b LIMIT 5 OFFSET 10");

        assert_eq!(select.order_by.len(), 2);
        assert!(select.order_by[0].descending);
        assert!(!select.order_by[1].descending);
        assert_eq!(select.offset, Some(Expr::int(10)));
    }

    #[test]
    fn count_star_and_distinct() {
        let select = parse("SELECT count(*), count(DISTINCT a) FROM t");

        assert_eq!(select.columns[0], Expr::call("count", vec![]));
        match &select.columns[1] {
            Expr::Call(call) => assert!(call.distinct),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn qualified_wildcard() {
        let select = parse("SELECT a.* FROM t AS a");
        match &select.columns[..] {
            [Expr::Asterisk { qualifier, location }] => {
                assert_eq!(qualifier.as_deref(), Some("a"));
                assert_eq!(*location, Some(Location::new(1, 8)));
            }
            other => panic!("expected qualified wildcard, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_constructs_rejected() {
        let parser = SqlParser::new();

        for sql in [
            "SELECT a FROM (SELECT a FROM t) AS s",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "SELECT a FROM t UNION ALL SELECT a FROM u",
            "SELECT a FROM t JOIN u USING (a)",
        ] {
            let err = parser.parse_select(sql).unwrap_err();
            assert!(err.is_unsupported_syntax(), "{} should be unsupported", sql);
            assert_eq!(err.to_diagnostic().code, DiagnosticCode::UnsupportedConstruct);
        }
    }

    #[test]
    fn identifiers_carry_locations() {
        let select = parse("SELECT Hgh\nFROM aapl_stock AS a");

        match &select.columns[0] {
            Expr::Field(field) => assert_eq!(field.location, Some(Location::new(1, 8))),
            other => panic!("expected field, got {:?}", other),
        }
        match &select.from {
            Some(FromItem::Table(table)) => assert_eq!(table.location, Some(Location::new(2, 6))),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn backslash_escapes_in_clickhouse_strings() {
        let select = SqlParser::clickhouse()
            .parse_select(r"SELECT event FROM events WHERE event = 'it\'s'")
            .unwrap();

        assert_eq!(
            select.where_clause,
            Some(Expr::call("equals", vec![Expr::field(["event"]), Expr::string("it's")]))
        );
    }

    #[test]
    fn parse_invalid_sql() {
        let err = SqlParser::new().parse_select("SELECT FROM WHERE").unwrap_err();
        assert!(!err.is_unsupported_syntax());
        assert_eq!(err.code(), DiagnosticCode::ParseError);
    }

    #[test]
    fn multiple_statements_rejected() {
        let err = SqlParser::new().parse_select("SELECT 1; SELECT 2").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::StatementCount(2)));
    }

    #[test]
    fn different_dialects() {
        let sql = "SELECT event FROM events";

        assert!(SqlParser::new().parse_select(sql).is_ok());
        assert!(SqlParser::clickhouse().parse_select(sql).is_ok());
    }
}
