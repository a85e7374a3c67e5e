//! Literal-values pseudo-tables.
//!
//! Backends without a table-value constructor get a `union all` of
//! single-row selects; the rest use an ANSI `values` list. Values are rendered
//! as literals of their column type and never pasted in raw, so non-numeric
//! text in a numeric column is rejected rather than spliced into the SQL.

use crate::dialects::base::{DialectError, InlineTableStrategy};
use crate::dialects::dialect::Dialect;
use std::str::FromStr;

/// Logical type of an inline-table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Numeric,
    Integer,
    Boolean,
    Date,
    Time,
    Timestamp,
}

impl FromStr for ColumnType {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "varchar" | "text" => Ok(ColumnType::String),
            "numeric" | "decimal" | "double" => Ok(ColumnType::Numeric),
            "integer" | "int" | "bigint" => Ok(ColumnType::Integer),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "timestamp" => Ok(ColumnType::Timestamp),
            other => Err(DialectError::InvalidInlineTable(format!(
                "unknown column type '{}'",
                other
            ))),
        }
    }
}

pub(crate) fn generate(
    dialect: &Dialect,
    strategy: InlineTableStrategy,
    column_names: &[&str],
    column_types: &[ColumnType],
    rows: &[Vec<Option<String>>],
) -> Result<String, DialectError> {
    if column_names.is_empty() {
        return Err(DialectError::InvalidInlineTable("no columns".to_string()));
    }
    if column_names.len() != column_types.len() {
        return Err(DialectError::InvalidInlineTable(format!(
            "{} column names but {} column types",
            column_names.len(),
            column_types.len()
        )));
    }
    if rows.is_empty() {
        return Err(DialectError::InvalidInlineTable("no rows".to_string()));
    }
    if let Some((index, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != column_names.len())
    {
        return Err(DialectError::InvalidInlineTable(format!(
            "row {} has {} values, expected {}",
            index,
            row.len(),
            column_names.len()
        )));
    }

    match strategy {
        InlineTableStrategy::UnionAll => union_all(dialect, column_names, column_types, rows, false, None),
        InlineTableStrategy::UnionAllCast => union_all(dialect, column_names, column_types, rows, true, None),
        InlineTableStrategy::UnionAllFromDual => {
            union_all(dialect, column_names, column_types, rows, false, Some(" from dual"))
        }
        InlineTableStrategy::Values => values(dialect, column_names, column_types, rows),
    }
}

fn union_all(
    dialect: &Dialect,
    column_names: &[&str],
    column_types: &[ColumnType],
    rows: &[Vec<Option<String>>],
    cast: bool,
    from_clause: Option<&str>,
) -> Result<String, DialectError> {
    let widths = string_widths(column_types, rows);
    let mut branches = Vec::with_capacity(rows.len());

    for row in rows {
        let mut items = Vec::with_capacity(row.len());
        for (i, value) in row.iter().enumerate() {
            let literal = literal(dialect, column_types[i], value.as_deref())?;
            let expr = if cast {
                format!("cast({} as {})", literal, sql_type(column_types[i], widths[i]))
            } else {
                literal
            };
            items.push(format!("{} as {}", expr, dialect.quote_identifier(column_names[i])));
        }
        branches.push(format!("select {}{}", items.join(", "), from_clause.unwrap_or("")));
    }

    Ok(branches.join(" union all "))
}

fn values(
    dialect: &Dialect,
    column_names: &[&str],
    column_types: &[ColumnType],
    rows: &[Vec<Option<String>>],
) -> Result<String, DialectError> {
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let literals = row
            .iter()
            .zip(column_types)
            .map(|(value, column_type)| literal(dialect, *column_type, value.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        tuples.push(format!("({})", literals.join(", ")));
    }

    let columns = column_names
        .iter()
        .map(|name| dialect.quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "select * from (values {}) as {} ({})",
        tuples.join(", "),
        dialect.quote_identifier("t"),
        columns
    ))
}

fn literal(dialect: &Dialect, column_type: ColumnType, value: Option<&str>) -> Result<String, DialectError> {
    let Some(value) = value else {
        return Ok("null".to_string());
    };
    let literals = dialect.literals();
    let temporal = |template: &str| template.replace("{value}", &dialect.quote_string_literal(value));

    match column_type {
        ColumnType::String => Ok(dialect.quote_string_literal(value)),
        ColumnType::Integer => value
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| invalid_value(value, column_type)),
        ColumnType::Numeric => {
            let trimmed = value.trim();
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(trimmed.to_string()),
                _ => Err(invalid_value(value, column_type)),
            }
        }
        ColumnType::Boolean => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(literals.true_value.clone()),
            "false" | "0" => Ok(literals.false_value.clone()),
            _ => Err(invalid_value(value, column_type)),
        },
        ColumnType::Date => Ok(temporal(&literals.date)),
        ColumnType::Time => Ok(temporal(&literals.time)),
        ColumnType::Timestamp => Ok(temporal(&literals.timestamp)),
    }
}

fn invalid_value(value: &str, column_type: ColumnType) -> DialectError {
    DialectError::InvalidInlineTable(format!("'{}' is not a valid {:?} value", value, column_type))
}

/// Longest string value per column, used to size VARCHAR casts.
fn string_widths(column_types: &[ColumnType], rows: &[Vec<Option<String>>]) -> Vec<usize> {
    column_types
        .iter()
        .enumerate()
        .map(|(i, column_type)| match column_type {
            ColumnType::String => rows
                .iter()
                .filter_map(|row| row[i].as_ref())
                .map(|value| value.chars().count())
                .max()
                .unwrap_or(0)
                .max(1),
            _ => 0,
        })
        .collect()
}

fn sql_type(column_type: ColumnType, width: usize) -> String {
    match column_type {
        ColumnType::String => format!("VARCHAR({})", width),
        ColumnType::Numeric => "DECIMAL".to_string(),
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::Time => "TIME".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
    }
}
