// Statement building and value (de)coding between the engine's Value and SQLite.
// Table and column names come from rules, not users, but are still checked before
// they are spliced into SQL.

use super::schema::{SET_MEMBER_COLUMN, set_table_name};
use crate::error::{BackfillError, Result};
use crate::models::{DerivedWrite, SourceRow, Value, WriteOp};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};
use std::collections::BTreeMap;

pub(super) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Alias of the rowid column in scan pages.
pub(super) const ROWID_ALIAS: &str = "__rowid";

/// Quoted identifier, or `InvalidIdentifier` unless it is `[A-Za-z_][A-Za-z0-9_]*`.
pub(super) fn ident(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(BackfillError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// One page of a keyset scan: rows with rowid > ?1, at most ?2 of them.
pub(super) fn scan_page_sql(table: &str, columns: &[&str]) -> Result<String> {
    let cols = columns
        .iter()
        .map(|c| ident(c))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    Ok(format!(
        "SELECT rowid AS {alias}, {cols} FROM {table} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2",
        alias = ROWID_ALIAS,
        cols = cols,
        table = ident(table)?,
    ))
}

/// SQL text and bind values for a write, in bind order.
pub(super) fn write_sql(write: &DerivedWrite) -> Result<(String, Vec<Value>)> {
    match &write.op {
        WriteOp::Insert { values } => {
            let (cols, binds) = split_columns(&write.table, values)?;
            let placeholders = vec!["?"; cols.len()].join(", ");
            Ok((
                format!(
                    "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
                    ident(&write.table)?,
                    cols.join(", "),
                    placeholders
                ),
                binds,
            ))
        }
        WriteOp::Update { key, values } => {
            let (cols, mut binds) = split_columns(&write.table, values)?;
            let assignments = cols
                .iter()
                .map(|c| format!("{} = ?", c))
                .collect::<Vec<_>>()
                .join(", ");
            binds.push(key.value.clone());
            Ok((
                format!(
                    "UPDATE {} SET {} WHERE {} = ?",
                    ident(&write.table)?,
                    assignments,
                    ident(&key.column)?
                ),
                binds,
            ))
        }
        WriteOp::AddToSet {
            key,
            column,
            member,
        } => Ok((
            format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
                ident(&set_table_name(&write.table, column))?,
                ident(&key.column)?,
                ident(SET_MEMBER_COLUMN)?
            ),
            vec![key.value.clone(), Value::Int(*member)],
        )),
    }
}

fn split_columns(
    table: &str,
    values: &BTreeMap<String, Value>,
) -> Result<(Vec<String>, Vec<Value>)> {
    if values.is_empty() {
        return Err(BackfillError::write_failed(table, "write has no columns"));
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut binds = Vec::with_capacity(values.len());
    for (col, value) in values {
        cols.push(ident(col)?);
        binds.push(value.clone());
    }
    Ok((cols, binds))
}

pub(super) fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<i64>),
        Value::Int(v) => query.bind(*v),
        Value::Text(s) => query.bind(s.clone()),
    }
}

/// Decode a scan row into its rowid (the page cursor) plus the SourceRow. A cell with a storage
/// type other than INTEGER or TEXT makes only that row malformed; the page goes on.
pub(super) fn decode_row(
    table: &str,
    columns: &[&str],
    row: &SqliteRow,
) -> Result<(i64, Result<SourceRow>)> {
    let unavailable = |e: sqlx::Error| BackfillError::source_unavailable(table, e);
    let rowid: i64 = row.try_get(ROWID_ALIAS).map_err(unavailable)?;

    let mut out = BTreeMap::new();
    for (i, column) in columns.iter().enumerate() {
        // Column 0 is the rowid alias.
        let idx = i + 1;
        let raw = row.try_get_raw(idx).map_err(unavailable)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" => Value::Int(row.try_get::<i64, _>(idx).map_err(unavailable)?),
                "TEXT" => Value::Text(row.try_get::<String, _>(idx).map_err(unavailable)?),
                other => {
                    let reason = format!("has unsupported storage type {}", other);
                    return Ok((rowid, Err(BackfillError::malformed(table, column, reason))));
                }
            }
        };
        out.insert(column.to_string(), value);
    }
    Ok((rowid, Ok(SourceRow::new(table, out))))
}
