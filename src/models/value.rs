// Column values and source rows

use crate::error::{BackfillError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single cell as read from or written to the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One scanned record: column name -> value. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    table: String,
    columns: BTreeMap<String, Value>,
}

impl SourceRow {
    pub fn new(table: impl Into<String>, columns: BTreeMap<String, Value>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Builder used by stores and tests: `SourceRow::from_pairs("fact", [("id", 7.into())])`.
    pub fn from_pairs<I, K>(table: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(
            table,
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &BTreeMap<String, Value> {
        &self.columns
    }

    /// Value of `column`, or `None` when missing or null.
    pub fn optional(&self, column: &str) -> Option<&Value> {
        self.columns.get(column).filter(|v| !v.is_null())
    }

    /// Non-null value of `column`; missing and null are both malformed.
    pub fn required(&self, column: &str) -> Result<&Value> {
        match self.columns.get(column) {
            None => Err(BackfillError::malformed(&self.table, column, "is missing")),
            Some(Value::Null) => Err(BackfillError::malformed(&self.table, column, "is null")),
            Some(v) => Ok(v),
        }
    }

    pub fn required_i64(&self, column: &str) -> Result<i64> {
        let value = self.required(column)?;
        value.as_i64().ok_or_else(|| {
            BackfillError::malformed(
                &self.table,
                column,
                format!("is not an integer (got '{}')", value),
            )
        })
    }
}
