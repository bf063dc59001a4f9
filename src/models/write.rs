// Derived writes: self-contained write-back operations produced by rules.

use super::Value;
use std::collections::BTreeMap;

/// Key predicate scoping an update to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub column: String,
    pub value: Value,
}

impl Key {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Upsert keyed by the table's natural key; re-applying overwrites.
    Insert { values: BTreeMap<String, Value> },
    /// Unconditional overwrite of `values` on the row matching `key`.
    Update {
        key: Key,
        values: BTreeMap<String, Value>,
    },
    /// Add `member` to the set-typed `column` of the row matching `key`.
    AddToSet {
        key: Key,
        column: String,
        member: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedWrite {
    pub table: String,
    pub op: WriteOp,
}

impl DerivedWrite {
    pub fn insert<I, K>(table: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            table: table.into(),
            op: WriteOp::Insert {
                values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            },
        }
    }

    pub fn update<I, K>(table: impl Into<String>, key: Key, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            table: table.into(),
            op: WriteOp::Update {
                key,
                values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            },
        }
    }

    pub fn add_to_set(
        table: impl Into<String>,
        key: Key,
        column: impl Into<String>,
        member: i64,
    ) -> Self {
        Self {
            table: table.into(),
            op: WriteOp::AddToSet {
                key,
                column: column.into(),
                member,
            },
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self.op, WriteOp::Insert { .. })
    }
}
