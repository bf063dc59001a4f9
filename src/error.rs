// Failure taxonomy for backfill runs.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackfillError {
    /// Scan could not start or was interrupted. Fatal to the run.
    #[error("source table '{table}' unavailable: {reason}")]
    SourceUnavailable { table: String, reason: String },

    /// A single derived write was rejected by the store. Fatal to the run.
    #[error("write to '{table}' failed: {reason}")]
    WriteFailed { table: String, reason: String },

    /// A row lacks a field (or has the wrong type) for the active rule.
    #[error("malformed row in '{table}': column '{column}' {reason}")]
    MalformedRow {
        table: String,
        column: String,
        reason: String,
    },

    /// Table or column name that cannot be safely interpolated into a statement.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl BackfillError {
    pub fn source_unavailable(table: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(table: &str, reason: impl ToString) -> Self {
        Self::WriteFailed {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(table: &str, column: &str, reason: impl ToString) -> Self {
        Self::MalformedRow {
            table: table.to_string(),
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_malformed_row(&self) -> bool {
        matches!(self, Self::MalformedRow { .. })
    }
}

pub type Result<T> = std::result::Result<T, BackfillError>;
