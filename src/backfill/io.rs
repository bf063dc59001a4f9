// Seams between the driver and the store: a forward-only row source and a write sink.

use crate::error::Result;
use crate::models::{DerivedWrite, SourceRow, WriteOp};
use futures_util::stream::BoxStream;
use std::future::Future;

/// Full-table reader. Each call starts a new scan from the beginning; rows arrive in
/// whatever order the store returns them. A failed read ends the stream with
/// `SourceUnavailable`.
pub trait RowSource {
    fn scan<'a>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> BoxStream<'a, Result<SourceRow>>;
}

/// Applies one derived write. Implementations must make every write kind idempotent:
/// inserts upsert on the natural key, updates overwrite, set-adds ignore existing members.
pub trait WriteSink {
    fn apply(&self, write: &DerivedWrite) -> impl Future<Output = Result<()>> + Send;
}

/// Sink that only logs what would be written.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSink;

impl WriteSink for DryRunSink {
    async fn apply(&self, write: &DerivedWrite) -> Result<()> {
        match &write.op {
            WriteOp::Insert { values } => {
                tracing::debug!(table = %write.table, ?values, "dry run: insert");
            }
            WriteOp::Update { key, values } => {
                tracing::debug!(table = %write.table, key = %key.value, ?values, "dry run: update");
            }
            WriteOp::AddToSet {
                key,
                column,
                member,
            } => {
                tracing::debug!(table = %write.table, key = %key.value, column = %column, member, "dry run: add to set");
            }
        }
        Ok(())
    }
}
