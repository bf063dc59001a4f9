// Shared test helpers: row builders and an in-memory store double.
#![allow(dead_code)]

use fact_backfill::backfill::{RowSource, WriteSink};
use fact_backfill::config::StoreConfig;
use fact_backfill::error::{BackfillError, Result};
use fact_backfill::models::{DerivedWrite, SourceRow, Value, tables};
use futures_util::TryStreamExt;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn fact_row(
    id: impl Into<Value>,
    timestamp: i64,
    last_seen_timestamp: i64,
    added_by_id: Option<&str>,
    last_seen_by_id: Option<&str>,
) -> SourceRow {
    SourceRow::from_pairs(
        tables::FACT,
        [
            ("id", id.into()),
            ("timestamp", timestamp.into()),
            ("last_seen_timestamp", last_seen_timestamp.into()),
            ("added_by_id", added_by_id.into()),
            ("last_seen_by_id", last_seen_by_id.into()),
        ],
    )
}

pub fn fact_id_row(table: &str, fact_id: impl Into<Value>) -> SourceRow {
    SourceRow::from_pairs(table, [("fact_id", fact_id.into())])
}

pub fn store_config(path: &std::path::Path, page_size: u32) -> StoreConfig {
    StoreConfig {
        path: path.to_str().unwrap().to_string(),
        max_pool_size: 2,
        busy_timeout_secs: 5,
        page_size,
    }
}

/// All rows of `table`, sorted, for comparing store contents.
pub async fn dump<S: RowSource>(source: &S, table: &str, columns: &[&str]) -> Vec<SourceRow> {
    let mut rows: Vec<SourceRow> = source
        .scan(table, columns)
        .try_collect()
        .await
        .expect("scan");
    rows.sort_by(|a, b| a.columns().cmp(b.columns()));
    rows
}

/// Rows by table for scanning, plus a log of applied writes. Failures can be injected
/// at the n-th write (0-based) or after n scanned rows.
#[derive(Default)]
pub struct MemoryStore {
    rows: BTreeMap<String, Vec<SourceRow>>,
    applied: Mutex<Vec<DerivedWrite>>,
    fail_write_at: Option<usize>,
    fail_scan_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<SourceRow>) -> Self {
        self.rows.entry(table.to_string()).or_default().extend(rows);
        self
    }

    pub fn failing_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    pub fn failing_scan_after(mut self, n: usize) -> Self {
        self.fail_scan_after = Some(n);
        self
    }

    pub fn applied(&self) -> Vec<DerivedWrite> {
        self.applied.lock().unwrap().clone()
    }
}

impl RowSource for MemoryStore {
    fn scan<'a>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> BoxStream<'a, Result<SourceRow>> {
        let mut items: Vec<Result<SourceRow>> = self
            .rows
            .get(table)
            .into_iter()
            .flatten()
            .map(|row| {
                let projected = row
                    .columns()
                    .iter()
                    .filter(|(k, _)| columns.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()));
                Ok(SourceRow::from_pairs(table, projected))
            })
            .collect();
        if let Some(n) = self.fail_scan_after {
            items.truncate(n);
            items.push(Err(BackfillError::source_unavailable(
                table,
                "connection reset",
            )));
        }
        stream::iter(items).boxed()
    }
}

impl WriteSink for MemoryStore {
    async fn apply(&self, write: &DerivedWrite) -> Result<()> {
        let mut applied = self.applied.lock().unwrap();
        if self.fail_write_at == Some(applied.len()) {
            return Err(BackfillError::write_failed(&write.table, "timeout"));
        }
        applied.push(write.clone());
        Ok(())
    }
}
