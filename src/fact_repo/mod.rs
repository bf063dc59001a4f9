// SQLite-backed fact store. Serves as both the row source (keyset-paged scans) and the
// write sink (upserts, overwrites and set-adds) for the backfill driver.

pub mod schema;
mod statement;

use crate::backfill::{RowSource, WriteSink};
use crate::config::StoreConfig;
use crate::error::{BackfillError, Result};
use crate::models::{DerivedWrite, SourceRow};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

pub struct FactRepo {
    pool: SqlitePool,
    page_size: i64,
}

impl FactRepo {
    /// Connect to SQLite at `config.path`, creating the file and parent dir if missing.
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(config.busy_timeout_secs))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            page_size: config.page_size as i64,
        })
    }

    #[instrument(skip(self), fields(repo = "fact", operation = "init"))]
    pub async fn init(&self) -> anyhow::Result<()> {
        schema::init_fact_tables(&self.pool).await
    }

    /// Up to `page_size` rows with rowid greater than `after`, and the cursor for the next page.
    /// Undecodable rows come back as `MalformedRow` items in place.
    #[instrument(
        level = "debug",
        skip(self, sql, columns),
        fields(repo = "fact", operation = "scan_page")
    )]
    async fn fetch_page(
        &self,
        sql: &str,
        table: &str,
        columns: &[&str],
        after: i64,
    ) -> Result<(Vec<Result<SourceRow>>, Option<i64>)> {
        let rows = sqlx::query(sql)
            .bind(after)
            .bind(self.page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BackfillError::source_unavailable(table, e))?;
        tracing::debug!(rows = rows.len(), "scan page");

        let mut page = Vec::with_capacity(rows.len());
        let mut last_rowid = after;
        for row in &rows {
            let (rowid, source_row) = statement::decode_row(table, columns, row)?;
            last_rowid = rowid;
            page.push(source_row);
        }
        let next = (rows.len() as i64 >= self.page_size).then_some(last_rowid);
        Ok((page, next))
    }
}

impl RowSource for FactRepo {
    fn scan<'a>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> BoxStream<'a, Result<SourceRow>> {
        let sql: Arc<str> = match statement::scan_page_sql(table, columns) {
            Ok(sql) => sql.into(),
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        // Cursor is the last rowid seen; `None` once a short page shows the table is done.
        let pages = stream::try_unfold(Some(i64::MIN), move |cursor| {
            let sql = Arc::clone(&sql);
            async move {
                let Some(after) = cursor else {
                    return Ok(None);
                };
                self.fetch_page(&sql, table, columns, after).await.map(Some)
            }
        });

        pages.map_ok(stream::iter).try_flatten().boxed()
    }
}

impl WriteSink for FactRepo {
    #[instrument(
        level = "debug",
        skip(self, write),
        fields(repo = "fact", operation = "apply", table = %write.table)
    )]
    async fn apply(&self, write: &DerivedWrite) -> Result<()> {
        let (sql, binds) = statement::write_sql(write)?;
        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = statement::bind_value(query, value);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| BackfillError::write_failed(&write.table, e))?;
        Ok(())
    }
}
