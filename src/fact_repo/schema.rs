// Persisted fact layout. Only created when missing; existing tables are left untouched.
//
// Set-typed columns are stored as membership tables named `<table>_<column>` with the owning
// row's key column plus `member`. The primary key makes adding an existing member a no-op.

use crate::models::tables;
use sqlx::SqlitePool;

/// Column holding the element value in a membership table.
pub const SET_MEMBER_COLUMN: &str = "member";

pub fn set_table_name(table: &str, column: &str) -> String {
    format!("{}_{}", table, column)
}

pub async fn init_fact_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fact (
            id TEXT PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            last_seen_timestamp INTEGER NOT NULL,
            added_by_id TEXT,
            last_seen_by_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id TEXT NOT NULL,
            {} INTEGER NOT NULL,
            PRIMARY KEY (id, {})
        )",
        set_table_name(tables::FACT, tables::FACT_FLAGS),
        SET_MEMBER_COLUMN,
        SET_MEMBER_COLUMN,
    ))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fact_by_timestamp (
            hour_of_day INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            fact_id TEXT NOT NULL,
            PRIMARY KEY (hour_of_day, timestamp, fact_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fact_acl (
            fact_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            PRIMARY KEY (fact_id, subject_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fact_comment (
            fact_id TEXT NOT NULL,
            comment_id TEXT NOT NULL,
            timestamp INTEGER,
            comment TEXT,
            PRIMARY KEY (fact_id, comment_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fact_refresh_log (
            fact_id TEXT NOT NULL,
            refreshed_timestamp INTEGER NOT NULL,
            refreshed_by_id TEXT,
            PRIMARY KEY (fact_id, refreshed_timestamp)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
