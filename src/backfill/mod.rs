// Run-once backfill jobs. A job is one or more passes; each pass is a full scan of one
// table through one rule. Jobs are safe to re-run: every write they produce is idempotent.

mod driver;
mod io;

pub use driver::{
    BackfillDriver, DEFAULT_REPORT_INTERVAL, DriverConfig, MalformedPolicy, ProgressCounters,
    RunAborted, RunReport, RunState, TimeWindow,
};
pub use io::{DryRunSink, RowSource, WriteSink};

use crate::rules::{FlagAggregationRule, HourBucketRule, RefreshLogBackfillRule, TransformRule};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Populate fact_by_timestamp from fact.
    HourBucket,
    /// Set HasAcl / HasComments in fact.flags from fact_acl and fact_comment.
    Flags,
    /// Synthesize fact_refresh_log and fact.last_seen_by_id.
    RefreshLog,
}

impl Migration {
    pub const ALL: [Migration; 3] = [
        Migration::HourBucket,
        Migration::Flags,
        Migration::RefreshLog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Migration::HourBucket => "hour-bucket",
            Migration::Flags => "flags",
            Migration::RefreshLog => "refresh-log",
        }
    }

    /// Passes in execution order.
    pub fn rules(self) -> Vec<Box<dyn TransformRule>> {
        match self {
            Migration::HourBucket => vec![Box::new(HourBucketRule)],
            Migration::Flags => vec![
                Box::new(FlagAggregationRule::acl()),
                Box::new(FlagAggregationRule::comments()),
            ],
            Migration::RefreshLog => vec![Box::new(RefreshLogBackfillRule)],
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown migration '{0}' (expected one of: hour-bucket, flags, refresh-log)")]
pub struct UnknownMigration(pub String);

impl FromStr for Migration {
    type Err = UnknownMigration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Migration::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMigration(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub migration: &'static str,
    pub passes: Vec<RunReport>,
    pub totals: ProgressCounters,
}

/// Runs every pass of `migration` in order, stopping at the first aborted pass.
pub async fn run_migration<S, W>(
    migration: Migration,
    source: &S,
    sink: &W,
    config: DriverConfig,
) -> Result<MigrationReport, RunAborted>
where
    S: RowSource + ?Sized,
    W: WriteSink,
{
    let mut driver = BackfillDriver::new(config);
    let mut passes = Vec::new();
    let mut totals = ProgressCounters::default();

    for rule in migration.rules() {
        let report = driver.run(rule.as_ref(), source, sink).await?;
        totals.add(&report.counters);
        passes.push(report);
    }

    info!(
        migration = migration.name(),
        passes = passes.len(),
        fetched = totals.fetched,
        skipped = totals.skipped,
        inserted = totals.inserted,
        updated = totals.updated,
        malformed = totals.malformed,
        "migration complete"
    );
    Ok(MigrationReport {
        migration: migration.name(),
        passes,
        totals,
    })
}
