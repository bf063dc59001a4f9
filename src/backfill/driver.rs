// Backfill driver: scan -> rule -> sink, one row and one write at a time.
// Counters are owned by the driver for the duration of a run and never steer control flow.

use super::io::{RowSource, WriteSink};
use crate::error::BackfillError;
use crate::models::SourceRow;
use crate::rules::{RuleOutcome, SkipDecision, TransformRule};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

pub const DEFAULT_REPORT_INTERVAL: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

/// What to do with a row the rule cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Count it, log it, continue with the next row.
    #[default]
    Skip,
    /// End the run with `MalformedRow`.
    Abort,
}

/// Half-open `[start, end)` window in epoch milliseconds; unbounded sides are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeWindow {
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start.is_none_or(|s| timestamp_ms >= s) && self.end.is_none_or(|e| timestamp_ms < e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Emit a progress snapshot every this many fetched rows.
    pub report_interval: u64,
    pub on_malformed: MalformedPolicy,
    pub window: TimeWindow,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            report_interval: DEFAULT_REPORT_INTERVAL,
            on_malformed: MalformedPolicy::Skip,
            window: TimeWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounters {
    pub fetched: u64,
    pub skipped: u64,
    pub inserted: u64,
    pub updated: u64,
    pub malformed: u64,
}

impl ProgressCounters {
    pub fn add(&mut self, other: &ProgressCounters) {
        self.fetched += other.fetched;
        self.skipped += other.skipped;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.malformed += other.malformed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rule: &'static str,
    pub source_table: &'static str,
    pub state: RunState,
    pub counters: ProgressCounters,
    /// Progress snapshots logged during the run.
    pub progress_reports: u64,
}

/// A run that stopped early. Writes applied before the failure stay applied.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{rule} aborted after {} fetched rows: {error}", .counters.fetched)]
pub struct RunAborted {
    pub rule: &'static str,
    pub counters: ProgressCounters,
    #[source]
    pub error: BackfillError,
}

pub struct BackfillDriver {
    config: DriverConfig,
    state: RunState,
    counters: ProgressCounters,
    progress_reports: u64,
}

impl BackfillDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            state: RunState::NotStarted,
            counters: ProgressCounters::default(),
            progress_reports: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn counters(&self) -> ProgressCounters {
        self.counters
    }

    /// Runs `rule` over every row `source` yields for the rule's table.
    /// Counters are reset at the start of each run.
    pub async fn run<S, W>(
        &mut self,
        rule: &dyn TransformRule,
        source: &S,
        sink: &W,
    ) -> Result<RunReport, RunAborted>
    where
        S: RowSource + ?Sized,
        W: WriteSink,
    {
        self.counters = ProgressCounters::default();
        self.progress_reports = 0;
        self.transition(rule, RunState::Running);
        info!(
            rule = rule.name(),
            table = rule.source_table(),
            report_interval = self.config.report_interval,
            "backfill started"
        );

        let mut rows = source.scan(rule.source_table(), rule.columns());
        while let Some(next) = rows.next().await {
            let result = match next {
                // A row the source could not decode was still fetched; the policy decides.
                Err(e) if e.is_malformed_row() => {
                    self.counters.fetched += 1;
                    self.on_malformed(rule, rule.source_table(), "?", e)
                }
                Err(e) => return Err(self.abort(rule, e)),
                Ok(row) => {
                    self.counters.fetched += 1;
                    self.step(rule, &row, sink).await
                }
            };
            if let Err(e) = result {
                return Err(self.abort(rule, e));
            }

            if self.config.report_interval > 0
                && self.counters.fetched % self.config.report_interval == 0
            {
                self.report_progress(rule);
            }
        }

        self.transition(rule, RunState::Completed);
        let c = self.counters;
        info!(
            rule = rule.name(),
            fetched = c.fetched,
            skipped = c.skipped,
            inserted = c.inserted,
            updated = c.updated,
            malformed = c.malformed,
            "backfill completed"
        );
        Ok(RunReport {
            rule: rule.name(),
            source_table: rule.source_table(),
            state: self.state,
            counters: c,
            progress_reports: self.progress_reports,
        })
    }

    async fn step<W>(
        &mut self,
        rule: &dyn TransformRule,
        row: &SourceRow,
        sink: &W,
    ) -> Result<(), BackfillError>
    where
        W: WriteSink,
    {
        let outcome = match self.evaluate(rule, row) {
            Ok(outcome) => outcome,
            Err(e) if e.is_malformed_row() => {
                return self.on_malformed(rule, row.table(), &row_label(row), e);
            }
            Err(e) => return Err(e),
        };

        if let SkipDecision::Skip { reason } = outcome.skip {
            self.counters.skipped += 1;
            trace!(rule = rule.name(), reason, "row skipped");
            return Ok(());
        }

        for write in &outcome.writes {
            sink.apply(write).await?;
            if write.is_insert() {
                self.counters.inserted += 1;
            } else {
                self.counters.updated += 1;
            }
        }
        Ok(())
    }

    /// Counts and logs a malformed row under `Skip`; hands the error back under `Abort`.
    fn on_malformed(
        &mut self,
        rule: &dyn TransformRule,
        table: &str,
        id: &str,
        error: BackfillError,
    ) -> Result<(), BackfillError> {
        if self.config.on_malformed == MalformedPolicy::Abort {
            return Err(error);
        }
        self.counters.malformed += 1;
        warn!(rule = rule.name(), table, id, error = %error, "skipping malformed row");
        Ok(())
    }

    /// The rule's own guard first, then the time window, then the rule itself.
    fn evaluate(
        &self,
        rule: &dyn TransformRule,
        row: &SourceRow,
    ) -> Result<RuleOutcome, BackfillError> {
        if let SkipDecision::Skip { reason } = rule.skip_decision(row) {
            return Ok(RuleOutcome::skip(reason));
        }
        if let Some(column) = rule.time_column()
            && !self.config.window.is_unbounded()
            && !self.config.window.contains(row.required_i64(column)?)
        {
            return Ok(RuleOutcome::skip("outside time window"));
        }
        rule.apply(row)
    }

    fn abort(&mut self, rule: &dyn TransformRule, error: BackfillError) -> RunAborted {
        self.transition(rule, RunState::Aborted);
        let c = self.counters;
        warn!(
            rule = rule.name(),
            fetched = c.fetched,
            skipped = c.skipped,
            inserted = c.inserted,
            updated = c.updated,
            malformed = c.malformed,
            error = %error,
            "backfill aborted"
        );
        RunAborted {
            rule: rule.name(),
            counters: c,
            error,
        }
    }

    fn report_progress(&mut self, rule: &dyn TransformRule) {
        self.progress_reports += 1;
        let c = self.counters;
        info!(
            rule = rule.name(),
            fetched = c.fetched,
            skipped = c.skipped,
            inserted = c.inserted,
            updated = c.updated,
            malformed = c.malformed,
            "backfill progress"
        );
    }

    fn transition(&mut self, rule: &dyn TransformRule, next: RunState) {
        debug!(rule = rule.name(), from = ?self.state, to = ?next, "driver state");
        self.state = next;
    }
}

/// Best-effort identifier of a row for log lines.
fn row_label(row: &SourceRow) -> String {
    row.optional("id")
        .or_else(|| row.optional("fact_id"))
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".to_string())
}
