// Transform rules: pure per-row functions from one source row to derived writes.
// No I/O happens here; the driver hands the writes to a sink.

mod flag_aggregation;
mod hour_bucket;
mod refresh_log;

pub use flag_aggregation::FlagAggregationRule;
pub use hour_bucket::HourBucketRule;
pub use refresh_log::{DAY_MS, MAX_REFRESH_ENTRIES, RefreshLogBackfillRule};

use crate::error::Result;
use crate::models::{DerivedWrite, SourceRow};

/// Whether a row should be written back, evaluated before transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDecision {
    Process,
    Skip { reason: &'static str },
}

impl SkipDecision {
    pub fn is_skip(&self) -> bool {
        matches!(self, SkipDecision::Skip { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub skip: SkipDecision,
    /// Applied in order. Always empty when `skip` is `Skip`.
    pub writes: Vec<DerivedWrite>,
}

impl RuleOutcome {
    pub fn skip(reason: &'static str) -> Self {
        Self {
            skip: SkipDecision::Skip { reason },
            writes: Vec::new(),
        }
    }

    pub fn process(writes: Vec<DerivedWrite>) -> Self {
        Self {
            skip: SkipDecision::Process,
            writes,
        }
    }
}

pub trait TransformRule {
    /// Short name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Table this rule scans.
    fn source_table(&self) -> &'static str;

    /// Columns the rule reads from each row.
    fn columns(&self) -> &'static [&'static str];

    /// Millisecond timestamp column a time window applies to, if any.
    fn time_column(&self) -> Option<&'static str> {
        None
    }

    /// Guard checked before any field the rule needs is read, and before the time window.
    /// `apply` repeats it, so calling `apply` alone is enough.
    fn skip_decision(&self, _row: &SourceRow) -> SkipDecision {
        SkipDecision::Process
    }

    /// A `MalformedRow` error means the row lacks something the rule needs.
    fn apply(&self, row: &SourceRow) -> Result<RuleOutcome>;
}
