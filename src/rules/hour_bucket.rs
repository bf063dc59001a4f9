// fact -> fact_by_timestamp: index every fact under the UTC hour it was created in.

use super::{RuleOutcome, TransformRule};
use crate::error::Result;
use crate::models::{DerivedWrite, SourceRow, tables};

const MS_PER_HOUR: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct HourBucketRule;

impl HourBucketRule {
    /// Start of the UTC hour containing `timestamp_ms`, in epoch milliseconds.
    /// Epoch hours are UTC hours, so integer flooring needs no calendar.
    pub fn hour_of_day(timestamp_ms: i64) -> i64 {
        timestamp_ms - timestamp_ms.rem_euclid(MS_PER_HOUR)
    }
}

impl TransformRule for HourBucketRule {
    fn name(&self) -> &'static str {
        "hour-bucket"
    }

    fn source_table(&self) -> &'static str {
        tables::FACT
    }

    fn columns(&self) -> &'static [&'static str] {
        &["id", "timestamp"]
    }

    fn time_column(&self) -> Option<&'static str> {
        Some("timestamp")
    }

    fn apply(&self, row: &SourceRow) -> Result<RuleOutcome> {
        let id = row.required("id")?.clone();
        let timestamp = row.required_i64("timestamp")?;

        Ok(RuleOutcome::process(vec![DerivedWrite::insert(
            tables::FACT_BY_TIMESTAMP,
            [
                ("hour_of_day", Self::hour_of_day(timestamp).into()),
                ("timestamp", timestamp.into()),
                ("fact_id", id),
            ],
        )]))
    }
}
