// fact -> fact_refresh_log: synthesize an approximate refresh history.
//
// The real history was never recorded. We assume the creator refreshed the fact once per day
// from creation until last_seen_timestamp, and also made the last refresh. Entries written
// here are low fidelity by construction.

use super::{RuleOutcome, SkipDecision, TransformRule};
use crate::error::{BackfillError, Result};
use crate::models::{DerivedWrite, Key, SourceRow, tables};

pub const DAY_MS: i64 = 86_400_000;

/// Upper bound on synthesized entries for one fact (about a century of daily refreshes).
/// A longer span means a corrupt `last_seen_timestamp`, e.g. one stored in microseconds.
pub const MAX_REFRESH_ENTRIES: i64 = 36_525;

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshLogBackfillRule;

impl RefreshLogBackfillRule {
    /// Refresh timestamps `timestamp, timestamp + 1d, ...` up to and including `last_seen`.
    /// Empty when `last_seen < timestamp`.
    pub fn refresh_timestamps(timestamp: i64, last_seen: i64) -> impl Iterator<Item = i64> {
        std::iter::successors(Some(timestamp), |current| current.checked_add(DAY_MS))
            .take_while(move |current| *current <= last_seen)
    }
}

impl TransformRule for RefreshLogBackfillRule {
    fn name(&self) -> &'static str {
        "refresh-log"
    }

    fn source_table(&self) -> &'static str {
        tables::FACT
    }

    fn columns(&self) -> &'static [&'static str] {
        &[
            "id",
            "timestamp",
            "last_seen_timestamp",
            "added_by_id",
            "last_seen_by_id",
        ]
    }

    fn time_column(&self) -> Option<&'static str> {
        Some("timestamp")
    }

    fn skip_decision(&self, row: &SourceRow) -> SkipDecision {
        // A set last_seen_by_id means an earlier pass already handled this fact.
        if row.optional("last_seen_by_id").is_some() {
            SkipDecision::Skip {
                reason: "refresh history already populated",
            }
        } else {
            SkipDecision::Process
        }
    }

    fn apply(&self, row: &SourceRow) -> Result<RuleOutcome> {
        if let SkipDecision::Skip { reason } = self.skip_decision(row) {
            return Ok(RuleOutcome::skip(reason));
        }

        let id = row.required("id")?.clone();
        let timestamp = row.required_i64("timestamp")?;
        let last_seen = row.required_i64("last_seen_timestamp")?;
        let added_by = row.required("added_by_id")?.clone();

        let span_days = last_seen.saturating_sub(timestamp) / DAY_MS;
        if span_days >= MAX_REFRESH_ENTRIES {
            return Err(BackfillError::malformed(
                row.table(),
                "last_seen_timestamp",
                format!("spans {} days after timestamp", span_days),
            ));
        }

        let mut writes = vec![DerivedWrite::update(
            tables::FACT,
            Key::new("id", id.clone()),
            [("last_seen_by_id", added_by.clone())],
        )];
        writes.extend(
            Self::refresh_timestamps(timestamp, last_seen).map(|refreshed| {
                DerivedWrite::insert(
                    tables::FACT_REFRESH_LOG,
                    [
                        ("fact_id", id.clone()),
                        ("refreshed_timestamp", refreshed.into()),
                        ("refreshed_by_id", added_by.clone()),
                    ],
                )
            }),
        );

        Ok(RuleOutcome::process(writes))
    }
}
