// fact_acl / fact_comment -> fact.flags: mark facts that have ACL entries or comments.

use super::{RuleOutcome, TransformRule};
use crate::error::Result;
use crate::models::{DerivedWrite, FactFlag, Key, SourceRow, tables};

/// One pass per membership table. Each referenced fact gets `flag` added to its flags set,
/// so a fact listed many times (or a second run) leaves the set unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FlagAggregationRule {
    source_table: &'static str,
    flag: FactFlag,
}

impl FlagAggregationRule {
    pub fn acl() -> Self {
        Self {
            source_table: tables::FACT_ACL,
            flag: FactFlag::HasAcl,
        }
    }

    pub fn comments() -> Self {
        Self {
            source_table: tables::FACT_COMMENT,
            flag: FactFlag::HasComments,
        }
    }

    pub fn flag(&self) -> FactFlag {
        self.flag
    }
}

impl TransformRule for FlagAggregationRule {
    fn name(&self) -> &'static str {
        match self.flag {
            FactFlag::HasAcl => "flags-acl",
            FactFlag::HasComments => "flags-comments",
        }
    }

    fn source_table(&self) -> &'static str {
        self.source_table
    }

    fn columns(&self) -> &'static [&'static str] {
        &["fact_id"]
    }

    fn apply(&self, row: &SourceRow) -> Result<RuleOutcome> {
        let fact_id = row.required("fact_id")?.clone();
        Ok(RuleOutcome::process(vec![DerivedWrite::add_to_set(
            tables::FACT,
            Key::new("id", fact_id),
            tables::FACT_FLAGS,
            self.flag.member(),
        )]))
    }
}
