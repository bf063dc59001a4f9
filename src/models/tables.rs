// Table and column names of the persisted fact layout.

pub const FACT: &str = "fact";
pub const FACT_BY_TIMESTAMP: &str = "fact_by_timestamp";
pub const FACT_ACL: &str = "fact_acl";
pub const FACT_COMMENT: &str = "fact_comment";
pub const FACT_REFRESH_LOG: &str = "fact_refresh_log";

/// Set-typed column of `fact`.
pub const FACT_FLAGS: &str = "flags";
