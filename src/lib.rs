// Library for the backfill binary and tests

pub mod backfill;
pub mod config;
pub mod error;
pub mod fact_repo;
pub mod models;
pub mod rules;
pub mod version;
