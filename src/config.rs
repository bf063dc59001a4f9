use crate::backfill::{DEFAULT_REPORT_INTERVAL, DriverConfig, MalformedPolicy, TimeWindow};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite file holding the fact tables.
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
    /// Rows fetched per scan page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_max_pool_size() -> u32 {
    4
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_page_size() -> u32 {
    5_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// Log a progress line every this many fetched rows.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
    /// Log writes instead of applying them.
    #[serde(default)]
    pub dry_run: bool,
    /// Only rows whose timestamp falls in [start, end) are migrated (RFC 3339, UTC).
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

fn default_report_interval() -> u64 {
    DEFAULT_REPORT_INTERVAL
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            report_interval: default_report_interval(),
            on_malformed: MalformedPolicy::default(),
            dry_run: false,
            start: None,
            end: None,
        }
    }
}

impl BackfillConfig {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            report_interval: self.report_interval,
            on_malformed: self.on_malformed,
            window: TimeWindow {
                start: self.start.map(|t| t.timestamp_millis()),
                end: self.end.map(|t| t.timestamp_millis()),
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.store.path.is_empty(), "store.path must be non-empty");
        anyhow::ensure!(
            self.store.max_pool_size > 0,
            "store.max_pool_size must be > 0, got {}",
            self.store.max_pool_size
        );
        anyhow::ensure!(
            self.store.page_size > 0,
            "store.page_size must be > 0, got {}",
            self.store.page_size
        );
        anyhow::ensure!(
            self.backfill.report_interval > 0,
            "backfill.report_interval must be > 0, got {}",
            self.backfill.report_interval
        );
        if let (Some(start), Some(end)) = (self.backfill.start, self.backfill.end) {
            anyhow::ensure!(
                end >= start,
                "backfill.end ({}) cannot be before backfill.start ({})",
                end,
                start
            );
        }
        Ok(())
    }
}
