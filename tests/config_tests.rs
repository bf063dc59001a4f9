// Config loading and validation tests

use fact_backfill::backfill::{DEFAULT_REPORT_INTERVAL, MalformedPolicy};
use fact_backfill::config::AppConfig;

const VALID_CONFIG: &str = r#"
[store]
path = "data/facts.db"
max_pool_size = 8
busy_timeout_secs = 10
page_size = 1000

[backfill]
report_interval = 500
on_malformed = "skip"
dry_run = false
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.store.path, "data/facts.db");
    assert_eq!(config.store.max_pool_size, 8);
    assert_eq!(config.store.busy_timeout_secs, 10);
    assert_eq!(config.store.page_size, 1000);
    assert_eq!(config.backfill.report_interval, 500);
    assert_eq!(config.backfill.on_malformed, MalformedPolicy::Skip);
    assert!(!config.backfill.dry_run);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str("[store]\npath = \"facts.db\"\n").expect("valid");
    assert_eq!(config.store.max_pool_size, 4);
    assert_eq!(config.store.busy_timeout_secs, 5);
    assert_eq!(config.store.page_size, 5_000);
    assert_eq!(config.backfill.report_interval, DEFAULT_REPORT_INTERVAL);
    assert_eq!(config.backfill.on_malformed, MalformedPolicy::Skip);
    assert!(!config.backfill.dry_run);
    assert!(config.backfill.driver_config().window.is_unbounded());
}

#[test]
fn test_config_requires_store_section() {
    let err = AppConfig::load_from_str("[backfill]\ndry_run = true\n").unwrap_err();
    assert!(err.to_string().contains("store"));
}

#[test]
fn test_config_validation_rejects_empty_store_path() {
    let bad = VALID_CONFIG.replace("path = \"data/facts.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("store.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 8", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_page_size_zero() {
    let bad = VALID_CONFIG.replace("page_size = 1000", "page_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("page_size"));
}

#[test]
fn test_config_validation_rejects_report_interval_zero() {
    let bad = VALID_CONFIG.replace("report_interval = 500", "report_interval = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("report_interval"));
}

#[test]
fn test_config_rejects_unknown_malformed_policy() {
    let bad = VALID_CONFIG.replace("on_malformed = \"skip\"", "on_malformed = \"retry\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_abort_policy_and_dry_run() {
    let config = AppConfig::load_from_str(
        &VALID_CONFIG
            .replace("on_malformed = \"skip\"", "on_malformed = \"abort\"")
            .replace("dry_run = false", "dry_run = true"),
    )
    .expect("valid");
    assert_eq!(config.backfill.on_malformed, MalformedPolicy::Abort);
    assert!(config.backfill.dry_run);
    assert_eq!(
        config.backfill.driver_config().on_malformed,
        MalformedPolicy::Abort
    );
}

#[test]
fn test_config_window_converts_to_epoch_millis() {
    let s = format!(
        "{}start = \"2020-09-13T12:26:40Z\"\nend = \"2020-09-14T00:00:00Z\"\n",
        VALID_CONFIG
    );
    let config = AppConfig::load_from_str(&s).expect("valid");
    let driver = config.backfill.driver_config();
    assert_eq!(driver.report_interval, 500);
    assert_eq!(driver.window.start, Some(1_600_000_000_000));
    assert_eq!(driver.window.end, Some(1_600_041_600_000));
    assert!(driver.window.contains(1_600_000_000_000));
    assert!(!driver.window.contains(1_600_041_600_000));
}

#[test]
fn test_config_validation_rejects_end_before_start() {
    let s = format!(
        "{}start = \"2020-09-14T00:00:00Z\"\nend = \"2020-09-13T00:00:00Z\"\n",
        VALID_CONFIG
    );
    let err = AppConfig::load_from_str(&s).unwrap_err();
    assert!(err.to_string().contains("backfill.end"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.store.path, "data/facts.db");
    assert_eq!(config.backfill.report_interval, 500);
}
