use anyhow::Result;
use fact_backfill::backfill::{DryRunSink, Migration, run_migration};
use fact_backfill::config::AppConfig;
use fact_backfill::fact_repo::FactRepo;
use fact_backfill::version;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn usage() -> String {
    let jobs: Vec<&str> = Migration::ALL.iter().map(|m| m.name()).collect();
    format!(
        "usage: {} <{}>  (config from CONFIG_FILE, default config.toml)",
        version::NAME,
        jobs.join("|")
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let Some(job) = std::env::args().nth(1) else {
        anyhow::bail!(usage());
    };
    let migration: Migration = job
        .parse()
        .map_err(|e| anyhow::anyhow!("{}\n{}", e, usage()))?;

    let app_config = AppConfig::load()?;
    tracing::info!(
        version = version::VERSION,
        migration = %migration,
        store = %app_config.store.path,
        dry_run = app_config.backfill.dry_run,
        "starting backfill"
    );

    let repo = FactRepo::connect(&app_config.store).await?;
    repo.init().await?;

    let driver_config = app_config.backfill.driver_config();
    let report = if app_config.backfill.dry_run {
        run_migration(migration, &repo, &DryRunSink, driver_config).await?
    } else {
        run_migration(migration, &repo, &repo, driver_config).await?
    };

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
