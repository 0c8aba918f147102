use anyhow::{Context, Result};
use report_relay::config::Config;
use report_relay::pipeline;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let config = Config::load().context("load relay config")?;
    info!(
        domain = %config.reports_domain,
        hec_url = %config.hec_url,
        per_page = config.reports_per_page,
        policy = ?config.record_error_policy,
        "report relay starting"
    );

    let summary = pipeline::run(&config)
        .await
        .context("relay processed reports")?;

    if summary.delivery_failed > 0 || summary.skipped > 0 {
        warn!(
            delivered = summary.delivered,
            skipped = summary.skipped,
            delivery_failed = summary.delivery_failed,
            "run finished with undelivered records"
        );
    }

    Ok(())
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
