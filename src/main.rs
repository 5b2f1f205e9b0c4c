//! Salary Crawler entry point
//!
//! Usage: `salary-crawler [CONFIG_PATH]`. Without a path, `config/default.toml`
//! is used when present; environment overrides apply either way.

use anyhow::Context;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use salary_crawler_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use salary_crawler_lib::{AppConfig, SalaryPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => AppConfig::load_default().context("failed to load configuration")?,
    };

    init_logging_with_config(&config.logging).context("failed to initialize logging")?;
    log_system_info(config_path.as_deref());

    let pipeline = SalaryPipeline::new(config);
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ Run aborted: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    for outcome in report.persist.failures() {
        if let Err(e) = &outcome.result {
            warn!("Sink {} ({}) did not persist: {}", outcome.sink, outcome.target, e);
        }
    }

    if report.is_success() {
        info!(
            "✅ Run finished: {} records persisted, {} skipped",
            report.batch.len(),
            report.skipped
        );
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            "❌ Run finished with sink failures: {} records collected, {} skipped",
            report.batch.len(),
            report.skipped
        );
        Ok(ExitCode::FAILURE)
    }
}
