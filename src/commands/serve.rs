use anyhow::{Context, Result};
use colored::Colorize;
use plan_cost_estimator::{artifacts::Artifacts, config::Config, server};
use std::sync::Arc;
use tracing::info;

/// Execute the serve command
///
/// This will:
/// 1. Load both artifacts (any failure aborts before binding)
/// 2. Log schema drift between the form and the artifacts
/// 3. Start the server
pub async fn execute(cfg: Config) -> Result<()> {
    println!("{}", "Loading model artifacts...".yellow());

    let artifacts = Artifacts::load(&cfg.artifacts)
        .context("Cannot start: model or preprocessor could not be loaded")?;

    let report = artifacts.compatibility();
    if report.is_clean() {
        info!("Artifacts match the form schema");
    } else {
        report.log_warnings();
        println!(
            "{}",
            format!(
                "Warning: {} schema issue(s) found, run `plan-cost check` for details",
                report.issues.len()
            )
            .yellow()
        );
    }

    println!(
        "{}",
        format!(
            "Serving quote form on http://{}:{}",
            cfg.server.host, cfg.server.port
        )
        .green()
    );

    server::start_server(cfg, Arc::new(artifacts)).await
}
