use anyhow::{Context, Result};
use colored::Colorize;
use plan_cost_estimator::artifacts::{preprocessor::Transformer, Artifacts};
use plan_cost_estimator::config::Config;
use tracing::info;

/// Execute the check command
///
/// Loads configuration and both artifacts, prints a summary and the schema
/// report. Fails when an artifact cannot be loaded; drift is reported only.
pub fn execute(cfg: &Config) -> Result<()> {
    println!("{}", "Checking configuration and artifacts...".yellow());
    info!("Loading artifacts for check");

    println!();
    println!("{}", "Effective Configuration:".bold());
    println!("{}", toml::to_string_pretty(cfg)?);

    let artifacts = Artifacts::load(&cfg.artifacts).context("Artifact check failed")?;

    println!("{}", "✓ Artifacts loaded".green());
    println!();
    println!("{}", "Model:".cyan());
    println!("  Kind: {}", artifacts.model.kind());
    println!("  Input features: {}", artifacts.model.n_features());
    println!();

    println!("{}", "Preprocessor:".cyan());
    for transformer in artifacts.preprocessor.transformers() {
        println!(
            "  {} [{}] -> {} feature(s)",
            transformer.kind(),
            transformer.columns().join(", "),
            transformer.output_width()
        );
        if let Transformer::OneHot { columns, categories, .. } = transformer {
            for (column, cats) in columns.iter().zip(categories) {
                println!("    {}: {}", column, cats.join(", ").dimmed());
            }
        }
    }
    println!("  Output features: {}", artifacts.preprocessor.output_width());
    println!();

    let report = artifacts.compatibility();
    if report.is_clean() {
        println!("{}", "✓ Form schema matches the artifacts".green());
    } else {
        let blocking: Vec<_> = report.blocking().collect();
        println!(
            "{}",
            format!(
                "Schema Report ({} issue(s), {} affecting requests):",
                report.issues.len(),
                blocking.len()
            )
            .cyan()
        );
        for issue in &blocking {
            println!("  {} {}", "✗".red(), issue);
        }
        for issue in report.issues.iter().filter(|issue| !blocking.contains(issue)) {
            println!("  {} {}", "!".yellow(), issue);
        }
    }

    info!(issues = report.issues.len(), "Artifact check completed");
    Ok(())
}
