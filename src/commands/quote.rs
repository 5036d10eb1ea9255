use anyhow::{Context, Result};
use colored::Colorize;
use plan_cost_estimator::{
    artifacts::Artifacts,
    config::Config,
    form::FormError,
    page::{DISCLAIMER, RESULT_LABEL},
    pipeline::QuotePipeline,
    quote::QuoteRequest,
};
use std::sync::Arc;

use crate::cli::QuoteArgs;

/// Execute the quote command
///
/// Same pipeline as the form; a pipeline failure is printed and returned as an
/// error so the exit status reflects it.
pub fn execute(cfg: &Config, args: &QuoteArgs) -> Result<()> {
    let request = request_from_args(args)?;

    let artifacts = Artifacts::load(&cfg.artifacts)
        .context("Model or preprocessor could not be loaded")?;
    let pipeline = QuotePipeline::new(Arc::new(artifacts));

    let estimate = match pipeline.estimate(&request) {
        Ok(estimate) => estimate,
        Err(e) => {
            eprintln!("{}", format!("Erro durante o pré-processamento ou predição: {e}").red());
            return Err(e.into());
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "request": request,
                "estimate": estimate.value,
                "formatted": estimate.formatted,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Dados Inseridos:".bold());
    for (label, value) in request.display_fields() {
        println!("  {}: {}", label.cyan(), value);
    }
    println!();
    println!("{}: {}", RESULT_LABEL.bold(), estimate.formatted.green().bold());
    println!("{}", DISCLAIMER.dimmed());

    Ok(())
}

fn request_from_args(args: &QuoteArgs) -> Result<QuoteRequest> {
    let request = QuoteRequest {
        age: args.age,
        sex: args.sex,
        bmi: args.bmi,
        children: args.children,
        smoker: args.smoker,
        region: args.region,
    };
    Ok(request.validated().map_err(FormError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_cost_estimator::quote::{Region, Sex, Smoker};

    fn args() -> QuoteArgs {
        QuoteArgs {
            age: 40,
            sex: Sex::Female,
            bmi: 22.26,
            children: 1,
            smoker: Smoker::No,
            region: Region::Central,
            json: false,
        }
    }

    #[test]
    fn test_request_from_args_rounds_bmi() {
        let request = request_from_args(&args()).unwrap();
        assert_eq!(request.bmi, 22.3);
        assert_eq!(request.region, Region::Central);
    }

    #[test]
    fn test_request_from_args_rejects_out_of_range() {
        let mut a = args();
        a.age = 12;
        let err = request_from_args(&a).unwrap_err();
        assert!(err.to_string().contains("Idade"));
    }
}
