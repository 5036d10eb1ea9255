use clap::{Args, Parser, Subcommand};
use plan_cost_estimator::quote::{Region, Sex, Smoker};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plan-cost", version, about = "Health plan annual cost estimator")]
pub struct Cli {
    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "PLAN_COST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load the artifacts and serve the quote form (default)
    Serve,

    /// Load the artifacts and report schema drift without serving
    Check,

    /// Compute a single estimate and print it
    Quote(QuoteArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Age in years (18-100)
    #[arg(long, default_value_t = 30)]
    pub age: u32,

    /// Sex, as labelled at training time
    #[arg(long, default_value = "Masculino")]
    pub sex: Sex,

    /// Body mass index (10.0-60.0)
    #[arg(long, default_value_t = 25.0)]
    pub bmi: f64,

    /// Number of children (0-10)
    #[arg(long, default_value_t = 0)]
    pub children: u32,

    /// Smoker, as labelled at training time
    #[arg(long, default_value = "Não")]
    pub smoker: Smoker,

    /// Region, as labelled at training time
    #[arg(long, default_value = "Sudeste")]
    pub region: Region,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["plan-cost"]).unwrap();
        assert!(matches!(cli.get_command(), Commands::Serve));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parsing_quote_with_labels() {
        let args = [
            "plan-cost", "quote", "--age", "52", "--smoker", "Sim", "--region", "Sul",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Quote(q) => {
                assert_eq!(q.age, 52);
                assert_eq!(q.smoker, Smoker::Yes);
                assert_eq!(q.region, Region::South);
                assert_eq!(q.sex, Sex::Male);
                assert_eq!(q.bmi, 25.0);
            }
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_label() {
        let args = ["plan-cost", "quote", "--region", "Nordeste"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli = Cli::try_parse_from(["plan-cost", "check", "--config", "prod.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert!(matches!(cli.get_command(), Commands::Check));
    }
}
