use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Config file read when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix, e.g. `PLAN_COST__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "PLAN_COST";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
    pub model_path: PathBuf,
    pub preprocessor_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

/// Load configuration from defaults, the TOML file and the environment.
///
/// `path` is `None` when the user did not pass `--config`; the default file is
/// then optional. An explicitly given file must exist.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let (file, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let config = config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8501)?
        .set_default("server.log_level", "info")?
        .set_default("server.log_format", "pretty")?
        .set_default("artifacts.model_path", "modelo_custo_saude.json")?
        .set_default("artifacts.preprocessor_path", "preprocessor_custo_saude.json")?
        .set_default("metrics.enabled", true)?
        .set_default("metrics.endpoint", "/metrics")?
        .add_source(config::File::from(file).required(required))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.parse::<std::net::IpAddr>().is_err() {
        anyhow::bail!("server.host '{}' is not a valid IP address", cfg.server.host);
    }

    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    if EnvFilter::try_new(&cfg.server.log_level).is_err() {
        anyhow::bail!("server.log_level '{}' is not a valid filter", cfg.server.log_level);
    }

    if cfg.artifacts.model_path.as_os_str().is_empty() {
        anyhow::bail!("artifacts.model_path cannot be empty");
    }

    if cfg.artifacts.preprocessor_path.as_os_str().is_empty() {
        anyhow::bail!("artifacts.preprocessor_path cannot be empty");
    }

    if cfg.metrics.enabled && !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!(
            "metrics.endpoint '{}' must start with '/'",
            cfg.metrics.endpoint
        );
    }

    // The form lives at "/"
    if cfg.metrics.enabled && cfg.metrics.endpoint == "/" {
        anyhow::bail!("metrics.endpoint cannot be '/'");
    }

    Ok(())
}
