//! Loading of the externally trained artifacts.
//!
//! Both artifacts are read once at startup from the paths in
//! [`ArtifactsConfig`]. Any failure is fatal: the caller reports it and exits
//! before serving a single request. Once loaded, [`Artifacts`] is immutable
//! and shared behind an `Arc`.

pub mod model;
pub mod preprocessor;
pub mod schema;

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::ArtifactsConfig;

pub use model::{Model, PredictError};
pub use preprocessor::{EncodeError, Preprocessor};
pub use schema::{CompatibilityReport, SchemaIssue};

/// Export format version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Preprocessor,
    Model,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Preprocessor => write!(f, "preprocessor"),
            ArtifactKind::Model => write!(f, "model"),
        }
    }
}

/// Problem with an artifact's contents.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported format_version {found} (this build reads version {expected})")]
    Version { found: u32, expected: u32 },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{kind} file '{}' not found", .path.display())]
    Missing { kind: ArtifactKind, path: PathBuf },

    #[error("failed to read {kind} file '{}': {source}", .path.display())]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {kind} from '{}': {source}", .path.display())]
    Corrupt {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// The fitted preprocessor and model.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub preprocessor: Preprocessor,
    pub model: Model,
}

impl Artifacts {
    pub fn new(preprocessor: Preprocessor, model: Model) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    /// Load both artifacts, model first.
    pub fn load(config: &ArtifactsConfig) -> Result<Self, ArtifactError> {
        let model = load_one(ArtifactKind::Model, &config.model_path, Model::from_json)?;
        let preprocessor = load_one(
            ArtifactKind::Preprocessor,
            &config.preprocessor_path,
            Preprocessor::from_json,
        )?;

        info!(
            model_kind = model.kind(),
            n_features = model.n_features(),
            transformers = preprocessor.transformers().len(),
            "Model and preprocessor loaded successfully"
        );

        Ok(Self::new(preprocessor, model))
    }

    /// Compare the loaded artifacts against the form's schema.
    pub fn compatibility(&self) -> CompatibilityReport {
        schema::check_compatibility(&self.preprocessor, &self.model)
    }
}

fn load_one<T>(
    kind: ArtifactKind,
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, FormatError>,
) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::Missing {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Io {
                kind,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse(&contents).map_err(|source| ArtifactError::Corrupt {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MODEL: &str = r#"{"format_version": 1, "kind": "linear", "n_features": 1,
                            "intercept": 1000.0, "coefficients": [10.0]}"#;
    const PREPROCESSOR: &str = r#"{"format_version": 1, "transformers": [
                            {"kind": "passthrough", "columns": ["Idade"]}]}"#;

    fn write_config(dir: &TempDir, model: Option<&str>, pre: Option<&str>) -> ArtifactsConfig {
        let model_path = dir.path().join("model.json");
        let preprocessor_path = dir.path().join("preprocessor.json");
        if let Some(model) = model {
            fs::write(&model_path, model).unwrap();
        }
        if let Some(pre) = pre {
            fs::write(&preprocessor_path, pre).unwrap();
        }
        ArtifactsConfig {
            model_path,
            preprocessor_path,
        }
    }

    #[test]
    fn test_load_success() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(MODEL), Some(PREPROCESSOR));
        let artifacts = Artifacts::load(&config).unwrap();
        assert_eq!(artifacts.model.kind(), "linear");
        assert_eq!(artifacts.preprocessor.output_width(), 1);
    }

    #[test]
    fn test_missing_model_reported() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None, Some(PREPROCESSOR));
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { kind: ArtifactKind::Model, .. }));
        assert!(err.to_string().contains("model.json"));
    }

    #[test]
    fn test_missing_preprocessor_reported() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(MODEL), None);
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Missing {
                kind: ArtifactKind::Preprocessor,
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_artifact_carries_underlying_message() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some("{not json"), Some(PREPROCESSOR));
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { kind: ArtifactKind::Model, .. }));
        assert!(err.to_string().starts_with("failed to load model from"));
    }
}
