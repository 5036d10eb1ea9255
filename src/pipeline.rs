//! Quote pipeline: encode -> predict -> format.
//!
//! Shared by the HTML form, the JSON endpoint and the `quote` command, so the
//! front-ends only deal with presentation.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifacts::{Artifacts, EncodeError, PredictError};
use crate::format::format_brl;
use crate::metrics;
use crate::quote::QuoteRequest;
use crate::row::Row;

/// Failure inside the pipeline. Always reported to the caller, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("preprocessing failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("prediction failed: {0}")]
    Predict(#[from] PredictError),

    #[error("prediction failed: the model returned no value")]
    EmptyPrediction,

    #[error("prediction failed: the model returned a non-finite value ({0})")]
    NonFinite(f64),
}

impl PipelineError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Encode(_) => "encode_error",
            PipelineError::Predict(_) => "predict_error",
            PipelineError::EmptyPrediction => "empty_prediction",
            PipelineError::NonFinite(_) => "non_finite_prediction",
        }
    }
}

/// A computed estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Estimated annual cost.
    pub value: f64,
    /// `value` formatted as currency, e.g. `R$ 12.345,60`.
    pub formatted: String,
}

#[derive(Debug, Clone)]
pub struct QuotePipeline {
    artifacts: Arc<Artifacts>,
}

impl QuotePipeline {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Estimate the annual cost for one request.
    pub fn estimate(&self, request: &QuoteRequest) -> Result<Estimate, PipelineError> {
        let start = Instant::now();
        let result = self.estimate_row(&request.to_row());
        metrics::record_quote(&result, start.elapsed());

        match &result {
            Ok(estimate) => info!(
                age = request.age,
                sex = %request.sex,
                bmi = request.bmi,
                children = request.children,
                smoker = %request.smoker,
                region = %request.region,
                estimate = estimate.value,
                "Quote computed"
            ),
            Err(e) => warn!(error_type = e.error_type(), "Quote failed: {}", e),
        }

        result
    }

    /// Run the two artifact calls on an already built row.
    pub fn estimate_row(&self, row: &Row) -> Result<Estimate, PipelineError> {
        let features = self.artifacts.preprocessor.encode(row)?;
        debug!(?features, "Encoded input");

        let prediction = self
            .artifacts
            .model
            .predict(std::slice::from_ref(&features))?;
        debug!(?prediction, "Raw prediction");

        let value = prediction
            .first()
            .copied()
            .ok_or(PipelineError::EmptyPrediction)?;
        if !value.is_finite() {
            return Err(PipelineError::NonFinite(value));
        }

        let value = if value < 0.0 {
            warn!(raw = value, "Model returned a negative cost, reporting zero");
            0.0
        } else {
            value
        };

        Ok(Estimate {
            value,
            formatted: format_brl(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{Model, Preprocessor};
    use crate::quote::{Region, Smoker};

    fn pipeline(intercept: f64) -> QuotePipeline {
        let preprocessor = Preprocessor::from_json(
            r#"{"format_version": 1, "transformers": [
                {"kind": "passthrough", "columns": ["Idade", "IMC", "Qte_Filhos"]},
                {"kind": "one_hot", "columns": ["Fumante", "Região"],
                 "categories": [["Não", "Sim"], ["Centro", "Norte", "Sudeste"]],
                 "drop": "first"}
            ]}"#,
        )
        .unwrap();
        let model = Model::from_json(&format!(
            r#"{{"format_version": 1, "kind": "linear", "n_features": 6,
                "intercept": {intercept}, "coefficients": [100.0, 50.0, 400.0, 20000.0, 300.0, 600.0]}}"#
        ))
        .unwrap();
        QuotePipeline::new(Arc::new(Artifacts::new(preprocessor, model)))
    }

    #[test]
    fn test_estimate_formats_currency() {
        let estimate = pipeline(-2000.0)
            .estimate(&QuoteRequest::default())
            .unwrap();
        // 30*100 + 25*50 + 600 (Sudeste) - 2000
        assert_eq!(estimate.value, 2850.0);
        assert_eq!(estimate.formatted, "R$ 2.850,00");
    }

    #[test]
    fn test_smoker_flag_reaches_model() {
        let request = QuoteRequest {
            smoker: Smoker::Yes,
            ..QuoteRequest::default()
        };
        let estimate = pipeline(0.0).estimate(&request).unwrap();
        assert_eq!(estimate.value, 24850.0);
    }

    #[test]
    fn test_unfitted_region_is_reported_not_fatal() {
        let request = QuoteRequest {
            region: Region::South,
            ..QuoteRequest::default()
        };
        let err = pipeline(0.0).estimate(&request).unwrap_err();
        assert_eq!(err.error_type(), "encode_error");
        assert!(err.to_string().contains("'Sul'"));
    }

    #[test]
    fn test_negative_prediction_reported_as_zero() {
        let estimate = pipeline(-1_000_000.0)
            .estimate(&QuoteRequest::default())
            .unwrap();
        assert_eq!(estimate.value, 0.0);
        assert_eq!(estimate.formatted, "R$ 0,00");
    }

    #[test]
    fn test_overflowing_prediction_is_an_error() {
        let preprocessor = Preprocessor::from_json(
            r#"{"format_version": 1, "transformers": [{"kind": "passthrough", "columns": ["Idade", "IMC"]}]}"#,
        )
        .unwrap();
        let model = Model::from_json(
            r#"{"format_version": 1, "kind": "linear", "n_features": 2,
                "intercept": 0.0, "coefficients": [1e308, 1e308]}"#,
        )
        .unwrap();
        let pipeline = QuotePipeline::new(Arc::new(Artifacts::new(preprocessor, model)));

        let err = pipeline.estimate(&QuoteRequest::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NonFinite(v) if v.is_infinite()));
        assert_eq!(err.error_type(), "non_finite_prediction");
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let pipeline = pipeline(1000.0);
        let request = QuoteRequest::default();
        assert_eq!(
            pipeline.estimate(&request).unwrap(),
            pipeline.estimate(&request).unwrap()
        );
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let preprocessor = Preprocessor::from_json(
            r#"{"format_version": 1, "transformers": [{"kind": "passthrough", "columns": ["Idade"]}]}"#,
        )
        .unwrap();
        let model = Model::from_json(
            r#"{"format_version": 1, "kind": "linear", "n_features": 2,
                "intercept": 0.0, "coefficients": [1.0, 1.0]}"#,
        )
        .unwrap();
        let pipeline = QuotePipeline::new(Arc::new(Artifacts::new(preprocessor, model)));
        let err = pipeline.estimate(&QuoteRequest::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Predict(PredictError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
