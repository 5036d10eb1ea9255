use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::form::FormError;
use crate::pipeline::PipelineError;

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Body could not be read as a quote request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Field values outside the allowed ranges or options
    #[error("{0}")]
    Validation(#[from] FormError),
    /// Preprocessing or prediction failed
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let mut error = json!({
            "message": self.to_string(),
            "type": error_type_name(&self),
        });
        if let Self::Validation(form_error) = &self {
            error["fields"] = json!(form_error.fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::InvalidRequest(_) => "invalid_request",
        AppError::Validation(_) => "validation_error",
        AppError::Pipeline(e) => e.error_type(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::EncodeError;
    use crate::form::QuoteForm;

    #[test]
    fn test_error_display() {
        let error = AppError::InvalidRequest("expected value".to_string());
        assert_eq!(error.to_string(), "Invalid request: expected value");
    }

    #[test]
    fn test_error_type_name() {
        let pipeline = AppError::Pipeline(PipelineError::Encode(EncodeError::MissingColumn(
            "IMC".to_string(),
        )));
        assert_eq!(error_type_name(&pipeline), "encode_error");
        assert_eq!(
            error_type_name(&AppError::InvalidRequest("x".to_string())),
            "invalid_request"
        );
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let form = QuoteForm {
            age: "5".to_string(),
            ..QuoteForm::default()
        };
        let error = AppError::from(form.parse().unwrap_err());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pipeline_error_response() {
        let response = AppError::Pipeline(PipelineError::EmptyPrediction).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
