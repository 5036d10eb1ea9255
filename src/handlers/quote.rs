use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::form::FormError;
use crate::format::{CURRENCY_CODE, format_currency};
use crate::page::DISCLAIMER;
use crate::quote::QuoteRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub request: QuoteRequest,
    pub estimate: f64,
    /// Amount without symbol, e.g. `12.345,60`.
    pub amount: String,
    /// Amount with symbol, e.g. `R$ 12.345,60`.
    pub formatted: String,
    pub currency: String,
    pub disclaimer: String,
}

/// `POST /api/v1/quote`
pub async fn create_quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<QuoteResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let request = request.validated().map_err(FormError::from)?;

    let id = Uuid::new_v4();
    info!(quote_id = %id, "Computing quote via API");
    let estimate = state.pipeline.estimate(&request)?;

    Ok(Json(QuoteResponse {
        id,
        request,
        estimate: estimate.value,
        amount: format_currency(estimate.value),
        formatted: estimate.formatted,
        currency: CURRENCY_CODE.to_string(),
        disclaimer: DISCLAIMER.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use crate::pipeline::PipelineError;
    use crate::quote::Region;

    #[tokio::test]
    async fn test_create_quote() {
        let response = create_quote(
            State(test_support::state()),
            Ok(Json(QuoteRequest::default())),
        )
        .await
        .unwrap();

        assert_eq!(response.estimate, 10050.0);
        assert_eq!(response.amount, "10.050,00");
        assert_eq!(response.formatted, "R$ 10.050,00");
        assert_eq!(response.currency, "BRL");
    }

    #[tokio::test]
    async fn test_create_quote_rejects_out_of_range() {
        let request = QuoteRequest {
            age: 101,
            ..QuoteRequest::default()
        };
        let err = create_quote(State(test_support::state()), Ok(Json(request)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_quote_reports_pipeline_failure() {
        let state = test_support::state_with_regions(r#""Centro", "Norte", "Sudeste""#);
        let request = QuoteRequest {
            region: Region::South,
            ..QuoteRequest::default()
        };
        let err = create_quote(State(state), Ok(Json(request)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Pipeline(PipelineError::Encode(_))));
    }
}
