use axum::{
    extract::{Form, State},
    response::Html,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::form::QuoteForm;
use crate::page::{self, Outcome};

/// `GET /`: the form in its idle state.
pub async fn show_form() -> Html<String> {
    Html(page::render(&QuoteForm::default(), &Outcome::Idle))
}

/// `POST /`: explicit submit.
///
/// The pipeline runs to completion inside the request; whatever happens, the
/// page comes back with the user's values so they can correct and resubmit.
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<QuoteForm>,
) -> Html<String> {
    let quote_id = Uuid::new_v4();

    let outcome = match form.parse() {
        Err(errors) => {
            warn!(%quote_id, "Form rejected: {}", errors);
            Outcome::Invalid(errors)
        }
        Ok(request) => {
            info!(%quote_id, "Computing quote");
            match state.pipeline.estimate(&request) {
                Ok(estimate) => Outcome::Estimated { request, estimate },
                Err(e) => Outcome::Failed {
                    request,
                    message: e.to_string(),
                },
            }
        }
    };

    Html(page::render(&form, &outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;

    fn form(region: &str) -> QuoteForm {
        QuoteForm {
            region: region.to_string(),
            ..QuoteForm::default()
        }
    }

    #[tokio::test]
    async fn test_show_form_is_idle() {
        let Html(html) = show_form().await;
        assert!(html.contains(page::SUBMIT_LABEL));
        assert!(!html.contains("id=\"outcome\""));
    }

    #[tokio::test]
    async fn test_submit_renders_estimate() {
        let Html(html) = submit_form(State(test_support::state()), Form(form("Sudeste"))).await;
        assert!(html.contains("R$ 10.050,00"), "{html}");
        assert!(html.contains(page::DISCLAIMER.split('.').next().unwrap()));
    }

    #[tokio::test]
    async fn test_submit_with_unfitted_region_reports_error() {
        let state = test_support::state_with_regions(r#""Centro", "Norte", "Sudeste""#);
        let Html(html) = submit_form(State(state), Form(form("Sul"))).await;
        assert!(html.contains("Erro durante o pré-processamento ou predição"));
        assert!(html.contains("Sul"));
    }

    #[tokio::test]
    async fn test_submit_with_invalid_values_keeps_form_usable() {
        let mut submitted = form("Sudeste");
        submitted.bmi = "75".to_string();
        let Html(html) = submit_form(State(test_support::state()), Form(submitted)).await;
        assert!(html.contains("class=\"field-error\""));
        assert!(html.contains(r#"value="75""#));
        assert!(html.contains(page::SUBMIT_LABEL));
    }

    #[tokio::test]
    async fn test_identical_submissions_render_identically() {
        let state = test_support::state();
        let Html(first) = submit_form(State(state.clone()), Form(form("Norte"))).await;
        let Html(second) = submit_form(State(state), Form(form("Norte"))).await;
        assert_eq!(first, second);
    }
}
