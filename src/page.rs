//! Server-rendered quote page.
//!
//! One page, two input columns, a submit button and an outcome panel. The
//! outcome panel is removed client-side on the next field edit, which returns
//! the page to its idle state.

use std::fmt::Write;

use crate::form::{FormError, QuoteForm};
use crate::pipeline::Estimate;
use crate::quote::{self, Choice, NumericField, QuoteRequest, Region, Sex, Smoker};

pub const TITLE: &str = "Calculadora de Custo Estimado do Plano de Saúde";
pub const INTRO: &str =
    "Insira as informações do colaborador para estimar o custo anual do plano de saúde.";
pub const SUBMIT_LABEL: &str = "Calcular Custo Estimado";
pub const RESULT_LABEL: &str = "Custo Anual Estimado";
pub const DISCLAIMER: &str = "Nota: Esta é uma estimativa baseada em um modelo de Machine Learning e dados históricos. Custos reais podem variar.";

/// What the outcome panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing submitted yet.
    Idle,
    /// Submission rejected by the form constraints.
    Invalid(FormError),
    /// Pipeline succeeded.
    Estimated {
        request: QuoteRequest,
        estimate: Estimate,
    },
    /// Pipeline failed; the form stays usable.
    Failed {
        request: QuoteRequest,
        message: String,
    },
}

pub fn render(form: &QuoteForm, outcome: &Outcome) -> String {
    let field_errors = match outcome {
        Outcome::Invalid(errors) => Some(errors),
        _ => None,
    };
    let error_for = |key: &str| field_errors.and_then(|e| e.for_field(key));

    let mut html = String::with_capacity(8 * 1024);
    html.push_str(HEAD);
    let _ = write!(
        html,
        "<main>\n<h1>{} &#x1FA7A;</h1>\n<p>{}</p>\n",
        escape(TITLE),
        escape(INTRO)
    );

    html.push_str("<form id=\"quote-form\" method=\"post\" action=\"/\">\n<div class=\"columns\">\n");

    html.push_str("<div class=\"column\">\n");
    numeric_input(&mut html, &quote::AGE, form, error_for(quote::AGE.key));
    numeric_input(&mut html, &quote::BMI, form, error_for(quote::BMI.key));
    select_input::<Sex>(&mut html, form, error_for(Sex::KEY));
    html.push_str("</div>\n");

    html.push_str("<div class=\"column\">\n");
    numeric_input(&mut html, &quote::CHILDREN, form, error_for(quote::CHILDREN.key));
    select_input::<Smoker>(&mut html, form, error_for(Smoker::KEY));
    select_input::<Region>(&mut html, form, error_for(Region::KEY));
    html.push_str("</div>\n");

    let _ = write!(
        html,
        "</div>\n<button type=\"submit\" class=\"primary\">{}</button>\n</form>\n",
        escape(SUBMIT_LABEL)
    );

    render_outcome(&mut html, outcome);

    html.push_str("</main>\n");
    html.push_str(SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn numeric_input(html: &mut String, field: &NumericField, form: &QuoteForm, error: Option<&str>) {
    let _ = write!(
        html,
        "<label for=\"{key}\">{label}</label>\n\
         <input type=\"number\" id=\"{key}\" name=\"{key}\" min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{value}\" required>\n",
        key = field.key,
        label = escape(field.label),
        min = field.display(field.min),
        max = field.display(field.max),
        step = field.display(field.step),
        value = escape(form.value(field.key)),
    );
    field_error(html, error);
}

fn select_input<C: Choice>(html: &mut String, form: &QuoteForm, error: Option<&str>) {
    let current = form.value(C::KEY);
    let _ = writeln!(
        html,
        "<label for=\"{key}\">{label}</label>\n<select id=\"{key}\" name=\"{key}\">",
        key = C::KEY,
        label = escape(C::LABEL),
    );
    for option in C::OPTIONS {
        let label = escape(option.label());
        let selected = if option.label() == current { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{label}\"{selected}>{label}</option>");
    }
    html.push_str("</select>\n");
    field_error(html, error);
}

fn field_error(html: &mut String, error: Option<&str>) {
    if let Some(message) = error {
        let _ = writeln!(html, "<p class=\"field-error\">{}</p>", escape(message));
    }
}

fn render_outcome(html: &mut String, outcome: &Outcome) {
    match outcome {
        Outcome::Idle => {}
        Outcome::Invalid(errors) => {
            let _ = writeln!(
                html,
                "<section id=\"outcome\" class=\"error\"><p>Corrija os campos destacados: {} campo(s) inválido(s).</p></section>",
                errors.fields.len()
            );
        }
        Outcome::Estimated { request, estimate } => {
            html.push_str("<section id=\"outcome\">\n<hr>\n");
            echo_request(html, request);
            let _ = write!(
                html,
                "<h2>Resultado da Estimativa:</h2>\n\
                 <div class=\"metric\"><span class=\"metric-label\">{}</span>\
                 <span class=\"metric-value\">{}</span></div>\n\
                 <p class=\"caption\">{}</p>\n</section>\n",
                escape(RESULT_LABEL),
                escape(&estimate.formatted),
                escape(DISCLAIMER),
            );
        }
        Outcome::Failed { request, message } => {
            html.push_str("<section id=\"outcome\">\n<hr>\n");
            echo_request(html, request);
            let _ = writeln!(
                html,
                "<p class=\"error\">Erro durante o pré-processamento ou predição: {}</p>\n</section>",
                escape(message)
            );
        }
    }
}

fn echo_request(html: &mut String, request: &QuoteRequest) {
    html.push_str("<h2>Dados Inseridos:</h2>\n<table>\n<tr>");
    let fields = request.display_fields();
    for (label, _) in &fields {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    html.push_str("</tr>\n<tr>");
    for (_, value) in &fields {
        let _ = write!(html, "<td>{}</td>", escape(value));
    }
    html.push_str("</tr>\n</table>\n");
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Previsor de Custos de Saúde</title>
<style>
body { font-family: sans-serif; margin: 0; background: #fafafa; color: #262730; }
main { max-width: 46rem; margin: 0 auto; padding: 2rem 1rem; }
.columns { display: flex; gap: 2rem; flex-wrap: wrap; }
.column { flex: 1 1 18rem; display: flex; flex-direction: column; }
label { margin-top: 0.75rem; font-size: 0.9rem; }
input, select { padding: 0.4rem; font-size: 1rem; }
button.primary { margin-top: 1.5rem; padding: 0.6rem 1.2rem; background: #ff4b4b; color: #fff; border: 0; border-radius: 0.4rem; font-size: 1rem; cursor: pointer; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 0.3rem 0.5rem; text-align: left; }
.metric-label { display: block; font-size: 0.9rem; }
.metric-value { display: block; font-size: 2.2rem; }
.caption { font-size: 0.8rem; color: #808495; }
.error, .field-error { color: #b00020; }
.field-error { margin: 0.2rem 0 0; font-size: 0.85rem; }
</style>
</head>
<body>
"#;

const SCRIPT: &str = r#"<script>
document.querySelectorAll('#quote-form input, #quote-form select').forEach(function (el) {
  el.addEventListener('input', function () {
    var outcome = document.getElementById('outcome');
    if (outcome) { outcome.remove(); }
  });
});
</script>
"#;
