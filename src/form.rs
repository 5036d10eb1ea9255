//! Raw form submission and its conversion into a [`QuoteRequest`].
//!
//! Every field arrives as text so a bad value yields a message next to the
//! field instead of an extractor rejection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quote::{self, Choice, NumericField, QuoteRequest, Region, Sex, Smoker};

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every rejected field of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormError {
    pub fields: Vec<FieldError>,
}

impl FormError {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.fields.iter().map(|e| e.message.as_str()).collect();
        write!(f, "invalid input: {}", messages.join("; "))
    }
}

impl std::error::Error for FormError {}

impl From<Vec<quote::OutOfRange>> for FormError {
    fn from(errors: Vec<quote::OutOfRange>) -> Self {
        let mut form_error = FormError::default();
        for e in errors {
            let field = [quote::AGE, quote::BMI, quote::CHILDREN]
                .iter()
                .find(|f| f.label == e.label)
                .map_or("", |f| f.key);
            form_error.push(field, e.to_string());
        }
        form_error
    }
}

/// Submitted form values, kept as text so the page can be re-rendered
/// exactly as the user left it.
///
/// Missing fields deserialize as empty text and are rejected by `parse`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub bmi: String,
    #[serde(default)]
    pub children: String,
    #[serde(default)]
    pub smoker: String,
    #[serde(default)]
    pub region: String,
}

impl Default for QuoteForm {
    fn default() -> Self {
        Self::from(&QuoteRequest::default())
    }
}

impl From<&QuoteRequest> for QuoteForm {
    fn from(request: &QuoteRequest) -> Self {
        Self {
            age: quote::AGE.display(f64::from(request.age)),
            sex: request.sex.label().to_string(),
            bmi: quote::BMI.display(request.bmi),
            children: quote::CHILDREN.display(f64::from(request.children)),
            smoker: request.smoker.label().to_string(),
            region: request.region.label().to_string(),
        }
    }
}

impl QuoteForm {
    pub fn value(&self, key: &str) -> &str {
        match key {
            "age" => &self.age,
            "sex" => &self.sex,
            "bmi" => &self.bmi,
            "children" => &self.children,
            "smoker" => &self.smoker,
            "region" => &self.region,
            _ => "",
        }
    }

    /// Apply the widget constraints and build the request.
    pub fn parse(&self) -> Result<QuoteRequest, FormError> {
        let mut errors = FormError::default();

        let age = parse_whole(&quote::AGE, &self.age, &mut errors);
        let bmi = parse_decimal(&quote::BMI, &self.bmi, &mut errors);
        let children = parse_whole(&quote::CHILDREN, &self.children, &mut errors);
        let sex = parse_choice::<Sex>(&self.sex, &mut errors);
        let smoker = parse_choice::<Smoker>(&self.smoker, &mut errors);
        let region = parse_choice::<Region>(&self.region, &mut errors);

        match (age, sex, bmi, children, smoker, region) {
            (Some(age), Some(sex), Some(bmi), Some(children), Some(smoker), Some(region))
                if errors.fields.is_empty() =>
            {
                QuoteRequest {
                    age,
                    sex,
                    bmi,
                    children,
                    smoker,
                    region,
                }
                .validated()
                .map_err(FormError::from)
            }
            _ => Err(errors),
        }
    }
}

fn parse_whole(field: &NumericField, raw: &str, errors: &mut FormError) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(
                field.key,
                format!("{} must be a whole number between {} and {}", field.label, field.min, field.max),
            );
            None
        }
    }
}

fn parse_decimal(field: &NumericField, raw: &str, errors: &mut FormError) -> Option<f64> {
    // Accept a decimal comma as typed in pt-BR locales
    match raw.trim().replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.push(
                field.key,
                format!(
                    "{} must be a number between {} and {}",
                    field.label,
                    field.display(field.min),
                    field.display(field.max)
                ),
            );
            None
        }
    }
}

fn parse_choice<C: Choice>(raw: &str, errors: &mut FormError) -> Option<C> {
    match C::from_label(raw) {
        Ok(choice) => Some(choice),
        Err(e) => {
            errors.push(C::KEY, e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> QuoteForm {
        QuoteForm {
            age: "45".to_string(),
            sex: "Feminino".to_string(),
            bmi: "31.4".to_string(),
            children: "2".to_string(),
            smoker: "Sim".to_string(),
            region: "Norte".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let request = form().parse().unwrap();
        assert_eq!(request.age, 45);
        assert_eq!(request.sex, Sex::Female);
        assert_eq!(request.bmi, 31.4);
        assert_eq!(request.children, 2);
        assert_eq!(request.smoker, Smoker::Yes);
        assert_eq!(request.region, Region::North);
    }

    #[test]
    fn test_default_form_parses_to_default_request() {
        assert_eq!(QuoteForm::default().parse().unwrap(), QuoteRequest::default());
        assert_eq!(QuoteForm::default().bmi, "25.0");
    }

    #[test]
    fn test_decimal_comma_accepted() {
        let mut f = form();
        f.bmi = "27,5".to_string();
        assert_eq!(f.parse().unwrap().bmi, 27.5);
    }

    #[test]
    fn test_bmi_rounded_before_range_check() {
        let mut f = form();
        f.bmi = "9.95".to_string();
        assert_eq!(f.parse().unwrap().bmi, 10.0);
        f.bmi = "60,04".to_string();
        assert_eq!(f.parse().unwrap().bmi, 60.0);

        f.bmi = "9.94".to_string();
        assert!(f.parse().unwrap_err().for_field("bmi").is_some());
        f.bmi = "60.06".to_string();
        assert!(f.parse().unwrap_err().for_field("bmi").is_some());
    }

    #[test]
    fn test_out_of_range_rejected_per_field() {
        let mut f = form();
        f.age = "101".to_string();
        f.children = "11".to_string();
        let err = f.parse().unwrap_err();
        assert!(err.for_field("age").is_some());
        assert!(err.for_field("children").is_some());
        assert!(err.for_field("bmi").is_none());
    }

    #[test]
    fn test_unparseable_and_unknown_option() {
        let mut f = form();
        f.age = "trinta".to_string();
        f.region = "Nordeste".to_string();
        let err = f.parse().unwrap_err();
        assert_eq!(err.fields.len(), 2);
        assert!(err.for_field("region").unwrap().contains("Nordeste"));
        assert!(err.to_string().starts_with("invalid input:"));
    }

    #[test]
    fn test_negative_age_is_not_a_whole_number() {
        let mut f = form();
        f.age = "-5".to_string();
        assert!(f.parse().unwrap_err().for_field("age").is_some());
    }

    #[test]
    fn test_form_roundtrips_request_values() {
        let request = form().parse().unwrap();
        assert_eq!(QuoteForm::from(&request), form());
    }
}
