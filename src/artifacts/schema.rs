//! Schema drift between the form and the loaded artifacts.
//!
//! Nothing here changes behaviour. Issues are logged at startup and listed by
//! `plan-cost check` so an operator can see that, for example, a region
//! offered by the form was never seen during training.

use std::fmt;
use tracing::warn;

use super::{Model, Preprocessor};
use crate::quote::{columns, Choice, Region, Sex, Smoker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// The form supplies a column the preprocessor ignores.
    UnusedColumn { column: String },
    /// The preprocessor reads a column the form never supplies.
    MissingColumn { column: String },
    /// A form option absent from the fitted categories.
    UnfittedOption { column: String, label: String },
    /// A fitted category the form never offers.
    UnofferedCategory { column: String, label: String },
    /// The form offers a categorical column that is not one-hot encoded.
    NotCategorical { column: String },
    /// Preprocessor output width differs from the model's input width.
    WidthMismatch { preprocessor: usize, model: usize },
}

impl SchemaIssue {
    /// Issues that will make some or all requests fail.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            SchemaIssue::MissingColumn { .. }
                | SchemaIssue::UnfittedOption { .. }
                | SchemaIssue::NotCategorical { .. }
                | SchemaIssue::WidthMismatch { .. }
        )
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::UnusedColumn { column } => {
                write!(f, "column '{column}' is collected but not used by the preprocessor")
            }
            SchemaIssue::MissingColumn { column } => {
                write!(f, "preprocessor expects column '{column}' which the form does not collect")
            }
            SchemaIssue::UnfittedOption { column, label } => write!(
                f,
                "option '{label}' for '{column}' was not seen when the preprocessor was fitted"
            ),
            SchemaIssue::UnofferedCategory { column, label } => write!(
                f,
                "fitted category '{label}' for '{column}' is not offered by the form"
            ),
            SchemaIssue::NotCategorical { column } => {
                write!(f, "column '{column}' is not one-hot encoded by the preprocessor")
            }
            SchemaIssue::WidthMismatch {
                preprocessor,
                model,
            } => write!(
                f,
                "preprocessor produces {preprocessor} features but the model expects {model}"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityReport {
    pub issues: Vec<SchemaIssue>,
}

impl CompatibilityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn blocking(&self) -> impl Iterator<Item = &SchemaIssue> {
        self.issues.iter().filter(|issue| issue.is_blocking())
    }

    pub fn log_warnings(&self) {
        for issue in &self.issues {
            warn!(blocking = issue.is_blocking(), "Schema drift: {}", issue);
        }
    }
}

pub fn check_compatibility(preprocessor: &Preprocessor, model: &Model) -> CompatibilityReport {
    let mut issues = Vec::new();
    let consumed: Vec<&str> = preprocessor.input_columns().collect();

    for column in columns::ALL {
        if !consumed.contains(&column) {
            issues.push(SchemaIssue::UnusedColumn {
                column: column.to_string(),
            });
        }
    }
    for column in &consumed {
        if !columns::ALL.contains(column) {
            issues.push(SchemaIssue::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    check_options::<Sex>(preprocessor, &consumed, &mut issues);
    check_options::<Smoker>(preprocessor, &consumed, &mut issues);
    check_options::<Region>(preprocessor, &consumed, &mut issues);

    if preprocessor.output_width() != model.n_features() {
        issues.push(SchemaIssue::WidthMismatch {
            preprocessor: preprocessor.output_width(),
            model: model.n_features(),
        });
    }

    CompatibilityReport { issues }
}

fn check_options<C: Choice>(
    preprocessor: &Preprocessor,
    consumed: &[&str],
    issues: &mut Vec<SchemaIssue>,
) {
    if !consumed.contains(&C::COLUMN) {
        return;
    }
    let Some(fitted) = preprocessor.categories(C::COLUMN) else {
        issues.push(SchemaIssue::NotCategorical {
            column: C::COLUMN.to_string(),
        });
        return;
    };

    let offered = C::labels();
    for label in &offered {
        if !fitted.iter().any(|f| f == label) {
            issues.push(SchemaIssue::UnfittedOption {
                column: C::COLUMN.to_string(),
                label: label.to_string(),
            });
        }
    }
    for label in fitted {
        if !offered.iter().any(|o| *o == label.as_str()) {
            issues.push(SchemaIssue::UnofferedCategory {
                column: C::COLUMN.to_string(),
                label: label.clone(),
            });
        }
    }
}
