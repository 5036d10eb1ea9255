//! Fitted column transformer.
//!
//! Maps a [`Row`] to a numeric feature vector using parameters learned at
//! training time. Each transformer owns a set of input columns and appends its
//! output to the vector in declaration order.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use super::{FormatError, FORMAT_VERSION};
use crate::row::{Cell, Row};

/// Failure while encoding a row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("column '{column}' expects a {expected} value, got a {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("found unknown category '{value}' in column '{column}' during transform")]
    UnknownCategory { column: String, value: String },

    #[error("column '{0}' contains a non-finite number")]
    NonFinite(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    First,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transformer {
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        drop: Option<DropPolicy>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl Transformer {
    pub fn kind(&self) -> &'static str {
        match self {
            Transformer::StandardScaler { .. } => "standard_scaler",
            Transformer::OneHot { .. } => "one_hot",
            Transformer::Passthrough { .. } => "passthrough",
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Transformer::StandardScaler { columns, .. }
            | Transformer::OneHot { columns, .. }
            | Transformer::Passthrough { columns } => columns,
        }
    }

    /// Number of output features.
    pub fn output_width(&self) -> usize {
        match self {
            Transformer::StandardScaler { columns, .. } | Transformer::Passthrough { columns } => {
                columns.len()
            }
            Transformer::OneHot {
                categories, drop, ..
            } => categories
                .iter()
                .map(|cats| match drop {
                    Some(DropPolicy::First) => cats.len().saturating_sub(1),
                    None => cats.len(),
                })
                .sum(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(format!(
                        "standard_scaler has {} columns but {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    ));
                }
                if mean.iter().chain(scale).any(|v| !v.is_finite()) {
                    return Err("standard_scaler parameters must be finite".to_string());
                }
            }
            Transformer::OneHot {
                columns,
                categories,
                ..
            } => {
                if categories.len() != columns.len() {
                    return Err(format!(
                        "one_hot has {} columns but {} category lists",
                        columns.len(),
                        categories.len()
                    ));
                }
                for (column, cats) in columns.iter().zip(categories) {
                    if cats.is_empty() {
                        return Err(format!("one_hot column '{column}' has no categories"));
                    }
                    let mut seen = HashSet::new();
                    if let Some(dup) = cats.iter().find(|c| !seen.insert(c.as_str())) {
                        return Err(format!(
                            "one_hot column '{column}' lists category '{dup}' twice"
                        ));
                    }
                }
            }
            Transformer::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn transform(&self, row: &Row, out: &mut Vec<f64>) -> Result<(), EncodeError> {
        match self {
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, mean), scale) in columns.iter().zip(mean).zip(scale) {
                    let x = number(row, column)?;
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    out.push((x - mean) / scale);
                }
            }
            Transformer::OneHot {
                columns,
                categories,
                drop,
                handle_unknown,
            } => {
                for (column, cats) in columns.iter().zip(categories) {
                    let value = category(row, column)?;
                    let position = cats.iter().position(|c| c == value);
                    if position.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(EncodeError::UnknownCategory {
                            column: column.clone(),
                            value: value.to_string(),
                        });
                    }
                    let skip = usize::from(*drop == Some(DropPolicy::First));
                    out.extend(
                        (skip..cats.len()).map(|i| if Some(i) == position { 1.0 } else { 0.0 }),
                    );
                }
            }
            Transformer::Passthrough { columns } => {
                for column in columns {
                    out.push(number(row, column)?);
                }
            }
        }
        Ok(())
    }
}

fn cell<'a>(row: &'a Row, column: &str) -> Result<&'a Cell, EncodeError> {
    row.get(column)
        .ok_or_else(|| EncodeError::MissingColumn(column.to_string()))
}

fn number(row: &Row, column: &str) -> Result<f64, EncodeError> {
    match cell(row, column)? {
        Cell::Number(x) if x.is_finite() => Ok(*x),
        Cell::Number(_) => Err(EncodeError::NonFinite(column.to_string())),
        other => Err(EncodeError::TypeMismatch {
            column: column.to_string(),
            expected: "number",
            found: other.type_name(),
        }),
    }
}

fn category<'a>(row: &'a Row, column: &str) -> Result<&'a str, EncodeError> {
    match cell(row, column)? {
        Cell::Category(value) => Ok(value),
        other => Err(EncodeError::TypeMismatch {
            column: column.to_string(),
            expected: "category",
            found: other.type_name(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct PreprocessorFile {
    format_version: u32,
    transformers: Vec<Transformer>,
}

/// The loaded preprocessor. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    transformers: Vec<Transformer>,
}

impl Preprocessor {
    pub fn new(transformers: Vec<Transformer>) -> Result<Self, FormatError> {
        if transformers.is_empty() {
            return Err(FormatError::Invalid(
                "preprocessor has no transformers".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for transformer in &transformers {
            transformer.validate().map_err(FormatError::Invalid)?;
            for column in transformer.columns() {
                if !seen.insert(column.as_str()) {
                    return Err(FormatError::Invalid(format!(
                        "column '{column}' is consumed by more than one transformer"
                    )));
                }
            }
        }

        Ok(Self { transformers })
    }

    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let file: PreprocessorFile = serde_json::from_str(json)?;
        if file.format_version != FORMAT_VERSION {
            return Err(FormatError::Version {
                found: file.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Self::new(file.transformers)
    }

    /// Encode one row into a feature vector.
    pub fn encode(&self, row: &Row) -> Result<Vec<f64>, EncodeError> {
        let mut out = Vec::with_capacity(self.output_width());
        for transformer in &self.transformers {
            transformer.transform(row, &mut out)?;
        }
        Ok(out)
    }

    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }

    pub fn output_width(&self) -> usize {
        self.transformers.iter().map(Transformer::output_width).sum()
    }

    /// Every column the preprocessor reads, in transformer order.
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.transformers
            .iter()
            .flat_map(|t| t.columns().iter().map(String::as_str))
    }

    /// Fitted categories for a one-hot encoded column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.transformers.iter().find_map(|t| match t {
            Transformer::OneHot {
                columns,
                categories,
                ..
            } => columns
                .iter()
                .position(|c| c == column)
                .map(|i| categories[i].as_slice()),
            _ => None,
        })
    }
}
