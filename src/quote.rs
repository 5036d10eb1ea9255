//! The Quote Request record and its training-time schema.
//!
//! Column names and category labels below are the exact strings the external
//! preprocessor was fitted against. They are kept in this one file so the
//! coupling is visible; `artifacts::schema` checks them against the loaded
//! preprocessor at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::row::Row;

/// Training-time column names.
pub mod columns {
    pub const AGE: &str = "Idade";
    pub const SEX: &str = "Sexo";
    pub const BMI: &str = "IMC";
    pub const CHILDREN: &str = "Qte_Filhos";
    pub const SMOKER: &str = "Fumante";
    pub const REGION: &str = "Região";

    /// All input columns in the order the record is built.
    pub const ALL: [&str; 6] = [AGE, SEX, BMI, CHILDREN, SMOKER, REGION];
}

/// Widget constraints for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericField {
    /// Form key (also the JSON field name).
    pub key: &'static str,
    pub label: &'static str,
    pub column: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    /// Decimal places shown and kept.
    pub decimals: u8,
}

impl NumericField {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Render a value with this field's precision.
    pub fn display(&self, value: f64) -> String {
        format!("{:.*}", usize::from(self.decimals), value)
    }
}

pub const AGE: NumericField = NumericField {
    key: "age",
    label: "Idade",
    column: columns::AGE,
    min: 18.0,
    max: 100.0,
    step: 1.0,
    default: 30.0,
    decimals: 0,
};

pub const BMI: NumericField = NumericField {
    key: "bmi",
    label: "IMC (Índice de Massa Corpórea)",
    column: columns::BMI,
    min: 10.0,
    max: 60.0,
    step: 0.1,
    default: 25.0,
    decimals: 1,
};

pub const CHILDREN: NumericField = NumericField {
    key: "children",
    label: "Quantidade de Filhos",
    column: columns::CHILDREN,
    min: 0.0,
    max: 10.0,
    step: 1.0,
    default: 0.0,
    decimals: 0,
};

/// A label that is not one of a field's options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid option for {column} (expected one of: {})", .options.join(", "))]
pub struct UnknownOption {
    pub column: &'static str,
    pub value: String,
    pub options: Vec<&'static str>,
}

/// A categorical field whose options are fixed training-time labels.
pub trait Choice: Copy + Sized + 'static {
    const KEY: &'static str;
    const LABEL: &'static str;
    const COLUMN: &'static str;
    /// Options in display order (first is the default).
    const OPTIONS: &'static [Self];

    fn label(self) -> &'static str;

    fn labels() -> Vec<&'static str> {
        Self::OPTIONS.iter().map(|option| option.label()).collect()
    }

    fn from_label(value: &str) -> Result<Self, UnknownOption> {
        Self::OPTIONS
            .iter()
            .copied()
            .find(|option| option.label() == value)
            .ok_or_else(|| UnknownOption {
                column: Self::COLUMN,
                value: value.to_string(),
                options: Self::labels(),
            })
    }
}

macro_rules! choice_enum {
    (
        $name:ident, key = $key:literal, label = $label:literal, column = $column:expr,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl Choice for $name {
            const KEY: &'static str = $key;
            const LABEL: &'static str = $label;
            const COLUMN: &'static str = $column;
            const OPTIONS: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Choice>::from_label(s)
            }
        }
    };
}

choice_enum!(Sex, key = "sex", label = "Sexo", column = columns::SEX, {
    Male => "Masculino",
    Female => "Feminino",
});

choice_enum!(Smoker, key = "smoker", label = "Fumante?", column = columns::SMOKER, {
    No => "Não",
    Yes => "Sim",
});

choice_enum!(Region, key = "region", label = "Região", column = columns::REGION, {
    Southeast => "Sudeste",
    Central => "Centro",
    North => "Norte",
    South => "Sul",
});

/// Out-of-range numeric input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{label} must be between {min} and {max} (got {value})")]
pub struct OutOfRange {
    pub label: &'static str,
    pub value: f64,
    pub min: String,
    pub max: String,
}

impl OutOfRange {
    fn new(field: &NumericField, value: f64) -> Self {
        Self {
            label: field.label,
            value,
            min: field.display(field.min),
            max: field.display(field.max),
        }
    }
}

/// One member's attributes, as submitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub age: u32,
    pub sex: Sex,
    pub bmi: f64,
    pub children: u32,
    pub smoker: Smoker,
    pub region: Region,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            age: AGE.default as u32,
            sex: Sex::OPTIONS[0],
            bmi: BMI.default,
            children: CHILDREN.default as u32,
            smoker: Smoker::OPTIONS[0],
            region: Region::OPTIONS[0],
        }
    }
}

impl QuoteRequest {
    /// Enforce the widget ranges.
    ///
    /// BMI is rounded to one decimal first, the precision the widget offers.
    pub fn validated(mut self) -> Result<Self, Vec<OutOfRange>> {
        self.bmi = round_to(self.bmi, BMI.decimals);

        let mut errors = Vec::new();
        if !AGE.contains(f64::from(self.age)) {
            errors.push(OutOfRange::new(&AGE, f64::from(self.age)));
        }
        if !self.bmi.is_finite() || !BMI.contains(self.bmi) {
            errors.push(OutOfRange::new(&BMI, self.bmi));
        }
        if !CHILDREN.contains(f64::from(self.children)) {
            errors.push(OutOfRange::new(&CHILDREN, f64::from(self.children)));
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }

    /// Build the single-row frame the preprocessor expects.
    pub fn to_row(&self) -> Row {
        Row::new()
            .with(columns::AGE, self.age)
            .with(columns::SEX, self.sex.label())
            .with(columns::BMI, self.bmi)
            .with(columns::CHILDREN, self.children)
            .with(columns::SMOKER, self.smoker.label())
            .with(columns::REGION, self.region.label())
    }

    /// `(column, value)` pairs for echoing the record back to the user,
    /// headed by the training column names.
    pub fn display_fields(&self) -> [(&'static str, String); 6] {
        [
            (columns::AGE, AGE.display(f64::from(self.age))),
            (columns::SEX, self.sex.to_string()),
            (columns::BMI, BMI.display(self.bmi)),
            (columns::CHILDREN, CHILDREN.display(f64::from(self.children))),
            (columns::SMOKER, self.smoker.to_string()),
            (columns::REGION, self.region.to_string()),
        ]
    }
}

fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals));
    (value * factor).round() / factor
}
