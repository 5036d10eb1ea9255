//! Fitted cost model.
//!
//! Two exported families are supported: a linear regressor and a tree ensemble
//! (random forest averages leaves, gradient boosting sums them with a learning
//! rate on top of a base score).

use serde::Deserialize;
use thiserror::Error;

use super::{FormatError, FORMAT_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("X has {found} features, but the model is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, found: usize },
}

/// A tree node. Splits send `x[feature] <= threshold` to `left`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Children always point forward, so the walk terminates.
    fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {index} splits on feature {feature} but the model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(format!(
                                "node {index} points to invalid child {child}"
                            ));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {index} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of leaf values.
    Mean,
    /// Gradient boosting: `base_score + learning_rate * sum`.
    Sum,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear {
        n_features: usize,
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        n_features: usize,
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
        #[serde(default = "one")]
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    format_version: u32,
    #[serde(flatten)]
    model: Model,
}

impl Model {
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let file: ModelFile = serde_json::from_str(json)?;
        if file.format_version != FORMAT_VERSION {
            return Err(FormatError::Version {
                found: file.format_version,
                expected: FORMAT_VERSION,
            });
        }
        file.model.validate().map_err(FormatError::Invalid)?;
        Ok(file.model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Model::Linear { .. } => "linear",
            Model::TreeEnsemble { .. } => "tree_ensemble",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Model::Linear { n_features, .. } | Model::TreeEnsemble { n_features, .. } => {
                *n_features
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Model::Linear {
                n_features,
                intercept,
                coefficients,
            } => {
                if coefficients.len() != *n_features {
                    return Err(format!(
                        "linear model declares {n_features} features but has {} coefficients",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model parameters must be finite".to_string());
                }
            }
            Model::TreeEnsemble {
                n_features,
                base_score,
                learning_rate,
                trees,
                ..
            } => {
                if trees.is_empty() {
                    return Err("tree ensemble has no trees".to_string());
                }
                if !base_score.is_finite() || !learning_rate.is_finite() {
                    return Err("tree ensemble parameters must be finite".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features)
                        .map_err(|e| format!("tree {i}: {e}"))?;
                }
            }
        }
        Ok(())
    }

    fn predict_one(&self, x: &[f64]) -> f64 {
        match self {
            Model::Linear {
                intercept,
                coefficients,
                ..
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            Model::TreeEnsemble {
                aggregation,
                base_score,
                learning_rate,
                trees,
                ..
            } => {
                let total: f64 = trees.iter().map(|t| t.leaf_value(x)).sum();
                match aggregation {
                    Aggregation::Mean => total / trees.len() as f64,
                    Aggregation::Sum => base_score + learning_rate * total,
                }
            }
        }
    }

    /// Predict a batch of rows. Every row must have `n_features` values.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, PredictError> {
        let expected = self.n_features();
        rows.iter()
            .map(|x| {
                if x.len() != expected {
                    return Err(PredictError::ShapeMismatch {
                        expected,
                        found: x.len(),
                    });
                }
                Ok(self.predict_one(x))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOREST: &str = r#"{
        "format_version": 1,
        "kind": "tree_ensemble",
        "n_features": 2,
        "aggregation": "mean",
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 },
                { "value": 1000.0 },
                { "value": 3000.0 }
            ] },
            { "nodes": [
                { "feature": 1, "threshold": 10.0, "left": 1, "right": 2 },
                { "value": 2000.0 },
                { "value": 4000.0 }
            ] }
        ]
    }"#;

    #[test]
    fn test_linear_predict() {
        let json = r#"{"format_version": 1, "kind": "linear", "n_features": 2,
                       "intercept": 100.0, "coefficients": [2.0, -1.0]}"#;
        let model = Model::from_json(json).unwrap();
        assert_eq!(model.kind(), "linear");
        let out = model.predict(&[vec![10.0, 5.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(out, vec![115.0, 100.0]);
    }

    #[test]
    fn test_forest_averages_leaves() {
        let model = Model::from_json(FOREST).unwrap();
        assert_eq!(model.predict(&[vec![0.0, 20.0]]).unwrap(), vec![2500.0]);
        assert_eq!(model.predict(&[vec![1.0, 0.0]]).unwrap(), vec![2500.0]);
        assert_eq!(model.predict(&[vec![1.0, 20.0]]).unwrap(), vec![3500.0]);
    }

    #[test]
    fn test_boosting_sums_with_learning_rate() {
        let json = FOREST
            .replace(r#""aggregation": "mean""#, r#""aggregation": "sum", "base_score": 500.0, "learning_rate": 0.5"#);
        let model = Model::from_json(&json).unwrap();
        assert_eq!(model.predict(&[vec![0.0, 0.0]]).unwrap(), vec![2000.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let model = Model::from_json(FOREST).unwrap();
        assert_eq!(
            model.predict(&[vec![1.0]]),
            Err(PredictError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_rejects_backward_child_pointer() {
        let json = r#"{"format_version": 1, "kind": "tree_ensemble", "n_features": 1,
            "aggregation": "mean",
            "trees": [{"nodes": [{"feature": 0, "threshold": 1.0, "left": 0, "right": 1}, {"value": 1.0}]}]}"#;
        let err = Model::from_json(json).unwrap_err();
        assert!(err.to_string().contains("invalid child 0"));
    }

    #[test]
    fn test_rejects_coefficient_count_mismatch() {
        let json = r#"{"format_version": 1, "kind": "linear", "n_features": 3,
                       "intercept": 0.0, "coefficients": [1.0]}"#;
        assert!(matches!(Model::from_json(json), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let json = r#"{"format_version": 1, "kind": "svm", "n_features": 1}"#;
        assert!(matches!(Model::from_json(json), Err(FormatError::Json(_))));
    }
}
