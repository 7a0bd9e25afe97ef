//! Trained regressors

use crate::error::ModelError;
use ndarray::{ArrayView1, ArrayView2};
use serde::Deserialize;

/// Scores every row of a feature matrix.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Persisted model variants
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self {
            ModelArtifact::Linear(model) => Box::new(model),
            ModelArtifact::TreeEnsemble(model) => Box::new(model),
        }
    }
}

/// `X . coefficients + intercept`. Covers ordinary least squares, ridge and lasso fits.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        if features.ncols() != self.coefficients.len() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.coefficients.len(),
                actual: features.ncols(),
            });
        }
        let coefficients = ArrayView1::from(&self.coefficients);
        let scores = features.dot(&coefficients) + self.intercept;
        Ok(scores.to_vec())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// How per-tree outputs are combined
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Boosted ensembles
    #[default]
    Sum,
    /// Bagged ensembles such as random forests
    Mean,
}

/// A tree node: either a threshold split or a leaf.
#[derive(Debug, Clone, Deserialize)]
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

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root; a row goes left when `x[feature] <= threshold`.
    fn evaluate(&self, tree: usize, row: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        let malformed = |reason: String| ModelError::MalformedTree { tree, reason };

        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(index)
                .ok_or_else(|| malformed(format!("node {index} does not exist")))?;
            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row
                        .get(*feature)
                        .ok_or_else(|| malformed(format!("feature {feature} out of range")))?;
                    index = if *x <= *threshold { *left } else { *right };
                }
            }
        }
        Err(malformed("no leaf reached".to_string()))
    }
}

/// Gradient boosted or bagged regression trees.
///
/// Prediction is `base_score + learning_rate * aggregate(tree outputs)`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub trees: Vec<Tree>,
}

fn default_learning_rate() -> f64 {
    1.0
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        if features.ncols() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }

        features
            .rows()
            .into_iter()
            .map(|row| -> Result<f64, ModelError> {
                let mut total = 0.0;
                for (i, tree) in self.trees.iter().enumerate() {
                    total += tree.evaluate(i, row)?;
                }
                let combined = match self.aggregation {
                    Aggregation::Sum => total,
                    Aggregation::Mean if self.trees.is_empty() => 0.0,
                    Aggregation::Mean => total / self.trees.len() as f64,
                };
                Ok(self.base_score + self.learning_rate * combined)
            })
            .collect()
    }

    fn name(&self) -> &str {
        match self.aggregation {
            Aggregation::Sum => "boosted_trees",
            Aggregation::Mean => "random_forest",
        }
    }
}
