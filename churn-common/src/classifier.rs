//! Pre-trained churn classifier
//!
//! Two model families are supported, both read from the classifier artifact:
//!
//! - **Random forest**: decision trees stored as flat node arrays. A split
//!   sends a sample left when `x[feature] <= threshold`. Each leaf holds
//!   per-class weights; the forest averages the normalized leaf
//!   distributions and picks the most probable class.
//! - **Logistic regression**: linear decision function; the second class is
//!   chosen when the decision value is strictly positive.
//!
//! The artifact document is validated once and turned into fitted `ndarray`
//! parameters. Prediction is a pure function of those parameters and the
//! input rows.

use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

/// Classifier artifact as stored on disk
#[derive(Debug, Deserialize)]
struct ClassifierDocument {
    schema_version: u32,
    feature_names: Vec<String>,
    classes: Vec<i64>,
    model: ModelDocument,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ModelDocument {
    RandomForest { trees: Vec<TreeDocument> },
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
}

#[derive(Debug, Deserialize)]
struct TreeDocument {
    nodes: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NodeDocument {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Loaded, validated classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Version of the feature schema the model was trained against
    pub schema_version: u32,
    /// Input column names, in training order
    pub feature_names: Vec<String>,
    /// Class labels, indexed like the probability columns
    pub classes: Vec<i64>,
    model: FittedModel,
}

#[derive(Debug, Clone)]
enum FittedModel {
    RandomForest(Vec<FittedTree>),
    LogisticRegression {
        coefficients: Array1<f64>,
        intercept: f64,
    },
}

#[derive(Debug, Clone)]
struct FittedTree {
    nodes: Vec<Node>,
    /// Normalized class distribution of each leaf, one row per leaf
    leaves: Array2<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Row of [`FittedTree::leaves`]
    Leaf(usize),
}

/// Label and class probabilities for one input row
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub label: i64,
    /// One entry per class, same order as [`Classifier::classes`]
    pub probabilities: Vec<f64>,
}

impl Classifier {
    /// Parse and validate a classifier artifact
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: ClassifierDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    fn from_document(document: ClassifierDocument) -> Result<Self> {
        let n_classes = document.classes.len();
        if n_classes < 2 {
            return Err(Error::Artifact(format!(
                "classifier needs at least 2 classes, found {}",
                n_classes
            )));
        }

        let n_features = document.feature_names.len();
        let model = match document.model {
            ModelDocument::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(Error::Artifact("random forest has no trees".to_string()));
                }
                let fitted = trees
                    .into_iter()
                    .enumerate()
                    .map(|(index, tree)| {
                        FittedTree::build(tree, n_features, n_classes)
                            .map_err(|e| Error::Artifact(format!("tree {}: {}", index, e)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                FittedModel::RandomForest(fitted)
            }
            ModelDocument::LogisticRegression { coefficients, intercept } => {
                if n_classes != 2 {
                    return Err(Error::Artifact(
                        "logistic regression supports exactly 2 classes".to_string(),
                    ));
                }
                if coefficients.len() != n_features {
                    return Err(Error::Artifact(format!(
                        "logistic regression has {} coefficients for {} features",
                        coefficients.len(),
                        n_features
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(Error::Artifact(
                        "logistic regression weights must be finite".to_string(),
                    ));
                }
                FittedModel::LogisticRegression {
                    coefficients: Array1::from(coefficients),
                    intercept,
                }
            }
        };

        Ok(Self {
            schema_version: document.schema_version,
            feature_names: document.feature_names,
            classes: document.classes,
            model,
        })
    }

    /// Short model family name for logs and health output
    pub fn kind(&self) -> &'static str {
        match self.model {
            FittedModel::RandomForest(_) => "random_forest",
            FittedModel::LogisticRegression { .. } => "logistic_regression",
        }
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Predict every row of `features` (samples x features)
    ///
    /// Errors (wrong width, non-finite input) are returned as plain messages;
    /// the prediction pipeline wraps them.
    pub fn predict_batch(&self, features: &Array2<f64>) -> std::result::Result<Vec<ClassifierOutput>, String> {
        if features.ncols() != self.n_features() {
            return Err(format!(
                "expected {} features, got {}",
                self.n_features(),
                features.ncols()
            ));
        }
        if let Some(((_, column), _)) = features.indexed_iter().find(|(_, x)| !x.is_finite()) {
            return Err(format!(
                "feature '{}' is not a finite number",
                self.feature_names[column]
            ));
        }

        let outputs = match &self.model {
            FittedModel::RandomForest(trees) => {
                let mut totals = Array2::<f64>::zeros((features.nrows(), self.classes.len()));
                for tree in trees {
                    for (sample, mut total) in features.outer_iter().zip(totals.outer_iter_mut()) {
                        total += &tree.distribution(sample);
                    }
                }
                totals /= trees.len() as f64;

                totals
                    .outer_iter()
                    .map(|probabilities| ClassifierOutput {
                        label: self.classes[argmax(probabilities)],
                        probabilities: probabilities.to_vec(),
                    })
                    .collect()
            }
            FittedModel::LogisticRegression { coefficients, intercept } => {
                let decision = features.dot(coefficients) + *intercept;
                decision
                    .iter()
                    .map(|&z| {
                        let p = 1.0 / (1.0 + (-z).exp());
                        // Decide on the sign of z, not on p, so that rounding
                        // in the sigmoid can never flip a label.
                        let label = if z > 0.0 { self.classes[1] } else { self.classes[0] };
                        ClassifierOutput {
                            label,
                            probabilities: vec![1.0 - p, p],
                        }
                    })
                    .collect()
            }
        };

        Ok(outputs)
    }

    /// Predict a single row
    pub fn predict(&self, features: &[f64]) -> std::result::Result<ClassifierOutput, String> {
        let row = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| e.to_string())?;
        self.predict_batch(&row)?
            .pop()
            .ok_or_else(|| "classifier produced no output".to_string())
    }

    /// Probability of `label` in `output`, if the class is known
    pub fn probability_of(&self, output: &ClassifierOutput, label: i64) -> Option<f64> {
        self.classes
            .iter()
            .position(|c| *c == label)
            .and_then(|i| output.probabilities.get(i).copied())
    }
}

impl FittedTree {
    /// Check the node array and normalize leaf weights
    ///
    /// Children always follow their parent (pre-order layout), so walking a
    /// valid tree always terminates at a leaf.
    fn build(tree: TreeDocument, n_features: usize, n_classes: usize) -> std::result::Result<Self, String> {
        if tree.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let n_nodes = tree.nodes.len();
        let mut nodes = Vec::with_capacity(n_nodes);
        let mut leaf_weights = Vec::new();

        for (index, node) in tree.nodes.into_iter().enumerate() {
            match node {
                NodeDocument::Split { feature, threshold, left, right } => {
                    if feature >= n_features {
                        return Err(format!("node {} splits on unknown feature {}", index, feature));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", index));
                    }
                    for child in [left, right] {
                        if child <= index || child >= n_nodes {
                            return Err(format!("node {} has invalid child {}", index, child));
                        }
                    }
                    nodes.push(Node::Split { feature, threshold, left, right });
                }
                NodeDocument::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} weights for {} classes",
                            index,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {} has a negative or non-finite weight", index));
                    }
                    let total: f64 = value.iter().sum();
                    if total <= 0.0 {
                        return Err(format!("leaf {} has zero total weight", index));
                    }
                    nodes.push(Node::Leaf(leaf_weights.len() / n_classes));
                    leaf_weights.extend(value.iter().map(|w| w / total));
                }
            }
        }

        let n_leaves = leaf_weights.len() / n_classes;
        let leaves = Array2::from_shape_vec((n_leaves, n_classes), leaf_weights)
            .map_err(|e| e.to_string())?;

        Ok(Self { nodes, leaves })
    }

    /// Class distribution of the leaf `sample` lands in
    fn distribution(&self, sample: ArrayView1<'_, f64>) -> ArrayView1<'_, f64> {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Split { feature, threshold, left, right } => {
                    index = if sample[feature] <= threshold { left } else { right };
                }
                Node::Leaf(row) => return self.leaves.row(row),
            }
        }
    }
}

/// Index of the first maximum
fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
