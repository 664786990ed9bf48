//! Gradient boosted tree ensembles loaded from XGBoost's JSON model format.
//!
//! Only the `gbtree` booster with an identity-link regression objective is
//! supported, which covers models trained with `XGBRegressor()` defaults.
//! Evaluation mirrors XGBoost's own: inputs are compared in `f32`, a NaN input
//! follows the node's default branch and `value < split_condition` goes left.

use serde::Deserialize;

use super::{FeatureVector, Regressor};
use crate::error::{ForecastError, ForecastResult};

const SUPPORTED_OBJECTIVES: [&str; 4] = [
    "reg:squarederror",
    "reg:linear",
    "reg:absoluteerror",
    "reg:pseudohubererror",
];

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    model: Option<BoosterModel>,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    trees: Vec<RawTree>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

/// Older dumps write `default_left` as 0/1, newer ones as booleans.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

#[derive(Debug, Clone)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// Split threshold for inner nodes, output value for leaves
    value: f32,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(index: usize, raw: RawTree, num_feature: usize) -> ForecastResult<Self> {
        let n = raw.left_children.len();
        if [
            raw.right_children.len(),
            raw.split_indices.len(),
            raw.split_conditions.len(),
            raw.default_left.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(ForecastError::Model(format!("tree {index}: node arrays differ in length")));
        }
        if n == 0 {
            return Err(ForecastError::Model(format!("tree {index} is empty")));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = raw.left_children[i];
            let right = raw.right_children[i];
            let feature = raw.split_indices[i] as usize;
            if left != -1 {
                let in_range = |c: i32| c > i as i32 && (c as usize) < n;
                if !in_range(left) || !in_range(right) {
                    return Err(ForecastError::Model(format!(
                        "tree {index} node {i}: child index out of range"
                    )));
                }
                if feature >= num_feature {
                    return Err(ForecastError::Model(format!(
                        "tree {index} node {i}: split on feature {feature}, model has {num_feature}"
                    )));
                }
            }
            nodes.push(Node {
                left,
                right,
                feature,
                value: raw.split_conditions[i],
                default_left: raw.default_left[i].is_set(),
            });
        }
        Ok(Self { nodes })
    }

    /// Children always have larger indices than their parent, so the walk
    /// terminates.
    fn leaf_value(&self, features: &[f64]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.left == -1 {
                return node.value;
            }
            let x = features[node.feature] as f32;
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                x < node.value
            };
            let next = if go_left { node.left } else { node.right };
            idx = next as usize;
        }
    }
}

/// Tree ensemble: `base_score + Σ tree(x)`
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    base_score: f32,
    num_feature: usize,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    pub fn from_json_str(raw: &str) -> ForecastResult<Self> {
        let file: ModelFile = serde_json::from_str(raw)?;
        let learner = file.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ForecastError::Model(format!(
                "unsupported booster '{}'",
                learner.gradient_booster.name
            )));
        }
        if !SUPPORTED_OBJECTIVES.contains(&learner.objective.name.as_str()) {
            return Err(ForecastError::Model(format!(
                "unsupported objective '{}'",
                learner.objective.name
            )));
        }

        let base_score = parse_param::<f32>("base_score", &learner.learner_model_param.base_score)?;
        let num_feature = parse_param::<usize>("num_feature", &learner.learner_model_param.num_feature)?;

        let raw_trees = learner
            .gradient_booster
            .model
            .map(|m| m.trees)
            .unwrap_or_default();
        let trees = raw_trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_raw(i, t, num_feature))
            .collect::<ForecastResult<Vec<_>>>()?;

        Ok(Self {
            base_score,
            num_feature,
            trees,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

/// Model params are stored as strings; 2.x writes vector params as `"[5E-1]"`.
fn parse_param<T: std::str::FromStr>(name: &str, raw: &str) -> ForecastResult<T> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or_default().trim();
    first
        .parse::<T>()
        .map_err(|_| ForecastError::Model(format!("invalid {name} '{raw}'")))
}

impl Regressor for GradientBoostedTrees {
    fn predict(&self, features: &FeatureVector) -> ForecastResult<f64> {
        if features.len() != self.num_feature {
            return Err(ForecastError::Model(format!(
                "feature count mismatch: expected {}, got {}",
                self.num_feature,
                features.len()
            )));
        }
        let margin = self
            .trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.leaf_value(&features.values));
        Ok(f64::from(margin))
    }

    fn input_width(&self) -> usize {
        self.num_feature
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ml::FeatureSchema;

    /// Two stumps over the calendar schema: one on `hour` (index 0), one on
    /// `temperature` (index 6).
    pub(crate) fn two_stump_model() -> String {
        serde_json::json!({
            "learner": {
                "attributes": {},
                "feature_names": [],
                "feature_types": [],
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {
                        "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                        "tree_info": [0, 0],
                        "trees": [
                            {
                                "id": 0,
                                "left_children": [1, -1, -1],
                                "right_children": [2, -1, -1],
                                "split_indices": [0, 0, 0],
                                "split_conditions": [18.0, 100.0, 500.0],
                                "default_left": [1, 0, 0],
                                "base_weights": [0.0, 100.0, 500.0]
                            },
                            {
                                "id": 1,
                                "left_children": [1, -1, -1],
                                "right_children": [2, -1, -1],
                                "split_indices": [6, 0, 0],
                                "split_conditions": [10.0, 50.0, -25.0],
                                "default_left": [false, false, false],
                                "base_weights": [0.0, 50.0, -25.0]
                            }
                        ]
                    }
                },
                "learner_model_param": {
                    "base_score": "[1E3]",
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "14",
                    "num_target": "1"
                },
                "objective": {"name": "reg:squarederror", "reg_loss_param": {"scale_pos_weight": "1"}}
            },
            "version": [2, 1, 0]
        })
        .to_string()
    }

    fn row(hour: f64, temperature: f64) -> FeatureVector {
        let mut values = vec![0.0; 14];
        values[0] = hour;
        values[6] = temperature;
        FeatureVector::new(FeatureSchema::Calendar, values).unwrap()
    }

    #[test]
    fn test_loads_model() {
        let model = GradientBoostedTrees::from_json_str(&two_stump_model()).unwrap();
        assert_eq!(model.tree_count(), 2);
        assert_eq!(model.input_width(), 14);
    }

    #[test]
    fn test_predict_sums_leaves_and_base_score() {
        let model = GradientBoostedTrees::from_json_str(&two_stump_model()).unwrap();

        assert_eq!(model.predict(&row(12.0, 5.0)).unwrap(), 1000.0 + 100.0 + 50.0);
        assert_eq!(model.predict(&row(19.0, 5.0)).unwrap(), 1000.0 + 500.0 + 50.0);
        assert_eq!(model.predict(&row(19.0, 20.0)).unwrap(), 1000.0 + 500.0 - 25.0);
        // equality goes right
        assert_eq!(model.predict(&row(18.0, 10.0)).unwrap(), 1000.0 + 500.0 - 25.0);
    }

    #[test]
    fn test_missing_value_follows_default_branch() {
        let model = GradientBoostedTrees::from_json_str(&two_stump_model()).unwrap();
        // hour NaN -> default left (100); temperature NaN -> default right (-25)
        assert_eq!(model.predict(&row(f64::NAN, f64::NAN)).unwrap(), 1000.0 + 100.0 - 25.0);
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let raw = two_stump_model().replace("reg:squarederror", "binary:logistic");
        let err = GradientBoostedTrees::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ForecastError::Model(ref m) if m.contains("binary:logistic")));
    }

    #[test]
    fn test_rejects_out_of_range_split_feature() {
        let raw = two_stump_model().replace("\"num_feature\":\"14\"", "\"num_feature\":\"4\"");
        assert!(GradientBoostedTrees::from_json_str(&raw).is_err());
    }

    #[test]
    fn test_parse_param_forms() {
        assert_eq!(parse_param::<f32>("base_score", "5E-1").unwrap(), 0.5);
        assert_eq!(parse_param::<f32>("base_score", "[5E-1]").unwrap(), 0.5);
        assert_eq!(parse_param::<usize>("num_feature", "14").unwrap(), 14);
        assert!(parse_param::<usize>("num_feature", "abc").is_err());
    }
}
