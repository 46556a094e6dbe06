//! Classifier adapters: Exported model encodings behind the `Classifier` port.
//!
//! Two encodings are supported, selected by the `kind` tag of `model.json`:
//!
//! - `gradient_boosting`: binary gradient-boosted regression trees. Each tree
//!   uses the flat node arrays of a fitted CART tree (`children_left`,
//!   `children_right`, `feature`, `threshold`, `value`; leaves have
//!   `children_left == -1`). The raw score is
//!   `init_raw + learning_rate * sum(leaf values)` and the probability is its
//!   logistic transform.
//! - `logistic`: `sigmoid(intercept + coefficients · x)`.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, SchemaMismatchError};
use crate::ports::Classifier;
use crate::{Result, VitalClarityError};

/// Classifier loaded from `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedClassifier {
    GradientBoosting(GradientBoostedTrees),
    Logistic(LogisticModel),
}

impl ExportedClassifier {
    /// Check structural consistency after deserialization.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn check(&self) -> std::result::Result<(), String> {
        match self {
            Self::GradientBoosting(m) => m.check(),
            Self::Logistic(m) => m.check(),
        }
    }
}

impl Classifier for ExportedClassifier {
    fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::GradientBoosting(m) => m.feature_names.as_deref(),
            Self::Logistic(m) => m.feature_names.as_deref(),
        }
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        match self {
            Self::GradientBoosting(m) => m.predict_proba(features),
            Self::Logistic(m) => m.predict_proba(features),
        }
    }
}

/// Binary gradient boosting ensemble (log-loss).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    /// Initial raw score (log-odds of the training prior)
    pub init_raw: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    fn check(&self) -> std::result::Result<(), String> {
        if !self.init_raw.is_finite() || !self.learning_rate.is_finite() {
            return Err("init_raw and learning_rate must be finite".into());
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".into());
        }
        let width = self.feature_names.as_ref().map(Vec::len);
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(width).map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        check_width(self.feature_names.as_deref(), features)?;
        let x = features.values();
        let mut raw = self.init_raw;
        for tree in &self.trees {
            raw += self.learning_rate * tree.predict(x)?;
        }
        Ok(sigmoid(raw))
    }
}

/// One fitted regression tree in flat array form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

const LEAF: i64 = -1;

impl RegressionTree {
    /// Nodes are stored in pre-order, so every child index is greater than its
    /// parent's. Checking that here guarantees `predict` terminates.
    fn check(&self, width: Option<usize>) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("empty tree".into());
        }
        if self.children_right.len() != n || self.feature.len() != n || self.threshold.len() != n || self.value.len() != n {
            return Err("node array lengths differ".into());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has only one child"));
                }
                if !self.value[node].is_finite() {
                    return Err(format!("leaf {node} value is not finite"));
                }
                continue;
            }

            for child in [left, right] {
                let ok = usize::try_from(child).map(|c| c > node && c < n).unwrap_or(false);
                if !ok {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }

            let feature = usize::try_from(self.feature[node]).map_err(|_| format!("node {node} has invalid feature index"))?;
            if width.is_some_and(|w| feature >= w) {
                return Err(format!("node {node} splits on feature {feature} beyond schema width"));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {node} threshold is NaN"));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf.
    ///
    /// Safe on an unchecked tree: bad indices are `Inference` errors.
    fn predict(&self, x: &[f64]) -> Result<f64> {
        let malformed = |node: usize| VitalClarityError::Inference(format!("malformed tree at node {node}"));

        let mut node = 0usize;
        loop {
            let left = *self.children_left.get(node).ok_or_else(|| malformed(node))?;
            if left == LEAF {
                return self.value.get(node).copied().ok_or_else(|| malformed(node));
            }
            let feature = self
                .feature
                .get(node)
                .and_then(|f| usize::try_from(*f).ok())
                .ok_or_else(|| malformed(node))?;
            let threshold = *self.threshold.get(node).ok_or_else(|| malformed(node))?;
            let value = *x.get(feature).ok_or_else(|| {
                VitalClarityError::Inference(format!("tree splits on feature {feature}, vector has {}", x.len()))
            })?;
            let next = if value <= threshold {
                left
            } else {
                *self.children_right.get(node).ok_or_else(|| malformed(node))?
            };
            node = match usize::try_from(next) {
                Ok(child) if child > node => child,
                _ => return Err(malformed(node)),
            };
        }
    }
}

/// Logistic regression over the full feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn check(&self) -> std::result::Result<(), String> {
        if let Some(names) = &self.feature_names {
            if names.len() != self.coefficients.len() {
                return Err(format!(
                    "{} coefficients for {} feature names",
                    self.coefficients.len(),
                    names.len()
                ));
            }
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("coefficients must be finite".into());
        }
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(SchemaMismatchError::new(
                "logistic model width",
                std::iter::repeat("coefficient").take(self.coefficients.len()),
                features.names(),
            )
            .into());
        }
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.values())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(sigmoid(z))
    }
}

fn check_width(names: Option<&[String]>, features: &FeatureVector) -> Result<()> {
    match names {
        Some(names) if names.len() != features.len() => {
            Err(SchemaMismatchError::new("classifier input width", names.iter(), features.names()).into())
        }
        _ => Ok(()),
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineeredFeatures, FeatureColumn};

    fn vector() -> FeatureVector {
        EngineeredFeatures {
            age: 1.0,
            gender: 2.0,
            height: 0.0,
            weight: 0.0,
            ap_hi: 0.0,
            ap_lo: 0.0,
            cholesterol: 3.0,
            gluc: 1.0,
            smoke: 0.0,
            alco: 0.0,
            active: 1.0,
            bmi: 24.0,
            age_category: 4,
            bp_category: 1,
            bmi_category: 1,
        }
        .project(None)
        .expect("assembly order")
    }

    fn stump(feature: i64, threshold: f64, left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    #[test]
    fn test_gradient_boosting_probability() {
        let model = GradientBoostedTrees {
            feature_names: None,
            init_raw: 0.0,
            learning_rate: 0.5,
            trees: vec![
                // cholesterol (index 6) = 3 goes right
                stump(6, 1.5, -1.0, 1.0),
                // bp_category (index 13) = 1 goes left; boundary is inclusive
                stump(13, 1.0, -0.4, 2.0),
            ],
        };
        assert!(model.check().is_ok());

        let p = model.predict_proba(&vector()).expect("Should predict");
        let expected = sigmoid(0.5 * (1.0 - 0.4));
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tree_check_rejects_cycles_and_bad_children() {
        let mut cyclic = stump(0, 0.0, 0.0, 0.0);
        cyclic.children_left[0] = 0;
        assert!(cyclic.check(None).is_err());

        let mut dangling = stump(0, 0.0, 0.0, 0.0);
        dangling.children_right[0] = 7;
        assert!(dangling.check(None).is_err());

        let mut one_child = stump(0, 0.0, 0.0, 0.0);
        one_child.children_right[1] = 2;
        assert!(one_child.check(None).is_err());

        assert!(stump(20, 0.0, 0.0, 0.0).check(Some(15)).is_err());
        assert!(stump(14, 0.0, 0.0, 0.0).check(Some(15)).is_ok());
    }

    #[test]
    fn test_unchecked_tree_reports_malformed_nodes() {
        let features = vector();
        let x = features.values();
        // age (index 0) = 1.0 sends every stump below to the right child.

        let mut short_values = stump(0, 0.0, -1.0, 1.0);
        short_values.value.truncate(2);
        let mut short_thresholds = stump(0, 0.0, -1.0, 1.0);
        short_thresholds.threshold.clear();
        let mut short_right = stump(0, 0.0, -1.0, 1.0);
        short_right.children_right.clear();
        let mut short_features = stump(0, 0.0, -1.0, 1.0);
        short_features.feature.clear();

        for tree in [short_values, short_thresholds, short_right, short_features] {
            let err = tree.predict(x).expect_err("malformed tree");
            assert!(matches!(err, VitalClarityError::Inference(ref m) if m.contains("malformed")));
        }

        assert_eq!(stump(0, 0.0, -1.0, 1.0).predict(x).expect("Should predict"), 1.0);
    }

    #[test]
    fn test_logistic_probability() {
        let mut coefficients = vec![0.0; 15];
        coefficients[0] = 0.8;
        let model = LogisticModel {
            feature_names: Some(FeatureColumn::ALL.iter().map(|c| c.name().to_string()).collect()),
            coefficients,
            intercept: -0.3,
        };
        assert!(model.check().is_ok());
        let p = model.predict_proba(&vector()).expect("Should predict");
        assert!((p - sigmoid(0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_schema_width_mismatch() {
        let model = ExportedClassifier::Logistic(LogisticModel {
            feature_names: None,
            coefficients: vec![1.0; 3],
            intercept: 0.0,
        });
        let err = model.predict_proba(&vector()).expect_err("width mismatch");
        assert!(matches!(err, VitalClarityError::SchemaMismatch(_)));
    }

    #[test]
    fn test_deserializes_tagged_json() {
        let json = r#"{
            "kind": "gradient_boosting",
            "init_raw": 0.1,
            "learning_rate": 0.1,
            "trees": [{
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [0, -2, -2],
                "threshold": [0.0, -2.0, -2.0],
                "value": [0.0, -0.5, 0.5]
            }]
        }"#;
        let model: ExportedClassifier = serde_json::from_str(json).expect("Should parse");
        assert!(model.check().is_ok());
        assert!(model.feature_names().is_none());
    }
}
