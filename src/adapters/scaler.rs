//! Standard scaler adapter.
//!
//! Mirrors a fitted z-score scaler exported as JSON:
//!
//! ```json
//! { "feature_names": ["age", "height", "weight", "ap_hi", "ap_lo"],
//!   "mean": [...], "scale": [...] }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::SchemaMismatchError;
use crate::ports::Scaler;
use crate::Result;

/// Fitted z-score scaler: `(x - mean) / scale` per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler and check its parameters.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> std::result::Result<Self, String> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.check()?;
        Ok(scaler)
    }

    /// Check parameter shapes and values after deserialization.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn check(&self) -> std::result::Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("scaler has no columns".into());
        }
        if self.mean.len() != n || self.scale.len() != n {
            return Err(format!(
                "scaler parameter lengths do not match feature_names (names={n}, mean={}, scale={})",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("scaler mean for {} is not finite", self.feature_names[i]));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s <= 0.0) {
            return Err(format!(
                "scaler scale for {} must be finite and positive",
                self.feature_names[i]
            ));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.feature_names.len() {
            return Err(SchemaMismatchError::new(
                "scaler input width",
                self.feature_names.iter(),
                (0..row.len()).map(|i| format!("column {i}")),
            )
            .into());
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
