//! Model ports: Narrow read-only interfaces over the fitted artifacts.
//!
//! The scoring core only needs "transform these columns" and "give me the
//! positive-class probability". Keeping the traits this small isolates the
//! pipeline from how the artifacts are serialized.

use crate::domain::FeatureVector;
use crate::Result;

/// A fitted numeric scaler.
pub trait Scaler: Send + Sync {
    /// Column names the scaler was fitted on, in input order.
    fn feature_names(&self) -> &[String];

    /// Scale one row. `row` must follow `feature_names()`.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the row width does not match the scaler.
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>>;
}

/// A fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Column names the classifier was trained on, if it recorded them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Probability of the positive (high-risk) class.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the vector does not fit the model, or
    /// `Inference` if evaluation fails.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64>;
}
