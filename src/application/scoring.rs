//! Scoring engine: Applies the classifier and threshold to a feature vector.

use std::sync::Arc;

use crate::adapters::artifacts::{ArtifactStore, ModelStatus};
use crate::domain::{FeatureVector, PatientRecord, SchemaMismatchError, ScoredResult};
use crate::{Result, VitalClarityError};

use super::FeaturePipeline;

/// Score one feature vector against the loaded artifacts.
///
/// Single deterministic pass: no retries, and no default prediction when the
/// model is missing.
///
/// # Errors
/// - `ModelUnavailable` if the store is degraded
/// - `SchemaMismatch` if the vector is not in the classifier's column order
/// - `Inference` if the classifier returns an unusable probability
pub fn score(vector: &FeatureVector, store: &ArtifactStore) -> Result<ScoredResult> {
    let artifacts = store.artifacts().ok_or(VitalClarityError::ModelUnavailable)?;
    let classifier = artifacts.classifier();

    if let Some(schema) = classifier.feature_names() {
        if !schema.iter().map(String::as_str).eq(vector.names()) {
            return Err(SchemaMismatchError::new("classifier feature schema", schema.iter(), vector.names()).into());
        }
    }

    let probability = classifier.predict_proba(vector)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(VitalClarityError::Inference(format!(
            "classifier returned probability {probability} outside [0, 1]"
        )));
    }

    Ok(ScoredResult::from_probability(probability, artifacts.threshold()))
}

/// Scoring context built once at startup and shared by every request.
///
/// Cloning is cheap; clones share the same artifacts.
#[derive(Debug, Clone)]
pub struct RiskService {
    store: Arc<ArtifactStore>,
}

impl RiskService {
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    #[must_use]
    pub fn status(&self) -> ModelStatus {
        self.store.status()
    }

    /// Build the feature vector for a record.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if degraded, otherwise any pipeline error.
    pub fn features(&self, record: &PatientRecord) -> Result<FeatureVector> {
        let artifacts = self.store.artifacts().ok_or(VitalClarityError::ModelUnavailable)?;
        let pipeline = FeaturePipeline::new(artifacts.scaler(), artifacts.classifier().feature_names())?;
        pipeline.transform(record)
    }

    /// Run the feature pipeline and score the result.
    ///
    /// Logs exactly one line per call.
    ///
    /// # Errors
    /// Returns the first pipeline or scoring error; no partial result.
    pub fn assess(&self, record: &PatientRecord) -> Result<ScoredResult> {
        let result = self.features(record).and_then(|vector| score(&vector, &self.store));

        match &result {
            Ok(scored) => tracing::info!(
                "Prediction made: risk={}, probability={:.4}",
                scored.prediction,
                scored.probability
            ),
            Err(VitalClarityError::ModelUnavailable) => {
                tracing::error!("Prediction attempted with model artifacts not loaded");
            }
            Err(e) => tracing::warn!("Prediction failed: {e}"),
        }

        result
    }
}
