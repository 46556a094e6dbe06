//! # Vital Clarity
//!
//! Cardiovascular risk scoring from vital signs and lifestyle indicators.
//!
//! This crate provides:
//! - The feature pipeline that turns a raw patient record into the exact
//!   feature vector the classifier was trained on
//! - Thresholded scoring against pre-fitted scaler/classifier/threshold artifacts
//! - Artifact discovery with integrity checks and a degraded mode
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, FeatureVector, ScoredResult, binning)
//! - `ports`: Trait definitions for the fitted artifacts (Scaler, Classifier)
//! - `adapters`: Concrete artifact encodings and the artifact store
//! - `application`: Feature pipeline and scoring engine

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use adapters::artifacts::{ArtifactLoadError, ArtifactLocations, ArtifactStore, ModelArtifacts};
pub use application::{score, FeaturePipeline, RiskService};
pub use domain::{FeatureVector, PatientRecord, RiskLabel, ScoredResult};

/// Result type for Vital Clarity operations
pub type Result<T> = std::result::Result<T, VitalClarityError>;

/// Main error type for Vital Clarity
#[derive(Debug, thiserror::Error)]
pub enum VitalClarityError {
    #[error("Failed to load model artifacts: {0}")]
    ArtifactLoad(#[from] ArtifactLoadError),

    #[error("Model artifacts are not loaded")]
    ModelUnavailable,

    #[error("Invalid feature value: {0}")]
    FeatureDomain(#[from] domain::FeatureDomainError),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(#[from] domain::SchemaMismatchError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
