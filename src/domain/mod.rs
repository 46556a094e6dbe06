//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. The feature schema,
//! binning rules and result types live here so the pipeline and the
//! artifact adapters agree on one definition.

mod assessment;
pub mod binning;
mod features;
mod patient;

pub use assessment::{RiskLabel, ScoredResult};
pub use features::{EngineeredFeatures, FeatureColumn, FeatureDomainError, FeatureVector, SchemaMismatchError};
pub use patient::PatientRecord;

#[cfg(test)]
pub(crate) use patient::tests::{high_risk_record, low_risk_record};
