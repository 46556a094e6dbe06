//! Application layer: Use cases and services.
//!
//! This module orchestrates the domain types with the artifact ports to
//! implement the two core use cases: building the feature vector and scoring
//! it.

mod pipeline;
mod scoring;

pub use pipeline::{bmi, FeaturePipeline, RawFeatures, DAYS_PER_YEAR};
pub use scoring::{score, RiskService};
