//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the on-disk artifact encodings:
//! - `artifacts`: discovery, manifest verification and the artifact store
//! - `scaler`: fitted z-score scaler
//! - `classifier`: gradient-boosted trees and logistic models

pub mod artifacts;
pub mod classifier;
pub mod scaler;

