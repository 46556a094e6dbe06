//! Right-closed interval binning for the engineered categorical features.
//!
//! Bins are `(edges[i], edges[i + 1]]` and map to labels `1..=n`. A value on a
//! boundary belongs to the lower bin. Values outside every bin are rejected
//! instead of clamped.

use super::FeatureDomainError;

/// A fixed set of contiguous right-closed bins.
#[derive(Debug, Clone, Copy)]
pub struct Bins {
    field: &'static str,
    edges: &'static [f64],
}

/// Age category over the *scaled* age value.
pub const AGE_BINS: Bins = Bins::new("age_category", &[f64::NEG_INFINITY, -0.4, 0.0, 0.5, f64::INFINITY]);

/// Blood-pressure category over raw systolic pressure.
pub const BP_BINS: Bins = Bins::new("bp_category", &[0.0, 120.0, 130.0, 140.0, 1000.0]);

/// BMI category over raw BMI.
pub const BMI_BINS: Bins = Bins::new("bmi_category", &[0.0, 25.0, 30.0, 35.0, 100.0]);

impl Bins {
    const fn new(field: &'static str, edges: &'static [f64]) -> Self {
        Self { field, edges }
    }

    /// Name of the feature these bins produce.
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Label (1-based) of the bin containing `value`.
    ///
    /// # Errors
    /// Returns `FeatureDomainError` when `value` is NaN or outside
    /// `(edges[0], edges[n]]`.
    pub fn categorize(&self, value: f64) -> Result<u8, FeatureDomainError> {
        self.edges
            .windows(2)
            .position(|w| value > w[0] && value <= w[1])
            .and_then(|i| u8::try_from(i + 1).ok())
            .ok_or_else(|| {
                let lo = self.edges.first().copied().unwrap_or(f64::NAN);
                let hi = self.edges.last().copied().unwrap_or(f64::NAN);
                FeatureDomainError::new(self.field, value, format!("outside binning range ({lo}, {hi}]"))
            })
    }
}
