//! Patient record for cardiovascular risk prediction.
//!
//! Field names follow the cardio training dataset (`ap_hi`, `gluc`, `alco`, ...)
//! so the wire schema and the model schema line up one to one.

use serde::{Deserialize, Serialize};

use super::FeatureDomainError;

/// Raw clinical inputs for one prediction.
///
/// All eleven fields are required; there are no implicit defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,

    /// 1 = female, 2 = male
    pub gender: u8,

    /// Height in centimeters
    pub height: f64,

    /// Weight in kilograms
    pub weight: f64,

    /// Systolic blood pressure (mmHg)
    pub ap_hi: f64,

    /// Diastolic blood pressure (mmHg)
    pub ap_lo: f64,

    /// Cholesterol: 1 = normal, 2 = above normal, 3 = well above normal
    pub cholesterol: u8,

    /// Glucose: 1 = normal, 2 = above normal, 3 = well above normal
    pub gluc: u8,

    /// Smoker: 0 = no, 1 = yes
    pub smoke: u8,

    /// Alcohol intake: 0 = no, 1 = yes
    pub alco: u8,

    /// Physically active: 0 = no, 1 = yes
    pub active: u8,
}

impl PatientRecord {
    /// Check type and range constraints.
    ///
    /// This is not a medical plausibility check: a systolic pressure of 300 is
    /// accepted here and rejected later only if it falls outside the binning
    /// ranges.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), FeatureDomainError> {
        positive("age", self.age)?;
        positive("height", self.height)?;
        positive("weight", self.weight)?;
        finite("ap_hi", self.ap_hi)?;
        finite("ap_lo", self.ap_lo)?;

        one_of("gender", self.gender, &[1, 2])?;
        one_of("cholesterol", self.cholesterol, &[1, 2, 3])?;
        one_of("gluc", self.gluc, &[1, 2, 3])?;
        one_of("smoke", self.smoke, &[0, 1])?;
        one_of("alco", self.alco, &[0, 1])?;
        one_of("active", self.active, &[0, 1])?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), FeatureDomainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FeatureDomainError::new(field, value, "must be a finite number"))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), FeatureDomainError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(FeatureDomainError::new(field, value, "must be greater than 0"))
    }
}

fn one_of(field: &'static str, value: u8, allowed: &[u8]) -> Result<(), FeatureDomainError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(FeatureDomainError::new(
            field,
            f64::from(value),
            format!("must be one of {allowed:?}"),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Scenario A from the original backend smoke test.
    pub(crate) fn low_risk_record() -> PatientRecord {
        PatientRecord {
            age: 50.0,
            gender: 1,
            height: 165.0,
            weight: 70.0,
            ap_hi: 120.0,
            ap_lo: 80.0,
            cholesterol: 1,
            gluc: 1,
            smoke: 0,
            alco: 0,
            active: 1,
        }
    }

    /// Scenario B.
    pub(crate) fn high_risk_record() -> PatientRecord {
        PatientRecord {
            age: 60.0,
            gender: 2,
            height: 165.0,
            weight: 90.0,
            ap_hi: 160.0,
            ap_lo: 100.0,
            cholesterol: 3,
            gluc: 3,
            smoke: 1,
            alco: 0,
            active: 0,
        }
    }

    #[test]
    fn test_valid_records() {
        assert!(low_risk_record().validate().is_ok());
        assert!(high_risk_record().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        let bad_gender = PatientRecord {
            gender: 3,
            ..low_risk_record()
        };
        let err = bad_gender.validate().expect_err("gender 3 is invalid");
        assert_eq!(err.field, "gender");
        assert!((err.value - 3.0).abs() < f64::EPSILON);

        let zero_height = PatientRecord {
            height: 0.0,
            ..low_risk_record()
        };
        assert_eq!(zero_height.validate().expect_err("height 0").field, "height");

        let nan_bp = PatientRecord {
            ap_lo: f64::NAN,
            ..low_risk_record()
        };
        assert_eq!(nan_bp.validate().expect_err("NaN ap_lo").field, "ap_lo");

        let bad_flag = PatientRecord {
            smoke: 2,
            ..low_risk_record()
        };
        assert_eq!(bad_flag.validate().expect_err("smoke 2").field, "smoke");
    }

    #[test]
    fn test_deserialize_requires_all_fields() {
        let json = r#"{"age":50,"gender":1,"height":165,"weight":70,"ap_hi":120,
            "ap_lo":80,"cholesterol":1,"gluc":1,"smoke":0,"alco":0,"active":1}"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record, low_risk_record());

        let missing = r#"{"age":50,"gender":1,"height":165,"weight":70,"ap_hi":120,
            "ap_lo":80,"cholesterol":1,"gluc":1,"smoke":0,"alco":0}"#;
        assert!(serde_json::from_str::<PatientRecord>(missing).is_err());
    }
}
