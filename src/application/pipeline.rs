//! Feature pipeline: Reproduces the training-time preprocessing for one record.
//!
//! The steps run in a fixed order and each one consumes the previous step's
//! output:
//!
//! 1. Age in years → age in days
//! 2. Assemble the base record
//! 3. Scale `age, height, weight, ap_hi, ap_lo` in place
//! 4. BMI from the raw height and weight
//! 5. `age_category` from the **scaled** age
//! 6. `bp_category` from the raw systolic pressure
//! 7. `bmi_category` from the raw BMI
//! 8. Reorder into the classifier's column order
//!
//! Reordering any of these changes the numbers the classifier sees.

use crate::domain::binning::{AGE_BINS, BMI_BINS, BP_BINS};
use crate::domain::{EngineeredFeatures, FeatureColumn, FeatureVector, PatientRecord, SchemaMismatchError};
use crate::ports::Scaler;
use crate::Result;

/// Age unit conversion used when the scaler was fitted.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Base record after unit conversion, before scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFeatures {
    pub age_days: f64,
    pub gender: f64,
    pub height: f64,
    pub weight: f64,
    pub ap_hi: f64,
    pub ap_lo: f64,
    pub cholesterol: f64,
    pub gluc: f64,
    pub smoke: f64,
    pub alco: f64,
    pub active: f64,
}

impl RawFeatures {
    /// Steps 1 and 2.
    #[must_use]
    pub fn from_record(record: &PatientRecord) -> Self {
        Self {
            age_days: record.age * DAYS_PER_YEAR,
            gender: f64::from(record.gender),
            height: record.height,
            weight: record.weight,
            ap_hi: record.ap_hi,
            ap_lo: record.ap_lo,
            cholesterol: f64::from(record.cholesterol),
            gluc: f64::from(record.gluc),
            smoke: f64::from(record.smoke),
            alco: f64::from(record.alco),
            active: f64::from(record.active),
        }
    }

    /// The scaler input row, in `FeatureColumn::SCALED` order.
    #[must_use]
    pub fn numeric_row(&self) -> [f64; 5] {
        [self.age_days, self.height, self.weight, self.ap_hi, self.ap_lo]
    }
}

/// Body-mass index from height in centimeters and weight in kilograms.
#[must_use]
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Transforms patient records into classifier-ready feature vectors.
///
/// Borrows the fitted scaler and the classifier's column schema from the
/// loaded artifacts; holds no state of its own.
pub struct FeaturePipeline<'a> {
    scaler: &'a dyn Scaler,
    schema: Option<&'a [String]>,
}

impl<'a> FeaturePipeline<'a> {
    /// Bind a pipeline to a scaler and an optional classifier schema.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` unless the scaler was fitted on exactly
    /// `age, height, weight, ap_hi, ap_lo` in that order.
    pub fn new(scaler: &'a dyn Scaler, schema: Option<&'a [String]>) -> Result<Self> {
        FeatureColumn::check_scaled(scaler.feature_names())?;
        Ok(Self { scaler, schema })
    }

    /// Steps 1 to 7: everything except the final reordering.
    ///
    /// # Errors
    /// Returns `FeatureDomain` if the record is invalid or a derived value
    /// falls outside its bins.
    pub fn engineer(&self, record: &PatientRecord) -> Result<EngineeredFeatures> {
        record.validate()?;

        let raw = RawFeatures::from_record(record);

        let scaled = self.scaler.transform(&raw.numeric_row())?;
        let [age, height, weight, ap_hi, ap_lo] = <[f64; 5]>::try_from(scaled.as_slice()).map_err(|_| {
            SchemaMismatchError::new(
                "scaler output width",
                FeatureColumn::SCALED.map(|c| c.name()),
                (0..scaled.len()).map(|i| format!("column {i}")),
            )
        })?;

        let bmi = bmi(record.height, record.weight);

        // Binned on the scaled age, not years or days: the classifier was
        // trained on categories cut after scaling.
        let age_category = AGE_BINS.categorize(age)?;
        let bp_category = BP_BINS.categorize(record.ap_hi)?;
        let bmi_category = BMI_BINS.categorize(bmi)?;

        Ok(EngineeredFeatures {
            age,
            gender: raw.gender,
            height,
            weight,
            ap_hi,
            ap_lo,
            cholesterol: raw.cholesterol,
            gluc: raw.gluc,
            smoke: raw.smoke,
            alco: raw.alco,
            active: raw.active,
            bmi,
            age_category,
            bp_category,
            bmi_category,
        })
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    /// Returns `FeatureDomain` for invalid inputs and `SchemaMismatch` if the
    /// classifier schema is not a permutation of the model columns.
    pub fn transform(&self, record: &PatientRecord) -> Result<FeatureVector> {
        let features = self.engineer(record)?;
        Ok(features.project(self.schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scaler::StandardScaler;
    use crate::domain::{high_risk_record, low_risk_record};
    use crate::VitalClarityError;

    fn scaled_names() -> Vec<String> {
        FeatureColumn::SCALED.iter().map(|c| c.name().to_string()).collect()
    }

    /// Identity on everything but age: age_days is centered on 40 years and
    /// scaled by 10 years, so whole years land on exact scaled values.
    fn age_scaler() -> StandardScaler {
        StandardScaler::new(
            scaled_names(),
            vec![40.0 * 365.0, 0.0, 0.0, 0.0, 0.0],
            vec![10.0 * 365.0, 1.0, 1.0, 1.0, 1.0],
        )
        .expect("valid scaler")
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(scaled_names(), vec![0.0; 5], vec![1.0; 5]).expect("valid scaler")
    }

    #[test]
    fn test_age_is_converted_to_days() {
        let raw = RawFeatures::from_record(&low_risk_record());
        assert!((raw.age_days - 18250.0).abs() < f64::EPSILON);
        assert_eq!(raw.numeric_row()[0], raw.age_days);
    }

    #[test]
    fn test_bmi_uses_raw_height_and_weight() {
        let scaler = age_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let features = pipeline.engineer(&low_risk_record()).expect("Should engineer");

        assert!((features.bmi - 25.71).abs() < 0.01);
        assert_eq!(features.bmi_category, 2);
        assert!((bmi(165.0, 90.0) - 33.06).abs() < 0.01);
    }

    #[test]
    fn test_scaling_touches_only_numeric_columns() {
        let scaler = StandardScaler::new(scaled_names(), vec![1.0; 5], vec![2.0; 5]).expect("valid scaler");
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let record = high_risk_record();
        let features = pipeline.engineer(&record).expect("Should engineer");

        assert!((features.height - (165.0 - 1.0) / 2.0).abs() < 1e-12);
        assert!((features.ap_hi - (160.0 - 1.0) / 2.0).abs() < 1e-12);
        assert!((features.age - (60.0 * 365.0 - 1.0) / 2.0).abs() < 1e-9);
        assert_eq!(features.gender, 2.0);
        assert_eq!(features.cholesterol, 3.0);
        assert_eq!(features.gluc, 3.0);
        assert_eq!(features.smoke, 1.0);
        assert_eq!(features.active, 0.0);
    }

    #[test]
    fn test_age_category_uses_scaled_age() {
        let scaler = age_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let at_age = |age: f64| {
            let record = PatientRecord {
                age,
                ..low_risk_record()
            };
            pipeline.engineer(&record).expect("Should engineer")
        };

        // 36 years scales to exactly -0.4, 40 to 0.0, 45 to 0.5.
        let f = at_age(36.0);
        assert_eq!(f.age, -0.4);
        assert_eq!(f.age_category, 1);

        assert_eq!(at_age(37.0).age_category, 2);

        let f = at_age(40.0);
        assert_eq!(f.age, 0.0);
        assert_eq!(f.age_category, 2);

        assert_eq!(at_age(41.0).age_category, 3);

        let f = at_age(45.0);
        assert_eq!(f.age, 0.5);
        assert_eq!(f.age_category, 3);

        assert_eq!(at_age(46.0).age_category, 4);
    }

    #[test]
    fn test_age_category_ignores_raw_age() {
        // Raw age_days (14600) would land in the top bin; scaled it is 0.0.
        let scaler = age_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let record = PatientRecord {
            age: 40.0,
            ..low_risk_record()
        };
        assert_eq!(pipeline.engineer(&record).expect("engineer").age_category, 2);

        let identity = identity_scaler();
        let pipeline = FeaturePipeline::new(&identity, None).expect("pipeline");
        assert_eq!(pipeline.engineer(&record).expect("engineer").age_category, 4);
    }

    #[test]
    fn test_bp_category_boundaries() {
        let scaler = identity_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let at_bp = |ap_hi: f64| {
            let record = PatientRecord {
                ap_hi,
                ..low_risk_record()
            };
            pipeline.engineer(&record).map(|f| f.bp_category)
        };

        assert_eq!(at_bp(120.0).expect("120"), 1);
        assert_eq!(at_bp(120.0001).expect("120.0001"), 2);
        assert_eq!(at_bp(160.0).expect("160"), 4);

        match at_bp(1200.0) {
            Err(VitalClarityError::FeatureDomain(e)) => {
                assert_eq!(e.field, "bp_category");
                assert!((e.value - 1200.0).abs() < f64::EPSILON);
            }
            other => panic!("expected FeatureDomain, got {other:?}"),
        }
        assert!(at_bp(-10.0).is_err());
    }

    #[test]
    fn test_bmi_out_of_range_is_rejected() {
        let scaler = identity_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let record = PatientRecord {
            height: 100.0,
            weight: 150.0,
            ..low_risk_record()
        };
        let err = pipeline.engineer(&record).expect_err("bmi 150");
        assert!(matches!(err, VitalClarityError::FeatureDomain(ref e) if e.field == "bmi_category"));
    }

    #[test]
    fn test_invalid_record_is_rejected_before_scaling() {
        let scaler = identity_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let record = PatientRecord {
            cholesterol: 4,
            ..low_risk_record()
        };
        let err = pipeline.transform(&record).expect_err("cholesterol 4");
        assert!(matches!(err, VitalClarityError::FeatureDomain(ref e) if e.field == "cholesterol"));
    }

    #[test]
    fn test_scaler_columns_must_match() {
        let wrong_order = StandardScaler::new(
            ["height", "age", "weight", "ap_hi", "ap_lo"].iter().map(|s| (*s).to_string()).collect(),
            vec![0.0; 5],
            vec![1.0; 5],
        )
        .expect("valid scaler");
        let err = FeaturePipeline::new(&wrong_order, None).err().expect("order mismatch");
        match err {
            VitalClarityError::SchemaMismatch(e) => {
                assert_eq!(e.declared[0], "height");
                assert_eq!(e.produced[0], "age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transform_follows_classifier_schema() {
        let scaler = identity_scaler();
        let mut schema: Vec<String> = FeatureColumn::ALL.iter().map(|c| c.name().to_string()).collect();
        schema.rotate_left(4);

        let pipeline = FeaturePipeline::new(&scaler, Some(&schema)).expect("pipeline");
        for record in [low_risk_record(), high_risk_record()] {
            let vector = pipeline.transform(&record).expect("Should transform");
            let names: Vec<&str> = vector.names().collect();
            assert_eq!(names, schema);
        }
    }

    #[test]
    fn test_high_risk_scenario_categories() {
        let scaler = identity_scaler();
        let pipeline = FeaturePipeline::new(&scaler, None).expect("pipeline");
        let vector = pipeline.transform(&high_risk_record()).expect("Should transform");

        assert_eq!(vector.get(FeatureColumn::BpCategory), Some(4.0));
        assert_eq!(vector.get(FeatureColumn::BmiCategory), Some(3.0));
        let bmi = vector.get(FeatureColumn::Bmi).expect("bmi column");
        assert!((bmi - 33.06).abs() < 0.01);
    }
}
