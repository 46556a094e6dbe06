//! Model columns and the feature vector handed to the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One column of the model's training schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Age,
    Gender,
    Height,
    Weight,
    ApHi,
    ApLo,
    Cholesterol,
    Gluc,
    Smoke,
    Alco,
    Active,
    Bmi,
    AgeCategory,
    BpCategory,
    BmiCategory,
}

impl FeatureColumn {
    /// Every column, in assembly order (base fields, then derived fields).
    pub const ALL: [FeatureColumn; 15] = [
        Self::Age,
        Self::Gender,
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
        Self::Bmi,
        Self::AgeCategory,
        Self::BpCategory,
        Self::BmiCategory,
    ];

    /// Columns passed through the fitted scaler, in scaler order.
    pub const SCALED: [FeatureColumn; 5] = [
        Self::Age,
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
    ];

    /// Column name as recorded in the model artifacts.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::ApHi => "ap_hi",
            Self::ApLo => "ap_lo",
            Self::Cholesterol => "cholesterol",
            Self::Gluc => "gluc",
            Self::Smoke => "smoke",
            Self::Alco => "alco",
            Self::Active => "active",
            Self::Bmi => "bmi",
            Self::AgeCategory => "age_category",
            Self::BpCategory => "bp_category",
            Self::BmiCategory => "bmi_category",
        }
    }

    /// Look up a column by its artifact name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Check that a scaler was fitted on exactly `SCALED`, in that order.
    ///
    /// # Errors
    /// Returns `SchemaMismatchError` naming both column lists.
    pub fn check_scaled(names: &[String]) -> Result<(), SchemaMismatchError> {
        if names.iter().map(String::as_str).eq(Self::SCALED.iter().map(Self::name)) {
            Ok(())
        } else {
            Err(SchemaMismatchError::new("scaler columns", names, Self::SCALED.iter().map(Self::name)))
        }
    }

    /// Resolve a classifier schema into columns.
    ///
    /// Every name must be a known column and every column must appear exactly
    /// once.
    ///
    /// # Errors
    /// Returns `SchemaMismatchError` if the schema is not a permutation of
    /// `ALL`.
    pub fn resolve_schema(schema: &[String]) -> Result<Vec<Self>, SchemaMismatchError> {
        let mismatch = || {
            SchemaMismatchError::new("classifier feature schema", schema, Self::ALL.iter().map(Self::name))
        };

        if schema.len() != Self::ALL.len() {
            return Err(mismatch());
        }

        let mut columns = Vec::with_capacity(schema.len());
        for name in schema {
            let column = Self::from_name(name).ok_or_else(mismatch)?;
            if columns.contains(&column) {
                return Err(mismatch());
            }
            columns.push(column);
        }
        Ok(columns)
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value outside the numeric domain a field or derived feature accepts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}={value} {constraint}")]
pub struct FeatureDomainError {
    pub field: &'static str,
    pub value: f64,
    pub constraint: String,
}

impl FeatureDomainError {
    pub fn new(field: &'static str, value: f64, constraint: impl Into<String>) -> Self {
        Self {
            field,
            value,
            constraint: constraint.into(),
        }
    }
}

/// Column schema declared by an artifact disagrees with the pipeline's columns.
///
/// This means the artifacts and the pipeline come from different versions.
/// `declared` is what the artifact records, `produced` is what the pipeline
/// builds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: artifact declares {declared:?}, pipeline produces {produced:?}")]
pub struct SchemaMismatchError {
    pub context: &'static str,
    pub declared: Vec<String>,
    pub produced: Vec<String>,
}

impl SchemaMismatchError {
    pub fn new<D, P>(context: &'static str, declared: D, produced: P) -> Self
    where
        D: IntoIterator,
        D::Item: ToString,
        P: IntoIterator,
        P::Item: ToString,
    {
        Self {
            context,
            declared: declared.into_iter().map(|s| s.to_string()).collect(),
            produced: produced.into_iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// All fifteen model inputs after scaling and feature engineering.
///
/// `age`, `height`, `weight`, `ap_hi` and `ap_lo` hold *scaled* values;
/// `bmi` and the categories are derived as documented in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineeredFeatures {
    pub age: f64,
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
    pub bmi: f64,
    pub age_category: u8,
    pub bp_category: u8,
    pub bmi_category: u8,
}

impl EngineeredFeatures {
    /// Value of a single column.
    #[must_use]
    pub fn get(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Age => self.age,
            FeatureColumn::Gender => self.gender,
            FeatureColumn::Height => self.height,
            FeatureColumn::Weight => self.weight,
            FeatureColumn::ApHi => self.ap_hi,
            FeatureColumn::ApLo => self.ap_lo,
            FeatureColumn::Cholesterol => self.cholesterol,
            FeatureColumn::Gluc => self.gluc,
            FeatureColumn::Smoke => self.smoke,
            FeatureColumn::Alco => self.alco,
            FeatureColumn::Active => self.active,
            FeatureColumn::Bmi => self.bmi,
            FeatureColumn::AgeCategory => f64::from(self.age_category),
            FeatureColumn::BpCategory => f64::from(self.bp_category),
            FeatureColumn::BmiCategory => f64::from(self.bmi_category),
        }
    }

    /// Project into a feature vector following `schema`.
    ///
    /// With `None` the columns are emitted in assembly order.
    ///
    /// # Errors
    /// Returns `SchemaMismatchError` if the schema is not a permutation of the
    /// fifteen model columns.
    pub fn project(&self, schema: Option<&[String]>) -> Result<FeatureVector, SchemaMismatchError> {
        match schema {
            None => Ok(FeatureVector::from_columns(self, &FeatureColumn::ALL)),
            Some(schema) => Ok(FeatureVector::from_columns(self, &FeatureColumn::resolve_schema(schema)?)),
        }
    }
}

/// Ordered model input: one value per column in the classifier's order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<FeatureColumn>,
    values: Vec<f64>,
}

impl FeatureVector {
    fn from_columns(features: &EngineeredFeatures, columns: &[FeatureColumn]) -> Self {
        Self {
            columns: columns.to_vec(),
            values: columns.iter().map(|c| features.get(*c)).collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column, if present.
    #[must_use]
    pub fn get(&self, column: FeatureColumn) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i])
    }

    /// Column names in vector order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(FeatureColumn::name)
    }

    /// Iterate `(column, value)` pairs in vector order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureColumn, f64)> + '_ {
        self.columns.iter().copied().zip(self.values.iter().copied())
    }
}
