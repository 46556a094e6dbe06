//! Artifact store: Discovery, verification and loading of the fitted artifacts.
//!
//! An artifact directory holds three JSON files:
//! - `model.json`: the classifier (see `adapters::classifier`)
//! - `scaler.json`: the fitted scaler (see `adapters::scaler`)
//! - `threshold.json`: the tuned decision threshold, a bare JSON number
//!
//! and optionally `manifest.json`, which binds each file to its SHA-256
//! digest. When a manifest is present every artifact is verified against it
//! before it is parsed.
//!
//! # Degraded mode
//!
//! `ArtifactStore::load` never fails. If the artifacts cannot be loaded the
//! store is built without them, the threshold falls back to `0.5`, and every
//! scoring call reports `ModelUnavailable`. This keeps the process up so that
//! readiness can still be reported.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::ExportedClassifier;
use super::scaler::StandardScaler;
use crate::domain::FeatureColumn;
use crate::ports::{Classifier, Scaler};

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const THRESHOLD_FILE: &str = "threshold.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Files that must all be present for a directory to be used.
pub const ARTIFACT_FILES: [&str; 3] = [MODEL_FILE, SCALER_FILE, THRESHOLD_FILE];

/// Threshold reported while no artifacts are loaded.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Overrides the primary artifact directory.
const MODEL_DIR_ENV: &str = "VITAL_CLARITY_MODEL_DIR";

/// Refuse artifact directories without a `manifest.json`.
const REQUIRE_MANIFEST_ENV: &str = "VITAL_CLARITY_REQUIRE_MANIFEST";

const DEFAULT_PRIMARY_DIR: &str = "models";
const DEFAULT_FALLBACK_DIR: &str = "Backend/models";

const MANIFEST_VERSION: u32 = 1;

/// Error raised while loading artifacts at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("No complete artifact set found (searched {searched:?}, expected {ARTIFACT_FILES:?})")]
    NotFound { searched: Vec<PathBuf> },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Integrity check failed for {file}: {reason}")]
    Integrity { file: String, reason: String },
}

fn parse_bool_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

/// Hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Where to look for artifacts.
///
/// The primary directory is tried first. The fallback lets the same binary
/// run from the service directory or from the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocations {
    pub primary: PathBuf,
    pub fallback: PathBuf,
    pub require_manifest: bool,
}

impl Default for ArtifactLocations {
    fn default() -> Self {
        Self {
            primary: PathBuf::from(DEFAULT_PRIMARY_DIR),
            fallback: PathBuf::from(DEFAULT_FALLBACK_DIR),
            require_manifest: false,
        }
    }
}

impl ArtifactLocations {
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            require_manifest: false,
        }
    }

    /// Default locations with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut locations = Self::default();
        if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
            let dir = dir.trim();
            if !dir.is_empty() {
                locations.primary = PathBuf::from(dir);
            }
        }
        locations.require_manifest = parse_bool_env(REQUIRE_MANIFEST_ENV);
        locations
    }

    #[must_use]
    pub fn with_require_manifest(mut self, require: bool) -> Self {
        self.require_manifest = require;
        self
    }

    /// First directory holding every artifact file.
    #[must_use]
    pub fn resolve(&self) -> Option<&Path> {
        [self.primary.as_path(), self.fallback.as_path()]
            .into_iter()
            .find(|dir| ARTIFACT_FILES.iter().all(|f| dir.join(f).is_file()))
    }
}

/// `manifest.json`: artifact file name to SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Digest every artifact file in `dir`.
    ///
    /// # Errors
    /// Returns `Read` if a file cannot be read.
    pub fn build(dir: &Path) -> Result<Self, ArtifactLoadError> {
        let mut files = BTreeMap::new();
        for name in ARTIFACT_FILES {
            let bytes = read(&dir.join(name))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }

    fn verify(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactLoadError> {
        let expected = self.files.get(name).ok_or_else(|| ArtifactLoadError::Integrity {
            file: name.to_string(),
            reason: "not listed in manifest".into(),
        })?;
        let actual = sha256_hex(bytes);
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(ArtifactLoadError::Integrity {
                file: name.to_string(),
                reason: format!("sha256 mismatch (manifest {expected}, file {actual})"),
            });
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    std::fs::read(path).map_err(|source| ArtifactLoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactLoadError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The fitted scaler, classifier and threshold, immutable once built.
pub struct ModelArtifacts {
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
    threshold: f64,
    source: Option<PathBuf>,
}

impl ModelArtifacts {
    #[must_use]
    pub fn new(scaler: Box<dyn Scaler>, classifier: Box<dyn Classifier>, threshold: f64) -> Self {
        Self {
            scaler,
            classifier,
            threshold,
            source: None,
        }
    }

    /// Load and verify the artifacts in a single directory.
    ///
    /// # Errors
    /// Returns `ArtifactLoadError` with the underlying cause.
    pub fn load_dir(dir: &Path, require_manifest: bool) -> Result<Self, ArtifactLoadError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest: Option<ArtifactManifest> = if manifest_path.is_file() {
            let manifest: ArtifactManifest = parse(&manifest_path, &read(&manifest_path)?)?;
            if manifest.version != MANIFEST_VERSION {
                return Err(ArtifactLoadError::Invalid {
                    path: manifest_path,
                    reason: format!("unsupported manifest version {}", manifest.version),
                });
            }
            Some(manifest)
        } else if require_manifest {
            return Err(ArtifactLoadError::Integrity {
                file: MANIFEST_FILE.to_string(),
                reason: format!("missing ({REQUIRE_MANIFEST_ENV}=true)"),
            });
        } else {
            tracing::warn!("No {MANIFEST_FILE} in {:?}; loading artifacts unverified", dir);
            None
        };

        let load_bytes = |name: &str| -> Result<(PathBuf, Vec<u8>), ArtifactLoadError> {
            let path = dir.join(name);
            let bytes = read(&path)?;
            if let Some(manifest) = &manifest {
                manifest.verify(name, &bytes)?;
            }
            Ok((path, bytes))
        };

        // A ready store always matches the pipeline's columns.
        let (path, bytes) = load_bytes(SCALER_FILE)?;
        let scaler: StandardScaler = parse(&path, &bytes)?;
        scaler
            .check()
            .and_then(|()| FeatureColumn::check_scaled(scaler.feature_names()).map_err(|e| e.to_string()))
            .map_err(|reason| ArtifactLoadError::Invalid { path, reason })?;

        let (path, bytes) = load_bytes(MODEL_FILE)?;
        let classifier: ExportedClassifier = parse(&path, &bytes)?;
        classifier
            .check()
            .and_then(|()| match classifier.feature_names() {
                Some(schema) => FeatureColumn::resolve_schema(schema)
                    .map(drop)
                    .map_err(|e| e.to_string()),
                None => Ok(()),
            })
            .map_err(|reason| ArtifactLoadError::Invalid { path, reason })?;

        let (path, bytes) = load_bytes(THRESHOLD_FILE)?;
        let threshold: f64 = parse(&path, &bytes)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactLoadError::Invalid {
                path,
                reason: format!("threshold {threshold} outside [0, 1]"),
            });
        }

        tracing::info!(
            "Loaded model artifacts from {:?} (threshold={:.4}, n_features={}, verified={})",
            dir,
            threshold,
            classifier.feature_names().map_or(0, <[String]>::len),
            manifest.is_some()
        );

        Ok(Self {
            scaler: Box::new(scaler),
            classifier: Box::new(classifier),
            threshold,
            source: Some(dir.to_path_buf()),
        })
    }

    #[must_use]
    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Directory the artifacts were loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("scaler_columns", &self.scaler.feature_names())
            .field("classifier_columns", &self.classifier.feature_names())
            .field("threshold", &self.threshold)
            .field("source", &self.source)
            .finish()
    }
}

/// Readiness snapshot of the artifact store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub ready: bool,
    pub threshold: f64,
    pub source: Option<PathBuf>,
    pub error: Option<String>,
}

/// Process-lifetime holder of the model artifacts.
///
/// Built once at startup and shared read-only (`Arc<ArtifactStore>`).
#[derive(Debug)]
pub struct ArtifactStore {
    artifacts: Option<ModelArtifacts>,
    error: Option<String>,
}

impl ArtifactStore {
    /// Load artifacts, entering degraded mode on failure.
    #[must_use]
    pub fn load(locations: &ArtifactLocations) -> Self {
        match Self::try_load(locations) {
            Ok(artifacts) => Self::from_artifacts(artifacts),
            Err(e) => {
                tracing::error!("Error loading model artifacts: {e}");
                Self::degraded(e.to_string())
            }
        }
    }

    /// Load artifacts from the first complete location.
    ///
    /// A directory missing any artifact file is skipped. A directory with all
    /// files present but unreadable, corrupt or failing verification is an
    /// error; it does not fall through to the next location.
    ///
    /// # Errors
    /// Returns `ArtifactLoadError` with the underlying cause.
    pub fn try_load(locations: &ArtifactLocations) -> Result<ModelArtifacts, ArtifactLoadError> {
        let dir = locations.resolve().ok_or_else(|| ArtifactLoadError::NotFound {
            searched: vec![locations.primary.clone(), locations.fallback.clone()],
        })?;
        if dir != locations.primary {
            tracing::info!(
                "Artifacts not found in {:?}, using fallback {:?}",
                locations.primary,
                dir
            );
        }
        ModelArtifacts::load_dir(dir, locations.require_manifest)
    }

    #[must_use]
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self {
            artifacts: Some(artifacts),
            error: None,
        }
    }

    /// A store with no artifacts; scoring reports `ModelUnavailable`.
    #[must_use]
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            artifacts: None,
            error: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn artifacts(&self) -> Option<&ModelArtifacts> {
        self.artifacts.as_ref()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Decision threshold; `DEFAULT_THRESHOLD` while degraded.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.artifacts
            .as_ref()
            .map_or(DEFAULT_THRESHOLD, ModelArtifacts::threshold)
    }

    #[must_use]
    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            ready: self.is_ready(),
            threshold: self.threshold(),
            source: self
                .artifacts
                .as_ref()
                .and_then(|a| a.source().map(Path::to_path_buf)),
            error: self.error.clone(),
        }
    }
}
