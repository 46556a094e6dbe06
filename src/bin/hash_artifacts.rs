//! Artifact manifest utility for Vital Clarity model directories.
//!
//! Writes `manifest.json` binding each artifact file (`model.json`,
//! `scaler.json`, `threshold.json`) to its SHA-256 digest, so the artifact
//! store can verify the files before loading them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_artifacts -- <model_dir> [--check]
//! ```
//!
//! With `--check` the existing manifest is compared against the files instead
//! of being rewritten.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use vital_clarity::adapters::artifacts::{ArtifactManifest, MANIFEST_FILE};

fn usage() -> String {
    "Usage: hash_artifacts <model_dir> [--check]".to_string()
}

fn parse_args() -> Result<(PathBuf, bool)> {
    let mut model_dir: Option<PathBuf> = None;
    let mut check = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--check" => check = true,
            "-h" | "--help" => bail!(usage()),
            _ => {
                if model_dir.is_none() {
                    model_dir = Some(PathBuf::from(arg));
                } else {
                    bail!(usage());
                }
            }
        }
    }

    let model_dir = model_dir.with_context(usage)?;
    Ok((model_dir, check))
}

fn main() -> Result<()> {
    let (model_dir, check) = parse_args()?;

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf()
    } else {
        model_dir
    };

    let manifest = ArtifactManifest::build(&model_dir)?;
    let manifest_path = model_dir.join(MANIFEST_FILE);

    if check {
        let existing = fs::read(&manifest_path).with_context(|| format!("Failed to read {manifest_path:?}"))?;
        let existing: ArtifactManifest =
            serde_json::from_slice(&existing).with_context(|| format!("Invalid {manifest_path:?}"))?;
        if existing != manifest {
            for (name, digest) in &manifest.files {
                if existing.files.get(name) != Some(digest) {
                    println!("MISMATCH {name}: {digest}");
                }
            }
            bail!("{manifest_path:?} does not match the artifact files");
        }
        println!("Manifest matches: {manifest_path:?}");
        return Ok(());
    }

    let bytes = serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest.json")?;
    fs::write(&manifest_path, &bytes).with_context(|| format!("Failed to write {manifest_path:?}"))?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote manifest: {manifest_path:?}");

    Ok(())
}
