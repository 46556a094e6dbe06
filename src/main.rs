//! Vital Clarity: Cardiovascular risk scoring
//!
//! Command-line entry point. Loads the model artifacts once, reads a patient
//! record as JSON (from a file or stdin) and prints the scored result as JSON.
//!
//! ```bash
//! vital-clarity --input patient.json
//! echo '{"age":50,...}' | vital-clarity
//! vital-clarity --status
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vital_clarity::{ArtifactLocations, ArtifactStore, PatientRecord, RiskService};

enum Command {
    Score { input: Option<PathBuf> },
    Status,
}

fn usage() -> String {
    "Usage: vital-clarity [--input <patient.json>] | --status".to_string()
}

fn parse_args() -> Result<Command> {
    let mut args = std::env::args().skip(1);
    let mut input: Option<PathBuf> = None;
    let mut status = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-i" | "--input" => {
                let v = args.next().with_context(usage)?;
                input = Some(PathBuf::from(v));
            }
            "--status" => status = true,
            "-h" | "--help" => bail!(usage()),
            other => bail!("Unexpected argument {other:?}\n{}", usage()),
        }
    }

    if status && input.is_some() {
        bail!(usage());
    }
    Ok(if status {
        Command::Status
    } else {
        Command::Score { input }
    })
}

fn main() -> Result<()> {
    // Initialize logging.
    //
    // stdout carries the JSON result, so logs go to stderr unless
    // VITAL_CLARITY_LOG_MODE=file redirects them to a log file.
    let log_mode = std::env::var("VITAL_CLARITY_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, _guard) = if log_mode == "file" {
        let log_file =
            std::env::var("VITAL_CLARITY_LOG_FILE").unwrap_or_else(|_| "logs/vital-clarity.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: a missing directory surfaces as an open error below.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let command = parse_args()?;

    tracing::info!("Starting Vital Clarity...");
    let store = ArtifactStore::load(&ArtifactLocations::from_env());
    let service = RiskService::new(Arc::new(store));

    match command {
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&service.status())?);
        }
        Command::Score { input } => {
            let raw = match &input {
                Some(path) => {
                    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
                }
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read patient record from stdin")?;
                    buf
                }
            };

            let record: PatientRecord = serde_json::from_str(&raw).context("Invalid patient record")?;
            let result = service.assess(&record)?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
