use anyhow::{bail, Context, Result};
use indicatif::HumanBytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use svfetch::hashing::{digest_matches, file_sha256};
use svfetch::streetview::{image_filename, image_url, redact_key};
use svfetch::utils::{get_filename_from_url, sanitize_filename};
use svfetch::{BarProgress, Config, FetchResult, FetchStatus, Fetcher, NoProgress, ProgressObserver};

/// What to download.
#[derive(Debug, Clone)]
pub enum Target {
    Url(String),
    Address(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    SizeMismatch,
}

pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub expected_sha256: Option<String>,
    pub progress: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    url: &'a str,
    destination: &'a Path,
    #[serde(flatten)]
    result: &'a FetchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<&'a str>,
}

fn render_report(url: &str, destination: &Path, result: &FetchResult, sha256: Option<&str>) -> Result<String> {
    let report = Report {
        url,
        destination,
        result,
        sha256,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Resolves `target` to a URL and a destination path under `config.output_dir`.
pub fn resolve_target(config: &Config, target: &Target, output: Option<&Path>) -> Result<(String, PathBuf)> {
    let (url, filename) = match target {
        Target::Url(url) => (url.clone(), sanitize_filename(&get_filename_from_url(url))),
        Target::Address(address) => {
            let key = config.require_api_key()?;
            let url = image_url(&config.endpoint, address, &config.image_size, key)?;
            debug!(url = %redact_key(&url), "street view request");
            (url.to_string(), image_filename(address))
        }
    };

    let destination = match output {
        Some(path) => path.to_path_buf(),
        None => config.output_dir.join(filename),
    };
    Ok((url, destination))
}

pub async fn run_fetch(config: Config, target: Target, options: RunOptions) -> Result<Outcome> {
    config.validate()?;
    let (url, destination) = resolve_target(&config, &target, options.output.as_deref())?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }
    }

    let fetcher = Fetcher::new(&config)?;
    let label = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let observer: Box<dyn ProgressObserver> = if options.progress {
        Box::new(BarProgress::new(label))
    } else {
        Box::new(NoProgress)
    };

    let shown_url = match &target {
        Target::Address(address) => format!("street view image of {:?}", address),
        Target::Url(url) => url.clone(),
    };
    info!(source = %shown_url, dest = %destination.display(), "fetching");

    let result = fetcher
        .fetch(&url, &destination, observer.as_ref())
        .await
        .with_context(|| format!("Failed to download {}", shown_url))?;

    let mut digest = None;
    if result.is_success() {
        if let Some(expected) = &options.expected_sha256 {
            let computed = file_sha256(&destination)
                .await
                .with_context(|| format!("Failed to hash {:?}", destination))?;
            if !digest_matches(expected, &computed) {
                bail!("Hash mismatch: expected {}, got {}", expected.trim(), computed);
            }
            digest = Some(computed);
        }
    }

    if options.json {
        println!("{}", render_report(&shown_url, &destination, &result, digest.as_deref())?);
    }

    match result.status {
        FetchStatus::Success => {
            info!(
                size = %HumanBytes(result.bytes_written),
                dest = %destination.display(),
                "saved"
            );
            Ok(Outcome::Completed)
        }
        FetchStatus::SizeMismatch => {
            eprintln!(
                "ERROR, something went wrong: expected {} bytes, received {} ({:?} left on disk)",
                result.declared_total, result.bytes_written, destination
            );
            Ok(Outcome::SizeMismatch)
        }
    }
}
