use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use svfetch::config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_IMAGE_SIZE, DEFAULT_OUTPUT_DIR};
use svfetch::streetview::STREET_VIEW_ENDPOINT;

/// Download a file, or a Street View image for an address, with progress and size checking.
#[derive(Parser, Debug)]
#[command(name = "svfetch", author, version, about, long_about = None)]
pub struct Args {
    /// URL to download
    #[arg(index = 1, required_unless_present = "address", conflicts_with = "address")]
    pub url: Option<String>,

    /// Street address to fetch a Street View image for
    #[arg(short = 'a', long)]
    pub address: Option<String>,

    /// Destination file (defaults to a name derived from the URL or address)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Directory for derived destination names
    #[arg(short = 'D', long = "download-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub download_dir: PathBuf,

    /// Street View Static API key
    #[arg(short = 'k', long = "api-key", env = "GCP_API", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Read size in bytes
    #[arg(short = 's', long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE,
          value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Street View image size as WIDTHxHEIGHT
    #[arg(long = "size", default_value = DEFAULT_IMAGE_SIZE)]
    pub image_size: String,

    /// Street View endpoint
    #[arg(long, default_value = STREET_VIEW_ENDPOINT, hide = true)]
    pub endpoint: String,

    /// Give up on the whole transfer after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Expected SHA-256 of the downloaded file (hex)
    #[arg(long)]
    pub sha256: Option<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_chunk_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Args {
    pub fn to_config(&self) -> Config {
        Config {
            api_key: self.api_key.clone(),
            chunk_size: self.chunk_size,
            request_timeout: self.timeout.map(Duration::from_secs),
            image_size: self.image_size.clone(),
            output_dir: self.download_dir.clone(),
            endpoint: self.endpoint.clone(),
            ..Config::default()
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_mode_defaults() {
        let args = Args::try_parse_from(["svfetch", "https://example.com/a.png"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(args.chunk_size, 1024);
        assert_eq!(args.download_dir, PathBuf::from("images"));
        assert_eq!(args.log_level(), "info");

        let config = args.to_config();
        assert_eq!(config.chunk_size, 1024);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_url_or_address_required() {
        assert!(Args::try_parse_from(["svfetch"]).is_err());
        assert!(Args::try_parse_from(["svfetch", "http://x/a", "--address", "1 Main St"]).is_err());
        assert!(Args::try_parse_from(["svfetch", "--address", "1 Main St"]).is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(Args::try_parse_from(["svfetch", "http://x/a", "-s", "0"]).is_err());
        let args = Args::try_parse_from(["svfetch", "http://x/a", "-s", "4096"]).unwrap();
        assert_eq!(args.chunk_size, 4096);
    }

    #[test]
    fn test_verbosity() {
        let args = Args::try_parse_from(["svfetch", "http://x/a", "-vv"]).unwrap();
        assert_eq!(args.log_level(), "trace");
        let args = Args::try_parse_from(["svfetch", "http://x/a", "-q", "-v"]).unwrap();
        assert_eq!(args.log_level(), "error");
    }

    #[test]
    fn test_timeout_maps_to_config() {
        let args = Args::try_parse_from(["svfetch", "http://x/a", "--timeout", "30"]).unwrap();
        assert_eq!(args.to_config().request_timeout, Some(Duration::from_secs(30)));
    }
}
