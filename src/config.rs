use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::streetview::{parse_image_size, STREET_VIEW_ENDPOINT};

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IMAGE_SIZE: &str = "600x600";
pub const DEFAULT_OUTPUT_DIR: &str = "images";
pub const USER_AGENT: &str = concat!("svfetch/", env!("CARGO_PKG_VERSION"));

/// Everything the fetcher and its callers need, passed explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Street View Static API key. Only required for address lookups.
    pub api_key: Option<String>,
    pub chunk_size: usize,
    pub connect_timeout: Duration,
    /// Overall deadline for one fetch, headers and body included.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    pub image_size: String,
    pub output_dir: PathBuf,
    pub endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: None,
            user_agent: USER_AGENT.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            endpoint: STREET_VIEW_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        parse_image_size(&self.image_size)?;
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
