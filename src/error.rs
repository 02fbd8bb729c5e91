//! Error types for fetching and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a fetch.
///
/// A truncated body is not an error: it comes back as
/// [`FetchStatus::SizeMismatch`](crate::FetchStatus::SizeMismatch).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is not an absolute http(s) URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// Chunk size must be at least one byte.
    #[error("chunk size must be a positive number of bytes")]
    InvalidChunkSize,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    /// The GET request failed before a response arrived (DNS, connect, TLS, timeout).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Reading the response body failed mid-stream.
    #[error("transfer from {url} interrupted after {received} bytes: {source}")]
    Interrupted {
        url: String,
        /// Bytes already written to the destination.
        received: u64,
        #[source]
        source: std::io::Error,
    },

    /// The destination could not be opened or written.
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// True for failures of the network transport rather than the local filesystem.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request { .. } | Self::HttpStatus { .. } | Self::Interrupted { .. }
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while assembling configuration or request URLs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured (set GCP_API or pass --api-key)")]
    MissingApiKey,

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("invalid image size {0:?}, expected WIDTHxHEIGHT")]
    InvalidImageSize(String),

    #[error("chunk size must be a positive number of bytes")]
    InvalidChunkSize,

    #[error("invalid endpoint URL {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
