//! Streaming file fetcher with Street View image helpers.
//!
//! The core is [`Fetcher::fetch`]: an HTTP GET whose body is copied to disk in
//! fixed-size chunks while the received byte count is checked against the
//! declared `Content-Length`.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod hashing;
pub mod progress;
pub mod session;
pub mod streetview;
pub mod utils;

pub use config::Config;
pub use error::{ConfigError, FetchError};
pub use fetcher::{copy_chunks, Fetcher, StreamError};
pub use progress::{BarProgress, NoProgress, ProgressObserver};
pub use session::{DownloadSession, FetchResult, FetchStatus, SessionState};
