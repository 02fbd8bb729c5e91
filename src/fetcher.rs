//! Streaming HTTP download into a file.
//!
//! [`Fetcher::fetch`] issues the GET and opens the destination; the chunk loop
//! itself lives in [`copy_chunks`] so it can run over any reader and writer.

use std::io;
use std::path::Path;

use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::progress::ProgressObserver;
use crate::session::{DownloadSession, FetchResult, SessionState};
use crate::streetview::redact_key;

/// Failure inside [`copy_chunks`], with the bytes already written.
#[derive(Debug)]
pub enum StreamError {
    Read { received: u64, source: io::Error },
    Write { received: u64, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    chunk_size: usize,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Self::with_client(client, config.chunk_size)
    }

    pub fn with_client(client: Client, chunk_size: usize) -> Result<Self, FetchError> {
        if chunk_size == 0 {
            return Err(FetchError::InvalidChunkSize);
        }
        Ok(Self { client, chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Downloads `url` into `destination`, creating or truncating it.
    ///
    /// The parent directory must already exist. On any error the partial
    /// file is left in place.
    #[instrument(skip(self, url, destination, observer), fields(dest = %destination.display()))]
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<FetchResult, FetchError> {
        let parsed = parse_http_url(url)?;
        let shown_url = redact_key(&parsed).to_string();
        let mut session = DownloadSession::new(shown_url.as_str(), destination);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: shown_url.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: shown_url,
                status: status.as_u16(),
            });
        }

        let declared = declared_length(response.headers());
        debug!(declared, chunk_size = self.chunk_size, "response headers received");

        let file = File::create(destination)
            .await
            .map_err(|e| FetchError::io(destination, e))?;

        session.begin(declared);
        observer.on_start(session.declared());

        let body = response
            .bytes_stream()
            .map(|item| item.map_err(body_error_to_io));
        let reader = StreamReader::new(Box::pin(body));

        let outcome = copy_chunks(&mut session, reader, file, self.chunk_size, observer).await;
        observer.on_finish(&session);

        match outcome {
            Ok(result) => {
                if result.is_success() {
                    info!(bytes = result.bytes_written, chunks = result.chunks, "download complete");
                } else {
                    warn!(
                        expected = result.declared_total,
                        received = result.bytes_written,
                        "received size does not match Content-Length"
                    );
                }
                Ok(result)
            }
            Err(StreamError::Read { received, source }) => Err(FetchError::Interrupted {
                url: shown_url,
                received,
                source,
            }),
            Err(StreamError::Write { source, .. }) => Err(FetchError::io(destination, source)),
        }
    }
}

/// Copies `reader` to `writer` in `chunk_size` blocks, updating `session`.
///
/// Every chunk but the last is exactly `chunk_size` bytes. When the session
/// has a declared total, a read that ends with `UnexpectedEof` is taken as the
/// end of the body and left to the size check; without one it is a read
/// failure, since nothing else can tell the body was cut short. `writer` is flushed
/// and dropped before this returns, whatever the outcome.
pub async fn copy_chunks<R, W>(
    session: &mut DownloadSession,
    mut reader: R,
    mut writer: W,
    chunk_size: usize,
    observer: &dyn ProgressObserver,
) -> Result<FetchResult, StreamError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if session.state == SessionState::NotStarted {
        session.begin(session.declared_total);
    }
    let mut buf = vec![0u8; chunk_size.max(1)];

    let pumped = pump(session, &mut reader, &mut writer, &mut buf, observer).await;
    let flushed = writer.flush().await;
    drop(writer);

    match (pumped, flushed) {
        (Ok(()), Ok(())) => {
            let status = session.complete();
            Ok(FetchResult::from_session(session, status))
        }
        (Ok(()), Err(source)) => {
            session.fail();
            Err(StreamError::Write {
                received: session.received,
                source,
            })
        }
        (Err(e), _) => {
            session.fail();
            Err(e)
        }
    }
}

async fn pump<R, W>(
    session: &mut DownloadSession,
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    observer: &dyn ProgressObserver,
) -> Result<(), StreamError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let truncation_is_eof = session.declared().is_some();
    loop {
        let (len, end) = fill_chunk(reader, buf, truncation_is_eof).await;

        if len > 0 {
            writer
                .write_all(&buf[..len])
                .await
                .map_err(|source| StreamError::Write {
                    received: session.received,
                    source,
                })?;
            session.record_chunk(len);
            observer.on_chunk(session.received, session.declared());
        }

        match end {
            ChunkEnd::Full => continue,
            ChunkEnd::Eof => return Ok(()),
            ChunkEnd::Failed(source) => {
                return Err(StreamError::Read {
                    received: session.received,
                    source,
                })
            }
        }
    }
}

pub(crate) enum ChunkEnd {
    Full,
    Eof,
    Failed(io::Error),
}

/// Reads until `buf` is full or the source ends. Bytes read before an error are
/// still reported so they reach the consumer.
pub(crate) async fn fill_chunk<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
    truncation_is_eof: bool,
) -> (usize, ChunkEnd) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => return (filled, ChunkEnd::Eof),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if truncation_is_eof && e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(error = %e, "connection closed before end of body");
                return (filled, ChunkEnd::Eof);
            }
            Err(e) => return (filled, ChunkEnd::Failed(e)),
        }
    }
    (filled, ChunkEnd::Full)
}

fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let invalid = || FetchError::InvalidUrl {
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(invalid()),
    }
}

/// `Content-Length` as sent by the server; 0 when absent or unparseable.
pub fn declared_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn body_error_to_io(err: reqwest::Error) -> io::Error {
    let err = err.without_url();
    if closed_early(&err) {
        io::Error::new(io::ErrorKind::UnexpectedEof, err)
    } else {
        io::Error::other(err)
    }
}

// hyper reports a body cut short of its Content-Length as an UnexpectedEof
// io::Error somewhere down the source chain.
fn closed_early(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> =
        Some(err as &(dyn std::error::Error + 'static));
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::UnexpectedEof {
                return true;
            }
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_declared_length_defaults_to_zero() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(declared_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5000"));
        assert_eq!(declared_length(&headers), 5000);
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com/a.png").is_ok());
        assert!(matches!(
            parse_http_url("/relative/path"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_http_url("ftp://example.com/a.png"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = Fetcher::with_client(Client::new(), 0);
        assert!(matches!(result, Err(FetchError::InvalidChunkSize)));
    }

    #[tokio::test]
    async fn test_copy_chunks_splits_into_fixed_blocks() {
        let body: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut session = DownloadSession::new("mem://", "out");
        session.begin(5000);
        let mut out = Vec::new();

        let result = copy_chunks(&mut session, &body[..], &mut out, 1024, &NoProgress)
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.bytes_written, 5000);
        assert_eq!(result.chunks, 5);
        assert_eq!(out, body);
    }

    #[tokio::test]
    async fn test_copy_chunks_empty_body() {
        let mut session = DownloadSession::new("mem://", "out");
        let mut out = Vec::new();

        let result = copy_chunks(&mut session, &b""[..], &mut out, 16, &NoProgress)
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.bytes_written, 0);
        assert_eq!(result.chunks, 0);
        assert!(session.is_terminal());
    }
}
