use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStatus {
    Success,
    SizeMismatch,
}

/// One fetch of `url` into `destination`.
///
/// `declared_total` is 0 when the server sent no usable `Content-Length`.
/// `received` only grows, and only through [`record_chunk`](Self::record_chunk).
#[derive(Serialize, Debug, Clone)]
pub struct DownloadSession {
    pub url: String,
    pub destination: PathBuf,
    pub declared_total: u64,
    pub received: u64,
    pub chunks: u64,
    pub state: SessionState,
}

impl DownloadSession {
    pub fn new(url: impl Into<String>, destination: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            destination: destination.as_ref().to_path_buf(),
            declared_total: 0,
            received: 0,
            chunks: 0,
            state: SessionState::NotStarted,
        }
    }

    pub fn begin(&mut self, declared_total: u64) {
        self.declared_total = declared_total;
        self.state = SessionState::InProgress;
    }

    pub fn record_chunk(&mut self, len: usize) {
        self.received += len as u64;
        self.chunks += 1;
    }

    pub fn declared(&self) -> Option<u64> {
        (self.declared_total > 0).then_some(self.declared_total)
    }

    /// Ends the session after the body stream ended.
    ///
    /// A known total that differs from `received`, in either direction, is a
    /// size mismatch and leaves the session failed.
    pub fn complete(&mut self) -> FetchStatus {
        match self.declared() {
            Some(total) if total != self.received => {
                self.state = SessionState::Failed;
                FetchStatus::SizeMismatch
            }
            _ => {
                self.state = SessionState::Completed;
                FetchStatus::Success
            }
        }
    }

    pub fn fail(&mut self) {
        self.state = SessionState::Failed;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Completed | SessionState::Failed)
    }
}

/// Outcome of a fetch that reached the end of the response body.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: FetchStatus,
    pub bytes_written: u64,
    pub declared_total: u64,
    pub chunks: u64,
}

impl FetchResult {
    pub fn from_session(session: &DownloadSession, status: FetchStatus) -> Self {
        Self {
            status,
            bytes_written: session.received,
            declared_total: session.declared_total,
            chunks: session.chunks,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(declared: u64, chunks: &[usize]) -> DownloadSession {
        let mut session = DownloadSession::new("http://host/a.png", "a.png");
        session.begin(declared);
        for &len in chunks {
            session.record_chunk(len);
        }
        session
    }

    #[test]
    fn test_lifecycle_reaches_completed() {
        let mut session = DownloadSession::new("http://host/a.png", "a.png");
        assert_eq!(session.state, SessionState::NotStarted);
        assert!(!session.is_terminal());

        session.begin(5);
        assert_eq!(session.state, SessionState::InProgress);
        session.record_chunk(5);

        assert_eq!(session.complete(), FetchStatus::Success);
        assert_eq!(session.state, SessionState::Completed);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_short_body_is_mismatch() {
        let mut session = session_with(5000, &[1024, 1024, 952]);
        assert_eq!(session.received, 3000);
        assert_eq!(session.complete(), FetchStatus::SizeMismatch);
        assert_eq!(session.state, SessionState::Failed);
    }

    #[test]
    fn test_over_delivery_is_mismatch() {
        let mut session = session_with(10, &[8, 8]);
        assert_eq!(session.complete(), FetchStatus::SizeMismatch);
    }

    #[test]
    fn test_unknown_total_never_mismatches() {
        let mut session = session_with(0, &[1, 2, 3]);
        assert_eq!(session.declared(), None);
        assert_eq!(session.complete(), FetchStatus::Success);

        let mut empty = session_with(0, &[]);
        assert_eq!(empty.complete(), FetchStatus::Success);
    }

    #[test]
    fn test_result_serializes_kebab_status() {
        let mut session = session_with(4, &[3]);
        let status = session.complete();
        let result = FetchResult::from_session(&session, status);
        assert!(!result.is_success());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "size-mismatch");
        assert_eq!(json["bytes_written"], 3);
        assert_eq!(json["declared_total"], 4);
    }
}
