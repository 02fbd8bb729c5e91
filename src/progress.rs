//! Progress reporting for a running fetch.
//!
//! Observers are informational only; nothing they do changes the read loop.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::session::{DownloadSession, SessionState};

pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _total: Option<u64>) {}

    /// Called once per chunk written, with the running byte count.
    fn on_chunk(&self, received: u64, total: Option<u64>);

    fn on_finish(&self, _session: &DownloadSession) {}
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_chunk(&self, _received: u64, _total: Option<u64>) {}
}

/// Terminal progress bar. Falls back to a spinner when the size is unknown.
pub struct BarProgress {
    pb: ProgressBar,
    label: String,
}

impl BarProgress {
    pub fn new(label: impl Into<String>) -> Self {
        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(5));
        Self {
            pb,
            label: label.into(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            label: String::new(),
        }
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }
}

impl ProgressObserver for BarProgress {
    fn on_start(&self, total: Option<u64>) {
        let style = match total {
            Some(len) => {
                self.pb.set_length(len);
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>12}/{total_bytes:<12} {bytes_per_sec:>12} {eta:>4} {msg}")
                    .map(|s| s.progress_chars("=>-"))
            }
            None => ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes:>12} {bytes_per_sec:>12} {msg}"),
        };
        if let Ok(style) = style {
            self.pb.set_style(style);
        }
        self.pb.set_message(format!("Downloading {}", self.label));
    }

    fn on_chunk(&self, received: u64, _total: Option<u64>) {
        self.pb.set_position(received);
    }

    fn on_finish(&self, session: &DownloadSession) {
        match session.state {
            SessionState::Completed => {
                self.pb.finish_with_message(format!("Completed   {}", self.label))
            }
            _ => self.pb.abandon_with_message(format!("Failed      {}", self.label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_tracks_position() {
        let bar = BarProgress::hidden();
        bar.on_start(Some(5000));
        bar.on_chunk(1024, Some(5000));
        bar.on_chunk(2048, Some(5000));
        assert_eq!(bar.position(), 2048);

        let mut session = DownloadSession::new("http://host/x", "x");
        session.begin(5000);
        session.fail();
        bar.on_finish(&session);
    }
}
