//! Scan progress reporting.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Running counts after an entry has been stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Directories stored so far, the root included.
    pub folder_count: u64,
    /// Files stored so far.
    pub file_count: u64,
}

impl ScanProgress {
    /// Total entries stored so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.folder_count + self.file_count
    }
}

/// Receives one progress update per stored entry, in order.
pub trait ProgressSink {
    fn on_progress(&mut self, progress: ScanProgress);
}

impl<F: FnMut(ScanProgress)> ProgressSink for F {
    fn on_progress(&mut self, progress: ScanProgress) {
        self(progress);
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: ScanProgress) {}
}

/// Channel-backed sink. The scan produces, whoever holds the receiver consumes.
///
/// Unbounded so the producer never blocks and no update is dropped. Once the
/// receiver is gone further updates are discarded and the scan carries on.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: mpsc::UnboundedSender<ScanProgress>,
}

impl ProgressChannel {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ProgressChannel {
    fn on_progress(&mut self, progress: ScanProgress) {
        let _ = self.tx.send(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_receives_updates() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: ScanProgress| seen.push(p.total());
            sink.on_progress(ScanProgress {
                folder_count: 1,
                file_count: 0,
            });
            sink.on_progress(ScanProgress {
                folder_count: 1,
                file_count: 2,
            });
        }
        assert_eq!(seen, [1, 3]);
    }

    #[test]
    fn channel_sink_preserves_order() {
        let (mut sink, mut rx) = ProgressChannel::new();
        for i in 1..=3 {
            sink.on_progress(ScanProgress {
                folder_count: 1,
                file_count: i,
            });
        }
        drop(sink);
        let mut counts = Vec::new();
        while let Ok(p) = rx.try_recv() {
            counts.push(p.file_count);
        }
        assert_eq!(counts, [1, 2, 3]);
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (mut sink, rx) = ProgressChannel::new();
        drop(rx);
        sink.on_progress(ScanProgress::default());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&ScanProgress {
            folder_count: 2,
            file_count: 5,
        })
        .unwrap();
        assert_eq!(json, r#"{"folderCount":2,"fileCount":5}"#);
    }
}
