// Progress reporting module
// Cancellation token and sink interfaces; the engine samples the token at file
// and chunk boundaries and calls the sink from its own thread, in order

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::Serialize;

/// Cooperative cancellation flag shared between a collaborator and a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// How a single path resolved during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Generate mode: digest computed and recorded.
    Hashed,
    /// Generate mode: file could not be read and was left out.
    Unreadable,
    Ok,
    Corrupt,
    Missing,
    /// On disk but not described by the manifest.
    Extra,
}

impl Classification {
    /// Display colour suggested to presentation layers, as `#RRGGBB`.
    pub fn color_hint(self) -> &'static str {
        match self {
            Classification::Hashed => "#B0BEC5",
            Classification::Unreadable => "#FFA726",
            Classification::Ok => "#66BB6A",
            Classification::Corrupt => "#FFA726",
            Classification::Missing => "#FF5252",
            Classification::Extra => "#BA68C8",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Hashed => "HASHED",
            Classification::Unreadable => "UNREADABLE",
            Classification::Ok => "OK",
            Classification::Corrupt => "CORRUPT",
            Classification::Missing => "MISSING",
            Classification::Extra => "NEW/UNKNOWN",
        }
    }

    /// Everything except a clean hash or a healthy verify.
    pub fn is_problem(self) -> bool {
        !matches!(self, Classification::Hashed | Classification::Ok)
    }
}

/// A per-file event emitted as each path resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    pub path: String,
    pub classification: Classification,
    /// Extra context, e.g. the I/O error behind an unreadable file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FileEvent {
    pub fn new(path: impl Into<String>, classification: Classification) -> Self {
        Self {
            path: path.into(),
            classification,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn color_hint(&self) -> &'static str {
        self.classification.color_hint()
    }

    /// One-line rendering used by the activity log.
    pub fn to_line(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {} ({})", self.classification.label(), self.path, detail),
            None => format!("{}: {}", self.classification.label(), self.path),
        }
    }
}

/// Receiver for engine progress; implemented by the collaborator.
pub trait ProgressSink {
    /// Percentage in `0..=100`, non-decreasing within one run.
    fn on_progress(&mut self, percent: u8);

    fn on_event(&mut self, event: &FileEvent);
}

/// Message form of the sink calls, for channel delivery across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    Progress(u8),
    Event(FileEvent),
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&mut self, _percent: u8) {}

    fn on_event(&mut self, _event: &FileEvent) {}
}

/// Forwards sink calls into a crossbeam channel.
///
/// Sends to a disconnected receiver are ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<EngineMessage>,
}

impl ChannelSink {
    pub fn new(tx: Sender<EngineMessage>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(EngineMessage::Progress(percent));
    }

    fn on_event(&mut self, event: &FileEvent) {
        let _ = self.tx.send(EngineMessage::Event(event.clone()));
    }
}

/// Adapts a closure over `EngineMessage` into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(EngineMessage)> ProgressSink for FnSink<F> {
    fn on_progress(&mut self, percent: u8) {
        (self.0)(EngineMessage::Progress(percent));
    }

    fn on_event(&mut self, event: &FileEvent) {
        (self.0)(EngineMessage::Event(event.clone()));
    }
}

/// Integer percentage of `done` over `total`; an empty run is complete.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
