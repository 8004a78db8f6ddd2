// Background task module
// Runs one engine per worker thread and forwards sink calls over a channel

use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};

use super::engine::{ManifestSource, Mode, Report, RunOutcome, VerificationEngine};
use super::error::IntegrityError;
use super::progress::{CancellationToken, ChannelSink, EngineMessage};
use crate::config::Settings;

/// Handle to a run executing on its own thread
pub struct OperationHandle {
    token: CancellationToken,
    messages: Receiver<EngineMessage>,
    worker: JoinHandle<RunOutcome<Report>>,
}

impl OperationHandle {
    /// Ask the run to stop at the next file or chunk boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Progress and event stream; closes when the run ends
    pub fn messages(&self) -> &Receiver<EngineMessage> {
        &self.messages
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the run to end
    pub fn join(self) -> RunOutcome<Report> {
        self.worker
            .join()
            .unwrap_or_else(|_| RunOutcome::Failed(IntegrityError::WorkerPanicked))
    }
}

/// Start `engine` on a new worker thread
pub fn spawn(engine: VerificationEngine) -> OperationHandle {
    spawn_with_token(engine, CancellationToken::new())
}

/// Start `engine` with a token the caller already holds
pub fn spawn_with_token(mut engine: VerificationEngine, token: CancellationToken) -> OperationHandle {
    let (tx, rx) = unbounded();
    let worker_token = token.clone();

    let worker = thread::spawn(move || {
        let mut sink = ChannelSink::new(tx);
        engine.run(&worker_token, &mut sink)
    });

    OperationHandle {
        token,
        messages: rx,
        worker,
    }
}

/// Hash every file under `root` in the background
pub fn generate(root: &Path, settings: &Settings) -> OperationHandle {
    spawn(VerificationEngine::new(root, Mode::Generate).with_settings(settings))
}

/// Check `root` against a manifest in the background
pub fn verify(root: &Path, source: ManifestSource, settings: &Settings) -> OperationHandle {
    spawn(VerificationEngine::new(root, Mode::Verify(source)).with_settings(settings))
}
