// Verification engine module
// Orchestrates the generate and verify workflows over one directory tree

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::IntegrityError;
use super::hash::{digests_match, Algorithm, FileDigest, HashComputer};
use super::manifest::{Manifest, ManifestCodec, ManifestEntry};
use super::path_utils;
use super::progress::{percent, CancellationToken, Classification, FileEvent, ProgressSink};
use super::scan::FileEnumerator;
use crate::config::Settings;

/// Where a verify run gets its manifest from
#[derive(Debug, Clone)]
pub enum ManifestSource {
    /// Manifest text on disk, parsed when the run starts
    File(PathBuf),
    /// Already parsed manifest data
    Parsed(Manifest),
}

/// What a run does
#[derive(Debug, Clone)]
pub enum Mode {
    Generate,
    Verify(ManifestSource),
}

/// Lifecycle of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Terminal result of a run
///
/// `Cancelled` carries a partial result whose counts only cover the items
/// processed before the token was observed. `Failed` means setup went wrong
/// and no per-file work happened.
#[derive(Debug)]
pub enum RunOutcome<T> {
    Completed(T),
    Cancelled(T),
    Failed(IntegrityError),
}

impl<T> RunOutcome<T> {
    pub fn state(&self) -> EngineState {
        match self {
            RunOutcome::Completed(_) => EngineState::Completed,
            RunOutcome::Cancelled(_) => EngineState::Cancelled,
            RunOutcome::Failed(_) => EngineState::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled(_))
    }

    /// The result, complete or partial
    pub fn value(&self) -> Option<&T> {
        match self {
            RunOutcome::Completed(value) | RunOutcome::Cancelled(value) => Some(value),
            RunOutcome::Failed(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RunOutcome<U> {
        match self {
            RunOutcome::Completed(value) => RunOutcome::Completed(f(value)),
            RunOutcome::Cancelled(value) => RunOutcome::Cancelled(f(value)),
            RunOutcome::Failed(err) => RunOutcome::Failed(err),
        }
    }
}

/// Classification of one manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationOutcome {
    Ok,
    Corrupt,
    Missing,
}

impl From<VerificationOutcome> for Classification {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Ok => Classification::Ok,
            VerificationOutcome::Corrupt => Classification::Corrupt,
            VerificationOutcome::Missing => Classification::Missing,
        }
    }
}

/// Output of a generate run, in enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedManifest {
    pub entries: Vec<ManifestEntry>,
    /// Files that could not be read and are absent from `entries`
    pub skipped: Vec<String>,
}

impl GeneratedManifest {
    pub fn to_manifest(&self) -> Manifest {
        self.entries.iter().cloned().collect()
    }

    /// Manifest text, ready for the collaborator to persist
    pub fn serialize(&self) -> String {
        ManifestCodec::serialize(&self.entries)
    }
}

/// Output of a verify run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub ok_count: usize,
    pub corrupt_count: usize,
    pub missing_count: usize,
    pub extra_count: usize,
    /// Manifest entries in manifest order, as they resolved
    pub per_file_events: Vec<(String, VerificationOutcome)>,
    /// Files on disk the manifest does not describe, sorted
    pub extra_paths: Vec<String>,
}

impl VerificationResult {
    fn record(&mut self, path: &str, outcome: VerificationOutcome) {
        match outcome {
            VerificationOutcome::Ok => self.ok_count += 1,
            VerificationOutcome::Corrupt => self.corrupt_count += 1,
            VerificationOutcome::Missing => self.missing_count += 1,
        }
        self.per_file_events.push((path.to_string(), outcome));
    }

    pub fn outcome_of(&self, path: &str) -> Option<VerificationOutcome> {
        self.per_file_events
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, outcome)| *outcome)
    }

    /// Corrupt plus missing entries
    pub fn issues(&self) -> usize {
        self.corrupt_count + self.missing_count
    }

    pub fn is_clean(&self) -> bool {
        self.issues() == 0 && self.extra_count == 0
    }

    /// Tally block for the activity log
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "-".repeat(30),
            "VERIFICATION SUMMARY".to_string(),
            format!("Healthy: {}", self.ok_count),
            format!("Corrupt: {}", self.corrupt_count),
            format!("Missing: {}", self.missing_count),
            format!("Extra Files: {}", self.extra_count),
            "-".repeat(30),
        ]
    }
}

/// Result payload of either workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Report {
    Generated(GeneratedManifest),
    Verified(VerificationResult),
}

impl Report {
    pub fn as_generated(&self) -> Option<&GeneratedManifest> {
        match self {
            Report::Generated(generated) => Some(generated),
            Report::Verified(_) => None,
        }
    }

    pub fn as_verified(&self) -> Option<&VerificationResult> {
        match self {
            Report::Verified(result) => Some(result),
            Report::Generated(_) => None,
        }
    }
}

/// Engine for generating and verifying manifests of one directory tree
///
/// An engine runs once: all counters live inside the run and the result is
/// handed out when it ends. It never writes the manifest itself.
pub struct VerificationEngine {
    root: PathBuf,
    mode: Option<Mode>,
    computer: HashComputer,
    enumerator: FileEnumerator,
    state: EngineState,
}

impl VerificationEngine {
    pub fn new(root: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            root: root.into(),
            mode: Some(mode),
            computer: HashComputer::default(),
            enumerator: FileEnumerator::new(),
            state: EngineState::Idle,
        }
    }

    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_algorithm(settings.algorithm)
            .with_chunk_size(settings.chunk_size)
            .with_manifest_extension(&settings.manifest_extension)
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        let chunk_size = self.computer.chunk_size();
        self.computer = HashComputer::new(algorithm).with_chunk_size(chunk_size);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.computer = self.computer.with_chunk_size(chunk_size);
        self
    }

    pub fn with_manifest_extension(mut self, extension: &str) -> Self {
        self.enumerator = self.enumerator.with_manifest_extension(extension);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run the configured workflow to its end
    ///
    /// Progress and per-file events go to `sink` from the calling thread.
    pub fn run(
        &mut self,
        token: &CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> RunOutcome<Report> {
        let mode = match (self.state, self.mode.take()) {
            (EngineState::Idle, Some(mode)) => mode,
            _ => return RunOutcome::Failed(IntegrityError::AlreadyStarted),
        };

        self.state = EngineState::Running;
        let start = Instant::now();

        let outcome = match mode {
            Mode::Generate => self.run_generate(token, sink).map(Report::Generated),
            Mode::Verify(source) => self.run_verify(source, token, sink).map(Report::Verified),
        };

        self.state = outcome.state();
        info!(
            "Run over {} finished as {:?} in {:.2}s",
            self.root.display(),
            self.state,
            start.elapsed().as_secs_f64()
        );
        outcome
    }

    fn run_generate(
        &self,
        token: &CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> RunOutcome<GeneratedManifest> {
        let files = match self.enumerator.enumerate(&self.root) {
            Ok(files) => files,
            Err(e) => return RunOutcome::Failed(e),
        };

        let total = files.len();
        info!("Generating {} manifest for {} files under {}", self.computer.algorithm(), total, self.root.display());
        if total == 0 {
            sink.on_progress(100);
        }

        let mut generated = GeneratedManifest::default();

        for (index, relative) in files.iter().enumerate() {
            if token.is_cancelled() {
                return RunOutcome::Cancelled(generated);
            }

            let full_path = self.root.join(relative);
            match self.computer.digest(&full_path, token) {
                FileDigest::Digest(hex) => {
                    debug!("Hashed {}", relative);
                    generated.entries.push(ManifestEntry::new(relative.as_str(), hex));
                    sink.on_event(&FileEvent::new(relative.as_str(), Classification::Hashed));
                }
                FileDigest::Cancelled => return RunOutcome::Cancelled(generated),
                FileDigest::Failed(e) => {
                    warn!("Skipping unreadable file {}: {}", relative, e);
                    generated.skipped.push(relative.clone());
                    sink.on_event(
                        &FileEvent::new(relative.as_str(), Classification::Unreadable)
                            .with_detail(e.to_string()),
                    );
                }
            }

            sink.on_progress(percent(index + 1, total));
        }

        RunOutcome::Completed(generated)
    }

    fn run_verify(
        &self,
        source: ManifestSource,
        token: &CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> RunOutcome<VerificationResult> {
        let manifest = match source {
            ManifestSource::File(path) => match ManifestCodec::read(&path) {
                Ok(manifest) => manifest,
                Err(e) => return RunOutcome::Failed(e),
            },
            ManifestSource::Parsed(manifest) => manifest,
        };

        let files = match self.enumerator.enumerate(&self.root) {
            Ok(files) => files,
            Err(e) => return RunOutcome::Failed(e),
        };

        // Paths are consumed as manifest entries claim them; what is left at
        // the end is exactly the set of extra files
        let mut present: HashSet<&str> = files.iter().map(String::as_str).collect();

        let total = manifest.len();
        info!(
            "Verifying {} manifest entries against {} files under {}",
            total,
            files.len(),
            self.root.display()
        );
        if total == 0 {
            sink.on_progress(100);
        }

        let mut result = VerificationResult::default();

        for (index, (relative, expected)) in manifest.iter().enumerate() {
            if token.is_cancelled() {
                return RunOutcome::Cancelled(result);
            }

            let event = if present.remove(relative) {
                match path_utils::resolve_under_root(&self.root, relative) {
                    Some(full_path) => match self.computer.digest(&full_path, token) {
                        FileDigest::Digest(actual) if digests_match(expected, &actual) => {
                            FileEvent::new(relative, Classification::Ok)
                        }
                        FileDigest::Digest(actual) => FileEvent::new(relative, Classification::Corrupt)
                            .with_detail(format!("expected {}, got {}", expected, actual)),
                        FileDigest::Cancelled => return RunOutcome::Cancelled(result),
                        FileDigest::Failed(e) => {
                            warn!("Cannot hash {}: {}", relative, e);
                            FileEvent::new(relative, Classification::Corrupt).with_detail(e.to_string())
                        }
                    },
                    None => FileEvent::new(relative, Classification::Missing),
                }
            } else {
                FileEvent::new(relative, Classification::Missing)
            };

            let outcome = match event.classification {
                Classification::Ok => VerificationOutcome::Ok,
                Classification::Missing => VerificationOutcome::Missing,
                _ => VerificationOutcome::Corrupt,
            };
            debug!("{} {}", outcome_label(outcome), relative);
            result.record(relative, outcome);
            sink.on_event(&event);
            sink.on_progress(percent(index + 1, total));
        }

        result.extra_paths = files
            .iter()
            .filter(|path| present.contains(path.as_str()))
            .cloned()
            .collect();
        result.extra_count = result.extra_paths.len();
        for extra in &result.extra_paths {
            sink.on_event(&FileEvent::new(extra.as_str(), Classification::Extra));
        }

        RunOutcome::Completed(result)
    }
}

fn outcome_label(outcome: VerificationOutcome) -> &'static str {
    Classification::from(outcome).label()
}

// Tests live in tests/hash/engine_tests.rs
