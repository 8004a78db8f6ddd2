// Centralized error handling module
// Error taxonomy for enumeration, manifest I/O and per-file hashing

use std::io;
use std::path::PathBuf;

/// Main error type for integrity runs
///
/// Setup failures (`DirectoryNotFound`, `NotADirectory`, `Enumeration`,
/// `ManifestRead`) are fatal to a run. `FileIo` only ever describes a single
/// file and is recorded as an outcome, never propagated as a run failure.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("Directory not found: {}\nSuggestion: Check that the directory path is correct and the directory exists", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {}\nSuggestion: Point the scan at the folder that contains the files, not at a single file", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Cannot enumerate {}: {source}\nSuggestion: Check directory permissions", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read manifest {}: {source}\nSuggestion: Check that the manifest exists and is a UTF-8 text file", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write manifest {}: {source}\nSuggestion: Check disk space and write permissions", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while {operation} {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Run `treeseal algorithms` to see available algorithms")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Engine already started\nSuggestion: Build a new engine for every run")]
    AlreadyStarted,

    #[error("Nothing to export: the activity log is empty")]
    EmptyLog,

    #[error("Worker thread panicked")]
    WorkerPanicked,
}

impl IntegrityError {
    /// Create an error with context about the operation and the path involved
    ///
    /// A missing root or manifest maps to its dedicated variant so the
    /// collaborator can tell setup failures apart from per-file faults.
    pub fn from_io_error(err: io::Error, operation: &str, path: PathBuf) -> Self {
        match (err.kind(), operation) {
            (io::ErrorKind::NotFound, "scanning directory") => {
                IntegrityError::DirectoryNotFound { path }
            }
            (_, "scanning directory") => IntegrityError::Enumeration { path, source: err },
            (_, "reading manifest") => IntegrityError::ManifestRead { path, source: err },
            (_, "writing manifest") => IntegrityError::ManifestWrite { path, source: err },
            _ => IntegrityError::FileIo {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// True for errors that stop a run before any per-file work begins
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IntegrityError::FileIo { .. })
    }
}

pub type Result<T> = std::result::Result<T, IntegrityError>;
