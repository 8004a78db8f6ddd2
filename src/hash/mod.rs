// Integrity engine
// Hashing, manifest handling and the generate/verify workflows

pub mod engine;
pub mod error;
pub mod hash;
pub mod log;
pub mod manifest;
pub mod path_utils;
pub mod progress;
pub mod scan;
pub mod task;

// Re-export commonly used types for convenience
pub use engine::{
    EngineState, GeneratedManifest, ManifestSource, Mode, Report, RunOutcome, VerificationEngine,
    VerificationOutcome, VerificationResult,
};
pub use error::IntegrityError;
pub use hash::{Algorithm, AlgorithmInfo, FileDigest, HashComputer, HashRegistry, Hasher};
pub use log::EventLog;
pub use manifest::{Manifest, ManifestCodec, ManifestEntry};
pub use progress::{
    CancellationToken, ChannelSink, Classification, EngineMessage, FileEvent, FnSink, NullSink,
    ProgressSink,
};
pub use scan::FileEnumerator;
pub use task::OperationHandle;
