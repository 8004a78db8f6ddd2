// Tests for error module

use std::error::Error;
use std::io;
use std::path::PathBuf;

use treeseal::hash::IntegrityError;

#[test]
fn test_directory_not_found_display() {
    let error = IntegrityError::DirectoryNotFound {
        path: PathBuf::from("/games/missing"),
    };
    let message = error.to_string();
    assert!(message.contains("Directory not found"));
    assert!(message.contains("/games/missing"));
    assert!(message.contains("Suggestion"));
}

#[test]
fn test_unsupported_algorithm_display() {
    let error = IntegrityError::UnsupportedAlgorithm {
        algorithm: "crc32".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("crc32"));
    assert!(message.contains("treeseal algorithms"));
}

#[test]
fn test_from_io_error_mapping() {
    let path = PathBuf::from("x");

    let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
    assert!(matches!(
        IntegrityError::from_io_error(not_found, "scanning directory", path.clone()),
        IntegrityError::DirectoryNotFound { .. }
    ));

    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    assert!(matches!(
        IntegrityError::from_io_error(denied, "scanning directory", path.clone()),
        IntegrityError::Enumeration { .. }
    ));

    let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
    assert!(matches!(
        IntegrityError::from_io_error(missing, "reading manifest", path.clone()),
        IntegrityError::ManifestRead { .. }
    ));

    let full = io::Error::new(io::ErrorKind::Other, "disk full");
    assert!(matches!(
        IntegrityError::from_io_error(full, "writing manifest", path.clone()),
        IntegrityError::ManifestWrite { .. }
    ));

    let read = io::Error::new(io::ErrorKind::Other, "bad sector");
    let error = IntegrityError::from_io_error(read, "reading", path);
    assert!(matches!(error, IntegrityError::FileIo { .. }));
    assert!(error.to_string().contains("reading"));
}

#[test]
fn test_source_is_preserved() {
    let error = IntegrityError::from_io_error(
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        "opening",
        PathBuf::from("locked.bin"),
    );
    let source = error.source().unwrap();
    assert_eq!(source.to_string(), "denied");
}

#[test]
fn test_fatal_classification() {
    let per_file = IntegrityError::FileIo {
        path: PathBuf::from("a"),
        operation: "reading".to_string(),
        source: io::Error::new(io::ErrorKind::Other, "x"),
    };
    assert!(!per_file.is_fatal());
    assert!(IntegrityError::NotADirectory { path: PathBuf::from("a") }.is_fatal());
}
