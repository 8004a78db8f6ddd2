// Tests for library listing

use std::fs;
use std::path::PathBuf;

use treeseal::config::Settings;
use treeseal::library::Library;

use crate::common::create_test_file;

#[test]
fn test_library_lists_sorted_roots_with_manifests() {
    let library_dir = tempfile::tempdir().unwrap();
    let checksums = tempfile::tempdir().unwrap();
    fs::create_dir_all(library_dir.path().join("Portal")).unwrap();
    fs::create_dir_all(library_dir.path().join("Halflife")).unwrap();
    create_test_file(&library_dir.path().join("loose_file.txt"), b"not a root");
    create_test_file(&checksums.path().join("Portal.md5"), b"");

    let settings = Settings {
        checksum_dir: checksums.path().to_path_buf(),
        ..Settings::default()
    };
    let library = Library::open(library_dir.path(), &settings).unwrap();

    let names: Vec<&str> = library.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Halflife", "Portal"]);
    assert_eq!(library.entries()[0].manifest, None);
    assert_eq!(
        library.entries()[1].manifest,
        Some(checksums.path().join("Portal.md5"))
    );
    assert_eq!(library.root(), library_dir.path());
}

#[test]
fn test_library_search_is_case_insensitive() {
    let library_dir = tempfile::tempdir().unwrap();
    for name in ["Half-Life", "Half-Life 2", "Portal"] {
        fs::create_dir_all(library_dir.path().join(name)).unwrap();
    }

    let library = Library::open(library_dir.path(), &Settings::default()).unwrap();
    let hits: Vec<&str> = library.search("half").map(|e| e.name.as_str()).collect();
    assert_eq!(hits, vec!["Half-Life", "Half-Life 2"]);
    assert_eq!(library.search("").count(), 3);
}

#[test]
fn test_library_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Library::open(&dir.path().join("nope"), &Settings::default()).is_err());
}

#[test]
fn test_manifest_path() {
    assert_eq!(
        Library::manifest_path(&PathBuf::from("Checksums"), "Portal", ".md5"),
        PathBuf::from("Checksums").join("Portal.md5")
    );
}
