// Tests for manifest module

use std::fs;

use treeseal::hash::{IntegrityError, Manifest, ManifestCodec, ManifestEntry};

use crate::common::{HELLO_MD5, WORLD_MD5};

#[test]
fn test_parse_basic_manifest() {
    let text = format!("{} *a.txt\n{} *b.txt", HELLO_MD5, WORLD_MD5);
    let manifest = ManifestCodec::parse(&text);

    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.get("a.txt"), Some(HELLO_MD5));
    assert_eq!(manifest.get("b.txt"), Some(WORLD_MD5));
}

#[test]
fn test_parse_skips_comments_blank_and_malformed_lines() {
    let text = format!(
        "; generated by some tool\n\n   \n{}\njustonetoken\n{} *a.txt\n",
        "onlydigest", HELLO_MD5
    );
    let manifest = ManifestCodec::parse(&text);

    assert_eq!(manifest.len(), 1);
    assert!(manifest.contains("a.txt"));
}

#[test]
fn test_parse_paths_with_spaces_and_markers() {
    let text = format!(
        "{}   *My Documents/save game 1.dat\n{} b.txt\n{} **double.txt",
        HELLO_MD5, WORLD_MD5, HELLO_MD5
    );
    let manifest = ManifestCodec::parse(&text);

    assert_eq!(manifest.get("My Documents/save game 1.dat"), Some(HELLO_MD5));
    assert_eq!(manifest.get("b.txt"), Some(WORLD_MD5));
    assert_eq!(manifest.get("double.txt"), Some(HELLO_MD5));
}

#[test]
fn test_parse_tab_separator_and_crlf() {
    let text = format!("{}\t*a.txt\r\n{} *b.txt\r\n", HELLO_MD5, WORLD_MD5);
    let manifest = ManifestCodec::parse(&text);

    assert_eq!(manifest.get("a.txt"), Some(HELLO_MD5));
    assert_eq!(manifest.get("b.txt"), Some(WORLD_MD5));
}

#[test]
fn test_parse_normalizes_backslashes() {
    let text = format!("{} *bin\\x64\\game.exe", HELLO_MD5);
    let manifest = ManifestCodec::parse(&text);
    assert_eq!(manifest.get("bin/x64/game.exe"), Some(HELLO_MD5));
}

#[test]
fn test_parse_lowercases_digest() {
    let text = format!("{} *a.txt", HELLO_MD5.to_uppercase());
    let manifest = ManifestCodec::parse(&text);
    assert_eq!(manifest.get("a.txt"), Some(HELLO_MD5));
}

#[test]
fn test_parse_duplicate_last_wins_first_position_kept() {
    let text = format!(
        "{} *a.txt\n{} *b.txt\n{} *a.txt",
        HELLO_MD5, WORLD_MD5, WORLD_MD5
    );
    let manifest = ManifestCodec::parse(&text);

    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.get("a.txt"), Some(WORLD_MD5));
    let order: Vec<&str> = manifest.iter().map(|(path, _)| path).collect();
    assert_eq!(order, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_parse_strips_bom() {
    let text = format!("\u{feff}{} *a.txt", HELLO_MD5);
    let manifest = ManifestCodec::parse(&text);
    assert_eq!(manifest.get("a.txt"), Some(HELLO_MD5));
}

#[test]
fn test_parse_empty_text() {
    assert!(ManifestCodec::parse("").is_empty());
    assert!(ManifestCodec::parse("; nothing here\n\n").is_empty());
}

#[test]
fn test_serialize_format() {
    let entries = vec![
        ManifestEntry::new("a.txt", HELLO_MD5),
        ManifestEntry::new("data/b.txt", WORLD_MD5),
    ];
    assert_eq!(
        ManifestCodec::serialize(&entries),
        format!("{} *a.txt\n{} *data/b.txt", HELLO_MD5, WORLD_MD5)
    );
    assert_eq!(ManifestCodec::serialize(&Vec::<ManifestEntry>::new()), "");
}

#[test]
fn test_serialize_then_parse_preserves_order() {
    let entries = vec![
        ManifestEntry::new("z.txt", HELLO_MD5),
        ManifestEntry::new("a b/c.txt", WORLD_MD5),
    ];
    let manifest = ManifestCodec::parse(&ManifestCodec::serialize(&entries));
    assert_eq!(manifest.entries(), entries);
    assert_eq!(ManifestCodec::serialize_manifest(&manifest), ManifestCodec::serialize(&entries));
}

#[test]
fn test_manifest_from_entries() {
    let manifest: Manifest = vec![
        ManifestEntry::new("a.txt", "AA"),
        ManifestEntry::new("a.txt", "bb"),
    ]
    .into_iter()
    .collect();
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.get("a.txt"), Some("bb"));
}

#[test]
fn test_write_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Checksums").join("game.md5");
    let entries = vec![ManifestEntry::new("a.txt", HELLO_MD5)];

    ManifestCodec::write(&path, &entries).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{} *a.txt", HELLO_MD5));

    let manifest = ManifestCodec::read(&path).unwrap();
    assert_eq!(manifest.get("a.txt"), Some(HELLO_MD5));
}

#[test]
fn test_read_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let result = ManifestCodec::read(&dir.path().join("missing.md5"));
    assert!(matches!(result, Err(IntegrityError::ManifestRead { .. })));
}

#[test]
fn test_read_non_utf8_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.md5");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x41, 0x80]).unwrap();

    let result = ManifestCodec::read(&path);
    assert!(matches!(result, Err(IntegrityError::ManifestRead { .. })));
}
