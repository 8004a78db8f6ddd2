// Tests for log module

use std::fs;

use treeseal::hash::{Classification, EventLog, FileEvent, IntegrityError};

fn sample_log() -> EventLog {
    let mut log = EventLog::new();
    log.push_note("Verifying game");
    log.push_event(&FileEvent::new("a.txt", Classification::Ok));
    log.push_event(&FileEvent::new("b.txt", Classification::Corrupt).with_detail("expected x, got y"));
    log.push_event(&FileEvent::new("c.txt", Classification::Missing));
    log.push_event(&FileEvent::new("d.txt", Classification::Extra));
    log.push_summary(["Healthy: 1", "Corrupt: 1"]);
    log
}

#[test]
fn test_render_full() {
    let rendered = sample_log().render(false);
    assert_eq!(
        rendered,
        "Verifying game\n\
         OK: a.txt\n\
         CORRUPT: b.txt (expected x, got y)\n\
         MISSING: c.txt\n\
         NEW/UNKNOWN: d.txt\n\
         Healthy: 1\n\
         Corrupt: 1"
    );
}

#[test]
fn test_render_errors_only() {
    let rendered = sample_log().render(true);
    assert!(!rendered.contains("OK: a.txt"));
    assert!(!rendered.contains("Verifying game"));
    assert!(rendered.contains("CORRUPT: b.txt"));
    assert!(rendered.contains("MISSING: c.txt"));
    assert!(rendered.contains("NEW/UNKNOWN: d.txt"));
    assert!(rendered.contains("Healthy: 1"));
}

#[test]
fn test_export_writes_timestamped_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_log().export(dir.path(), "Halflife", false).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Halflife_log_"));
    assert!(name.ends_with(".txt"));
    // Halflife_log_ + YYYYmmdd_HHMMSS + .txt
    assert_eq!(name.len(), "Halflife_log_".len() + 15 + ".txt".len());

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, sample_log().render(false));
}

#[test]
fn test_export_empty_log_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = EventLog::new().export(dir.path(), "game", false);
    assert!(matches!(result, Err(IntegrityError::EmptyLog)));
}

#[test]
fn test_clear() {
    let mut log = sample_log();
    assert_eq!(log.len(), 7);
    log.clear();
    assert!(log.is_empty());
}

#[test]
fn test_color_hints() {
    assert_eq!(Classification::Ok.color_hint(), "#66BB6A");
    assert_eq!(Classification::Corrupt.color_hint(), "#FFA726");
    assert_eq!(Classification::Missing.color_hint(), "#FF5252");
    assert_eq!(Classification::Extra.color_hint(), "#BA68C8");
    assert!(!Classification::Hashed.is_problem());
    assert!(Classification::Unreadable.is_problem());
}
