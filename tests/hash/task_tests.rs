// Tests for task module
// Background runs drained through their message channel

use treeseal::config::Settings;
use treeseal::hash::{
    task, CancellationToken, Classification, EngineMessage, IntegrityError, ManifestCodec,
    ManifestSource, Mode, Report, RunOutcome, VerificationEngine,
};

use crate::common::{create_test_file, hello_world_tree, HELLO_MD5, WORLD_MD5};

fn drain(handle: &task::OperationHandle) -> Vec<EngineMessage> {
    handle.messages().iter().collect()
}

#[test]
fn test_background_generate() {
    let dir = hello_world_tree();
    let handle = task::generate(dir.path(), &Settings::default());

    let messages = drain(&handle);
    let outcome = handle.join();

    let generated = outcome.value().and_then(Report::as_generated).unwrap();
    assert_eq!(
        generated.serialize(),
        format!("{} *a.txt\n{} *b.txt", HELLO_MD5, WORLD_MD5)
    );
    assert_eq!(messages.last(), Some(&EngineMessage::Progress(100)));
}

#[test]
fn test_background_verify() {
    let dir = hello_world_tree();
    create_test_file(&dir.path().join("new.txt"), b"new");
    let manifest = ManifestCodec::parse(&format!("{} *a.txt\n{} *gone.txt", HELLO_MD5, WORLD_MD5));

    let handle = task::verify(dir.path(), ManifestSource::Parsed(manifest), &Settings::default());
    let events: Vec<Classification> = drain(&handle)
        .into_iter()
        .filter_map(|m| match m {
            EngineMessage::Event(e) => Some(e.classification),
            EngineMessage::Progress(_) => None,
        })
        .collect();
    let outcome = handle.join();

    assert_eq!(
        events,
        vec![
            Classification::Ok,
            Classification::Missing,
            Classification::Extra,
            Classification::Extra
        ]
    );
    let result = outcome.value().and_then(Report::as_verified).unwrap();
    assert_eq!(result.extra_paths, vec!["b.txt", "new.txt"]);
}

#[test]
fn test_background_cancel_from_collaborator() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..50 {
        create_test_file(&dir.path().join(format!("f{:02}.bin", i)), &[0u8; 1024]);
    }

    let token = CancellationToken::new();
    token.cancel();
    let engine = VerificationEngine::new(dir.path(), Mode::Generate);
    let handle = task::spawn_with_token(engine, token);
    assert!(handle.token().is_cancelled());

    let messages = drain(&handle);
    let outcome = handle.join();
    assert!(outcome.is_cancelled());
    assert!(messages.is_empty());
}

#[test]
fn test_cancel_through_handle() {
    let dir = hello_world_tree();
    let handle = task::generate(dir.path(), &Settings::default());
    handle.cancel();

    // Depending on timing the run may already be over
    let outcome = handle.join();
    assert!(outcome.is_cancelled() || outcome.is_completed());
}

#[test]
fn test_background_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let handle = task::generate(&dir.path().join("missing"), &Settings::default());

    assert!(drain(&handle).is_empty());
    assert!(matches!(
        handle.join(),
        RunOutcome::Failed(IntegrityError::DirectoryNotFound { .. })
    ));
}
