mod common;

use common::{python_storage, repository, write_file};
use notedeck_core::{QueryFailureKind, RepoEvent, Suggestion};
use std::fs;

#[test]
fn title_only_match_returns_single_note() {
    let root = python_storage();
    let (mut repo, _sink) = repository(root.path(), "title", true);
    repo.discover_categories();

    let hits = repo.query_notes("Python", "GENERA").unwrap();
    assert_eq!(
        hits,
        vec![Suggestion {
            title: "generators".to_string(),
            idx: 1,
        }]
    );
}

#[test]
fn binary_ties_are_ranked_by_occurrence_count() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Lang");
    write_file(&dir, "alpha.md", "tokio once", 100);
    write_file(&dir, "beta.md", "tokio tokio tokio", 100);
    write_file(&dir, "gamma.md", "nothing relevant", 100);
    let (mut repo, _sink) = repository(root.path(), "title", true);
    repo.discover_categories();

    let hits = repo.query_notes("Lang", "tokio").unwrap();
    let titles = hits.iter().map(|hit| hit.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["beta", "alpha"]);
    assert_eq!(hits[0].idx, 1);
}

#[test]
fn title_and_body_match_outranks_body_only_without_tie() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Lang");
    write_file(&dir, "a-notes.md", "serde serde serde", 100);
    write_file(&dir, "serde.md", "serde derive macros", 100);
    let (mut repo, _sink) = repository(root.path(), "title", true);
    repo.discover_categories();

    let hits = repo.query_notes("Lang", "serde").unwrap();
    let titles = hits.iter().map(|hit| hit.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["serde", "a-notes"]);
}

#[test]
fn no_match_returns_none() {
    let root = python_storage();
    let (mut repo, sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    sink.drain();
    assert!(repo.query_notes("Python", "haskell").is_none());
    assert!(sink.is_empty());
}

#[test]
fn empty_query_returns_every_note_by_length() {
    let root = python_storage();
    let (mut repo, sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    sink.drain();

    let hits = repo.query_notes("Python", "").unwrap();
    let titles = hits.iter().map(|hit| hit.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["decorators", "generators", "loops"]);
    assert!(sink.is_empty());
}

#[test]
fn unreadable_note_is_reported_and_others_still_searched() {
    let root = python_storage();
    let blob = root.path().join("Python").join("blob.bin");
    fs::write(&blob, [0xff_u8, 0xfe, 0x00, 0xc3]).unwrap();
    let (mut repo, sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    sink.drain();

    let hits = repo.query_notes("Python", "yield").unwrap();
    assert_eq!(
        hits,
        vec![Suggestion {
            title: "generators".to_string(),
            idx: 2,
        }]
    );
    assert!(matches!(
        sink.drain().as_slice(),
        [RepoEvent::QueryFailure {
            kind: QueryFailureKind::PermissionError,
            ..
        }]
    ));
}

#[test]
fn unknown_category_reports_not_found() {
    let root = python_storage();
    let (mut repo, sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    sink.drain();

    assert!(repo.query_notes("Cobol", "x").is_none());
    assert!(matches!(
        sink.drain().as_slice(),
        [RepoEvent::QueryFailure {
            kind: QueryFailureKind::NotFound,
            ..
        }]
    ));
}

#[test]
fn search_sees_saved_edits() {
    let root = python_storage();
    let (mut repo, _sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    assert!(repo.query_notes("Python", "asyncio").is_none());

    repo.set_current_category(Some("Python")).unwrap();
    let doc = repo.get_note(2).unwrap();
    let mut edit = notedeck_core::EditableNote::from_document(&doc);
    edit.edit_text.push_str("\n\nasyncio event loops");
    repo.save_note(edit, |_, _| {});
    repo.run_pending();

    let hits = repo.query_notes("Python", "asyncio").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "loops");
}
