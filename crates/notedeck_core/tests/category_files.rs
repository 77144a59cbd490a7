mod common;

use common::{set_mtime, write_file};
use notedeck_core::{CategoryResourceFiles, RepoError, SortStrategy};
use std::fs;

#[test]
fn scan_directory_classifies_notes_and_single_image() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Rust");
    write_file(&dir, "traits.md", "traits", 10);
    write_file(&dir, "zzz.png", "img", 20);
    write_file(&dir, "RUST.jpg", "img", 30);
    write_file(&dir, ".hidden.md", "skip me", 40);
    fs::create_dir_all(dir.join("nested")).unwrap();

    let files =
        CategoryResourceFiles::scan_directory("Rust", &dir, SortStrategy::Title, true).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files.notes()[0].title(), "traits");
    let image = files.image().expect("one image should survive");
    assert!(image.path.ends_with("RUST.jpg"));
}

#[test]
fn scan_directory_without_images_has_no_image() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Empty");
    fs::create_dir_all(&dir).unwrap();
    let files = CategoryResourceFiles::scan_directory(
        "Empty",
        &dir,
        SortStrategy::LastModifiedDate,
        false,
    )
    .unwrap();
    assert!(files.is_empty());
    assert!(files.image().is_none());
}

#[test]
fn scan_missing_directory_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let err = CategoryResourceFiles::scan_directory(
        "Ghost",
        &root.path().join("Ghost"),
        SortStrategy::Title,
        true,
    )
    .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn get_md_notes_parses_all_notes_in_index_order() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    for name in ["a", "b", "c", "d", "e", "f"] {
        write_file(&dir, &format!("{name}.md"), &format!("# {name}\n\nbody {name}"), 100);
    }
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();

    let docs = files.get_md_notes(false).unwrap();
    assert_eq!(docs.len(), 6);
    for (position, doc) in docs.iter().enumerate() {
        assert_eq!(doc.idx, position);
        assert_eq!(doc.category, "Go");
        assert!(doc.raw_text.contains(&format!("body {}", doc.title)));
    }
    assert!(files.notes().iter().all(|note| note.document.is_some()));
}

#[test]
fn get_md_notes_refresh_rereads_changed_files() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    let path = write_file(&dir, "a.md", "old body", 100);
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();
    assert_eq!(files.get_md_notes(false).unwrap()[0].raw_text, "old body");

    fs::write(&path, "new body").unwrap();
    assert_eq!(files.get_md_notes(false).unwrap()[0].raw_text, "old body");
    assert_eq!(files.get_md_notes(true).unwrap()[0].raw_text, "new body");
}

#[test]
fn get_md_notes_reports_vanished_file_but_keeps_others() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    write_file(&dir, "a.md", "a", 100);
    let gone = write_file(&dir, "b.md", "b", 100);
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();
    fs::remove_file(&gone).unwrap();

    assert!(files.get_md_notes(false).is_err());
    assert!(files.notes()[0].document.is_some());
    assert!(files.notes()[1].document.is_none());

    let (documents, failures) = files.parse_md_notes(false).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "a");
    assert!(matches!(failures.as_slice(), [RepoError::NotFound(_)]));
}

#[test]
fn parse_md_notes_refresh_reports_every_failure() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    let first = write_file(&dir, "a.md", "a", 100);
    let second = write_file(&dir, "b.md", "b", 100);
    write_file(&dir, "c.md", "c", 100);
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();
    fs::remove_file(&first).unwrap();
    fs::remove_file(&second).unwrap();

    let (documents, failures) = files.parse_md_notes(true).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].idx, 2);
    assert_eq!(failures.len(), 2);
}

#[test]
fn add_note_from_path_appends_and_reindexes() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    write_file(&dir, "b.md", "b", 100);
    write_file(&dir, "d.md", "d", 100);
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();

    let added = write_file(&dir, "c.md", "c", 100);
    let idx = files.add_note_from_path(added.clone()).unwrap();
    assert_eq!(idx, 1);
    assert_eq!(files.len(), 3);
    assert_eq!(files.get_note_by_idx(2).unwrap().title(), "d");
    assert!(matches!(
        files.add_note_from_path(added),
        Err(RepoError::AlreadyExists(_))
    ));
}

#[test]
fn update_ages_then_reindex_moves_edited_note_first() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    write_file(&dir, "new.md", "n", 300);
    write_file(&dir, "mid.md", "m", 200);
    let old = write_file(&dir, "old.md", "o", 100);
    let mut files = CategoryResourceFiles::scan_directory(
        "Go",
        &dir,
        SortStrategy::LastModifiedDate,
        false,
    )
    .unwrap();
    assert_eq!(files.get_note_by_idx(2).unwrap().path, old);
    files.get_md_notes(false).unwrap();

    set_mtime(&old, 900);
    files.update_note_ages(Some(std::slice::from_ref(&old))).unwrap();
    files.reindex_notes();

    let first = files.get_note_by_idx(0).unwrap();
    assert_eq!(first.path, old);
    assert_eq!(first.document.as_ref().unwrap().idx, 0);
    let titles = files.notes().iter().map(|n| n.title()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["old", "new", "mid"]);
}

#[test]
fn remove_note_by_path_keeps_indices_contiguous() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("Go");
    write_file(&dir, "a.md", "a", 100);
    let b = write_file(&dir, "b.md", "b", 100);
    write_file(&dir, "c.md", "c", 100);
    let mut files =
        CategoryResourceFiles::scan_directory("Go", &dir, SortStrategy::Title, true).unwrap();

    files.remove_note_by_path(&b).unwrap();
    let indices = files.notes().iter().map(|n| n.index).collect::<Vec<_>>();
    assert_eq!(indices, vec![0, 1]);
    assert!(files.remove_note_by_path(&b).is_err());
}
