mod common;

use common::{python_storage, repository, slot, write_file};
use notedeck_core::RepoEvent;
use std::fs;
use std::path::PathBuf;

fn create(
    repo: &mut notedeck_core::NoteRepository,
    name: &str,
    image: Option<PathBuf>,
) -> std::rc::Rc<std::cell::RefCell<Option<(bool, PathBuf)>>> {
    let outcome = slot();
    let sink = outcome.clone();
    repo.create_category(name, image, move |ok, path| {
        *sink.borrow_mut() = Some((ok, path));
    });
    outcome
}

#[test]
fn create_category_runs_three_steps_and_notifies() {
    let root = python_storage();
    let assets = tempfile::tempdir().unwrap();
    let image = write_file(assets.path(), "logo.JPEG", "jpeg bytes", 10);
    let (mut repo, sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    sink.drain();

    let outcome = create(&mut repo, "Rust", Some(image));
    assert_eq!(repo.pending_chains(), 1);
    assert_eq!(repo.run_pending(), 3);

    let (ok, path) = outcome.borrow_mut().take().unwrap();
    assert!(ok);
    assert_eq!(path, root.path().join("Rust"));
    assert!(path.is_dir());
    assert_eq!(
        fs::read_to_string(path.join("Rust.JPEG")).unwrap(),
        "jpeg bytes"
    );
    assert_eq!(sink.drain(), vec![RepoEvent::DiscoverCategory("Rust".to_string())]);
    assert_eq!(repo.note_count("Rust"), Some(0));
    assert!(repo.category_image("Rust").is_some());
    assert!(repo.get_categories().contains(&"Rust".to_string()));
}

#[test]
fn create_category_without_image_skips_copy() {
    let root = tempfile::tempdir().unwrap();
    let (mut repo, _sink) = repository(root.path(), "title", true);
    let outcome = create(&mut repo, "Notes", None);
    repo.run_pending();
    assert_eq!(outcome.borrow_mut().take().map(|(ok, _)| ok), Some(true));
    assert!(repo.category_image("Notes").is_none());
}

#[test]
fn creating_same_category_twice_fails_and_keeps_first() {
    let root = tempfile::tempdir().unwrap();
    let assets = tempfile::tempdir().unwrap();
    let image = write_file(assets.path(), "cover.png", "png", 10);
    let (mut repo, _sink) = repository(root.path(), "title", true);

    let first = create(&mut repo, "Rust", Some(image.clone()));
    repo.run_pending();
    assert_eq!(first.borrow_mut().take().map(|(ok, _)| ok), Some(true));
    write_file(&root.path().join("Rust"), "ownership.md", "borrowck", 100);
    repo.discover_category("Rust");
    let image_before = repo.category_image("Rust").cloned();

    let second = create(&mut repo, "Rust", Some(image));
    repo.run_pending();
    assert_eq!(second.borrow_mut().take().map(|(ok, _)| ok), Some(false));
    assert_eq!(repo.note_count("Rust"), Some(1));
    assert_eq!(repo.category_image("Rust").cloned(), image_before);
}

#[test]
fn duplicate_check_is_case_insensitive_and_precedes_mkdir() {
    let root = python_storage();
    let (mut repo, _sink) = repository(root.path(), "title", true);

    assert!(!repo.category_name_unique("python"));
    repo.discover_categories();
    assert!(!repo.category_name_unique("PYTHON"));
    assert!(repo.category_name_unique("Rust"));

    let outcome = create(&mut repo, "pYtHoN", None);
    repo.run_pending();
    assert_eq!(outcome.borrow_mut().take().map(|(ok, _)| ok), Some(false));
    let names = fs::read_dir(root.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Python"]);
}

#[test]
fn padded_name_is_trimmed_before_duplicate_check() {
    let root = python_storage();
    let (mut repo, _sink) = repository(root.path(), "title", true);
    repo.discover_categories();
    assert!(!repo.category_name_unique("python "));

    let outcome = create(&mut repo, "Python ", None);
    repo.run_pending();
    assert_eq!(outcome.borrow_mut().take().map(|(ok, _)| ok), Some(false));
    assert_eq!(repo.cached_categories(), vec!["Python".to_string()]);
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);

    let created = create(&mut repo, "  Rust  ", None);
    repo.run_pending();
    assert_eq!(
        created.borrow_mut().take(),
        Some((true, root.path().join("Rust")))
    );
    assert_eq!(repo.note_count("Rust"), Some(0));
}

#[test]
fn missing_image_stops_chain_before_discovery() {
    let root = tempfile::tempdir().unwrap();
    let (mut repo, sink) = repository(root.path(), "title", true);
    let outcome = create(&mut repo, "Art", Some(root.path().join("nope.png")));

    assert_eq!(repo.run_pending(), 2);
    assert_eq!(outcome.borrow_mut().take().map(|(ok, _)| ok), Some(false));
    assert!(repo.note_count("Art").is_none());
    assert!(sink.is_empty());
}

#[test]
fn storage_change_before_first_tick_fails_chain() {
    let root = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let (mut repo, _sink) = repository(root.path(), "title", true);

    let outcome = create(&mut repo, "Rust", None);
    repo.set_storage_path(Some(other.path().to_path_buf()));
    repo.run_pending();

    assert_eq!(outcome.borrow_mut().take().map(|(ok, _)| ok), Some(false));
    assert!(!root.path().join("Rust").exists());
    assert!(!other.path().join("Rust").exists());
}

#[test]
fn unconfigured_create_settles_false() {
    let sink = notedeck_core::QueuedEventSink::new();
    let mut repo = notedeck_core::NoteRepository::new(sink);
    let outcome = create(&mut repo, "Rust", None);
    repo.run_pending();
    assert_eq!(
        outcome.borrow_mut().take(),
        Some((false, PathBuf::from("Rust")))
    );
}

#[test]
fn chains_run_in_submission_order_without_interleaving() {
    let root = tempfile::tempdir().unwrap();
    let (mut repo, sink) = repository(root.path(), "title", true);
    create(&mut repo, "First", None);
    create(&mut repo, "Second", None);
    assert_eq!(repo.pending_chains(), 2);

    for _ in 0..3 {
        assert!(repo.tick());
    }
    assert!(root.path().join("First").exists());
    assert!(!root.path().join("Second").exists());
    assert_eq!(sink.drain(), vec![RepoEvent::DiscoverCategory("First".to_string())]);

    repo.run_pending();
    assert_eq!(
        sink.drain(),
        vec![RepoEvent::DiscoverCategory("Second".to_string())]
    );
    assert!(!repo.tick());
}
