#![allow(dead_code)]

use notedeck_core::{NoteRepository, QueuedEventSink, RepositoryConfig};
use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Writes `body` to `dir/name` and pins its mtime to `secs` after the epoch.
pub fn write_file(dir: &Path, name: &str, body: &str, secs: u64) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    set_mtime(&path, secs);
    path
}

pub fn set_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

/// Storage root with a `Python` category holding three notes and an image.
///
/// Modification times: loops=3000, decorators=1000, generators=2000.
pub fn python_storage() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let python = root.path().join("Python");
    write_file(&python, "loops.md", "# Loops\n\nfor and while loops", 3000);
    write_file(
        &python,
        "decorators.md",
        "# Decorators\n\nwrap functions with @decorator",
        1000,
    );
    write_file(&python, "generators.md", "# Generators\n\nyield values lazily", 2000);
    write_file(&python, "python.png", "not really a png", 500);
    root
}

pub fn repository(root: &Path, sort: &str, ascending: bool) -> (NoteRepository, QueuedEventSink) {
    let sink = QueuedEventSink::new();
    let config = RepositoryConfig {
        storage_path: Some(root.to_path_buf()),
        sort_strategy: sort.to_string(),
        sort_ascending: ascending,
        ..RepositoryConfig::default()
    };
    (NoteRepository::with_config(config, sink.clone()), sink)
}

/// Shared slot that completion continuations write into.
pub fn slot<T>() -> Rc<RefCell<Option<T>>> {
    Rc::new(RefCell::new(None))
}
