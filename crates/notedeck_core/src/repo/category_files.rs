//! Per-category file index.
//!
//! # Responsibility
//! - Classify a category directory into one optional image and ordered notes.
//! - Keep note indices aligned with the active sort strategy/direction.
//! - Lazily parse note documents, in parallel when several are missing.
//!
//! # Invariants
//! - `notes` is stored in index order and `notes[i].index == i`.
//! - A cached document's `idx` always equals its resource's index.
//! - At most one image survives classification.
//! - Parsed documents are written back only after every parse worker has
//!   joined, so no caller observes a partially populated category.

use crate::model::document::NoteDocument;
use crate::model::resource::{ImageResource, NoteResource, ResourceFile};
use crate::model::sort::{sort_by_strategy, SortStrategy};
use crate::repo::error::{RepoError, RepoResult};
use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

static PARSE_POOL: OnceCell<ThreadPool> = OnceCell::new();

/// Classified, ordered and cached files of one category.
#[derive(Debug, Clone)]
pub struct CategoryResourceFiles {
    category: String,
    image: Option<ImageResource>,
    notes: Vec<NoteResource>,
    sort_strategy: SortStrategy,
    ascending: bool,
}

impl CategoryResourceFiles {
    /// Sorts `files`, then splits them into notes and the category image.
    ///
    /// Notes receive contiguous indices in sorted order. With several images
    /// the one named like the category (case-insensitive) wins, otherwise the
    /// first in sort order is kept.
    pub fn from_files(
        category: impl Into<String>,
        mut files: Vec<ResourceFile>,
        sort_strategy: SortStrategy,
        ascending: bool,
    ) -> Self {
        let category = category.into();
        sort_by_strategy(&mut files, sort_strategy, ascending, ResourceFile::sort_key);

        let mut images = Vec::new();
        let mut notes = Vec::new();
        for file in files {
            match file {
                ResourceFile::Note(mut note) => {
                    note.index = notes.len();
                    notes.push(note);
                }
                ResourceFile::Image(image) => images.push(image),
            }
        }

        let image = select_image(&category, images);
        debug!(
            "event=category_indexed module=repo status=ok category={} notes={} image={} sort={} ascending={}",
            category,
            notes.len(),
            image.is_some(),
            sort_strategy.as_str(),
            ascending
        );

        Self {
            category,
            image,
            notes,
            sort_strategy,
            ascending,
        }
    }

    /// Stats every path and builds the index.
    ///
    /// # Errors
    /// - Any unreadable path aborts the build.
    pub fn from_paths(
        category: impl Into<String>,
        paths: Vec<PathBuf>,
        sort_strategy: SortStrategy,
        ascending: bool,
    ) -> RepoResult<Self> {
        let category = category.into();
        let files = paths
            .into_iter()
            .map(|path| {
                ResourceFile::from_path(&category, path.clone())
                    .map_err(|err| RepoError::io(path, err))
            })
            .collect::<RepoResult<Vec<_>>>()?;
        Ok(Self::from_files(category, files, sort_strategy, ascending))
    }

    /// Indexes the regular, non-hidden files directly inside `directory`.
    pub fn scan_directory(
        category: impl Into<String>,
        directory: &Path,
        sort_strategy: SortStrategy,
        ascending: bool,
    ) -> RepoResult<Self> {
        let entries = fs::read_dir(directory).map_err(|err| RepoError::io(directory, err))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| RepoError::io(directory, err))?;
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|err| RepoError::io(path.as_path(), err))?;
            if file_type.is_file() {
                paths.push(path);
            }
        }
        Self::from_paths(category, paths, sort_strategy, ascending)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn image(&self) -> Option<&ImageResource> {
        self.image.as_ref()
    }

    /// Notes in index order.
    pub fn notes(&self) -> &[NoteResource] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn sort_strategy(&self) -> SortStrategy {
        self.sort_strategy
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    /// Switches ordering and reindexes in place.
    pub fn set_sort(&mut self, sort_strategy: SortStrategy, ascending: bool) {
        self.sort_strategy = sort_strategy;
        self.ascending = ascending;
        self.reindex_notes();
    }

    /// Re-sorts by the current strategy/direction and reassigns indices.
    pub fn reindex_notes(&mut self) {
        sort_by_strategy(
            &mut self.notes,
            self.sort_strategy,
            self.ascending,
            NoteResource::sort_key,
        );
        for (position, note) in self.notes.iter_mut().enumerate() {
            note.index = position;
            if let Some(document) = note.document.as_mut() {
                document.idx = position;
            }
        }
    }

    /// Refreshes cached modification times for `paths`, or for every note.
    pub fn update_note_ages(&mut self, paths: Option<&[PathBuf]>) -> RepoResult<()> {
        for note in &mut self.notes {
            let selected = paths.map_or(true, |paths| paths.iter().any(|p| p == &note.path));
            if !selected {
                continue;
            }
            let metadata = fs::metadata(&note.path).map_err(|err| RepoError::io(&note.path, err))?;
            note.age = metadata
                .modified()
                .map_err(|err| RepoError::io(&note.path, err))?;
        }
        Ok(())
    }

    /// Parses every note lacking a document (or all, with `refresh`).
    ///
    /// Parsing runs on the shared worker pool and blocks until all workers
    /// join. Successful parses are kept even when another file fails.
    ///
    /// # Errors
    /// - Returns the first read failure after storing the successful parses.
    pub fn get_md_notes(&mut self, refresh: bool) -> RepoResult<Vec<&NoteDocument>> {
        let (documents, failures) = self.parse_md_notes(refresh)?;
        match failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(documents),
        }
    }

    /// Like [`Self::get_md_notes`], but returns the documents that parsed
    /// alongside one error per file that did not.
    ///
    /// # Errors
    /// - Only pool startup and index corruption fail the whole call.
    pub fn parse_md_notes(
        &mut self,
        refresh: bool,
    ) -> RepoResult<(Vec<&NoteDocument>, Vec<RepoError>)> {
        let targets = self
            .notes
            .iter()
            .filter(|note| refresh || note.document.is_none())
            .map(|note| (note.index, note.path.clone()))
            .collect::<Vec<_>>();

        let mut failures = Vec::new();
        if !targets.is_empty() {
            let pool = parse_pool()?;
            let category = self.category.as_str();
            let parsed = pool.install(|| {
                targets
                    .par_iter()
                    .map(|(index, path)| (*index, NoteDocument::parse_file(category, path, *index)))
                    .collect::<Vec<(usize, io::Result<NoteDocument>)>>()
            });
            debug!(
                "event=notes_parsed module=repo status=ok category={} parsed={} refresh={}",
                self.category,
                parsed.len(),
                refresh
            );

            for (index, result) in parsed {
                let Some(note) = self.notes.get_mut(index) else {
                    return Err(RepoError::LogicError("parsed note index out of bounds"));
                };
                match result {
                    Ok(document) => note.document = Some(document),
                    Err(err) => {
                        warn!(
                            "event=note_parse module=repo status=error path={} error={}",
                            note.path.display(),
                            err
                        );
                        note.document = None;
                        failures.push(RepoError::io(note.path.as_path(), err));
                    }
                }
            }
        }

        let documents = self
            .notes
            .iter()
            .filter_map(|note| note.document.as_ref())
            .collect();
        Ok((documents, failures))
    }

    /// Returns the parsed document at `idx`, parsing just that file if needed.
    pub fn document_at(&mut self, idx: usize) -> RepoResult<&NoteDocument> {
        let size = self.notes.len();
        let note = self
            .notes
            .get_mut(idx)
            .ok_or(RepoError::OutOfRange { index: idx, size })?;
        if note.document.is_none() {
            let document = NoteDocument::parse_file(&note.category, &note.path, idx)
                .map_err(|err| RepoError::io(note.path.as_path(), err))?;
            note.document = Some(document);
        }
        note.document
            .as_ref()
            .ok_or(RepoError::LogicError("document missing after parse"))
    }

    /// Drops every cached document.
    pub fn invalidate_documents(&mut self) {
        for note in &mut self.notes {
            note.invalidate();
        }
    }

    /// Registers a new note file and reindexes; returns its index.
    pub fn add_note_from_path(&mut self, path: impl Into<PathBuf>) -> RepoResult<usize> {
        let path = path.into();
        if self.notes.iter().any(|note| note.path == path) {
            return Err(RepoError::AlreadyExists(path.display().to_string()));
        }
        match ResourceFile::from_path(&self.category, path.clone())
            .map_err(|err| RepoError::io(path.as_path(), err))?
        {
            ResourceFile::Note(note) => self.notes.push(note),
            ResourceFile::Image(_) => {
                return Err(RepoError::InvalidInput(format!(
                    "`{}` is an image, not a note",
                    path.display()
                )))
            }
        }
        self.reindex_notes();
        Ok(self.get_note_by_path(&path)?.index)
    }

    /// Removes a note and reindexes the rest.
    pub fn remove_note_by_path(&mut self, path: &Path) -> RepoResult<NoteResource> {
        let position = self
            .notes
            .iter()
            .position(|note| note.path == path)
            .ok_or_else(|| RepoError::NotFound(path.display().to_string()))?;
        let removed = self.notes.remove(position);
        self.reindex_notes();
        Ok(removed)
    }

    pub fn get_note_by_idx(&self, idx: usize) -> RepoResult<&NoteResource> {
        self.notes
            .iter()
            .find(|note| note.index == idx)
            .ok_or_else(|| RepoError::NotFound(format!("note #{idx} in `{}`", self.category)))
    }

    pub fn get_note_by_path(&self, path: &Path) -> RepoResult<&NoteResource> {
        self.notes
            .iter()
            .find(|note| note.path == path)
            .ok_or_else(|| RepoError::NotFound(path.display().to_string()))
    }

    pub(crate) fn get_note_by_path_mut(&mut self, path: &Path) -> RepoResult<&mut NoteResource> {
        self.notes
            .iter_mut()
            .find(|note| note.path == path)
            .ok_or_else(|| RepoError::NotFound(path.display().to_string()))
    }
}

fn select_image(category: &str, mut images: Vec<ImageResource>) -> Option<ImageResource> {
    if images.len() <= 1 {
        return images.pop();
    }

    let wanted = category.to_lowercase();
    let named = images.iter().position(|image| {
        image
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase() == wanted)
            .unwrap_or(false)
    });
    match named {
        Some(position) => Some(images.swap_remove(position)),
        None => {
            warn!(
                "event=category_image module=repo status=warn category={} images={} picked={}",
                category,
                images.len(),
                images[0].path.display()
            );
            Some(images.swap_remove(0))
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn parse_pool() -> RepoResult<&'static ThreadPool> {
    PARSE_POOL
        .get_or_try_init(|| {
            let workers = std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1);
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|index| format!("notedeck-parse-{index}"))
                .build()
        })
        .map_err(|err| {
            error!("event=parse_pool_init module=repo status=error error={}", err);
            RepoError::LogicError("note parse worker pool failed to start")
        })
}
