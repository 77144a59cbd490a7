//! File-backed note repository.
//!
//! # Responsibility
//! - Discover category directories under the storage root and cache their
//!   `CategoryResourceFiles`.
//! - Page through the selected category with a `RollingIndex`.
//! - Save, delete and create categories through continuation chains.
//! - Answer substring searches over a category's notes.
//!
//! # Invariants
//! - The cache is owned and mutated only by the repository's own thread.
//! - Changing the storage root drops every cached category, the selection
//!   and the cursor, and bumps the storage generation.
//! - Chain steps fail with `StorageChanged` when the storage generation
//!   moved after the chain was submitted.
//! - Discovery/search IO failures become sink notifications, never panics.
//! - Save/create/delete report through their completion, never by raising.

use crate::model::document::{EditableNote, NoteDocument, Suggestion};
use crate::model::resource::{FileStamp, ImageResource};
use crate::model::sort::{sort_by_strategy, SortKey, SortStrategy};
use crate::paging::rolling_index::RollingIndex;
use crate::repo::category_files::CategoryResourceFiles;
use crate::repo::config::RepositoryConfig;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::events::EventSink;
use crate::scheduler::{self, Chain, HostLoop, Scheduler};
use crate::search::substring::{rank, SearchCandidate};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension used for notes created by `save_note`.
pub const NOTE_EXTENSION: &str = "md";

static INVALID_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[/\\:*?"<>|\x00-\x1F]"#).expect("valid file name regex")
});

/// Orchestrates discovery, paging, CRUD and search over a storage root.
pub struct NoteRepository {
    config: RepositoryConfig,
    note_sort: SortStrategy,
    category_sort: SortStrategy,
    cache: HashMap<String, CategoryResourceFiles>,
    category_listing: Option<Vec<String>>,
    current_category: Option<String>,
    index: Option<RollingIndex>,
    storage_generation: u64,
    sink: Box<dyn EventSink>,
    scheduler: Scheduler<NoteRepository, RepoError>,
}

impl HostLoop for NoteRepository {
    type Error = RepoError;

    fn scheduler(&mut self) -> &mut Scheduler<Self, Self::Error> {
        &mut self.scheduler
    }
}

impl NoteRepository {
    /// Creates an unconfigured repository with default sorting.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self::with_config(RepositoryConfig::default(), sink)
    }

    pub fn with_config(config: RepositoryConfig, sink: impl EventSink + 'static) -> Self {
        let note_sort = config.note_sort();
        let category_sort = config.category_sort();
        Self {
            config,
            note_sort,
            category_sort,
            cache: HashMap::new(),
            category_listing: None,
            current_category: None,
            index: None,
            storage_generation: 0,
            sink: Box::new(sink),
            scheduler: Scheduler::new(),
        }
    }

    /// True iff a storage root is set.
    pub fn configured(&self) -> bool {
        self.config.storage_path.is_some()
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.config.storage_path.as_deref()
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Sets the storage root.
    ///
    /// An actual change invalidates the whole cache and clears the selected
    /// category and cursor; setting the same path again is a no-op.
    pub fn set_storage_path(&mut self, path: Option<PathBuf>) {
        if self.config.storage_path == path {
            return;
        }
        info!(
            "event=storage_path_changed module=repo status=ok configured={}",
            path.is_some()
        );
        self.config.storage_path = path;
        self.storage_generation += 1;
        self.invalidate_cache();
        self.current_category = None;
        self.index = None;
    }

    /// Drops every cached category and the cached category listing.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
        self.category_listing = None;
    }

    /// Changes note ordering and reindexes every cached category.
    pub fn set_sort_strategy(&mut self, strategy: SortStrategy, ascending: bool) {
        self.note_sort = strategy;
        self.config.sort_strategy = strategy.as_str().to_string();
        self.config.sort_ascending = ascending;
        for files in self.cache.values_mut() {
            files.set_sort(strategy, ascending);
        }
    }

    /// Changes category list ordering.
    pub fn set_category_sorting(&mut self, strategy: SortStrategy, ascending: bool) {
        self.category_sort = strategy;
        self.config.category_sorting = strategy.as_str().to_string();
        self.config.category_sorting_ascending = ascending;
        self.category_listing = None;
    }

    /// Lists category directory names in display order.
    ///
    /// Unset or unreadable storage reports a failure, resets the storage
    /// path and yields an empty list.
    pub fn get_categories(&mut self) -> Vec<String> {
        if let Some(listing) = &self.category_listing {
            return listing.clone();
        }
        let root = match self.require_root() {
            Ok(root) => root,
            Err(err) => {
                self.report_failure(&err);
                return Vec::new();
            }
        };

        let mut entries = match list_category_dirs(&root) {
            Ok(entries) => entries,
            Err(err) => {
                self.report_failure(&err);
                self.set_storage_path(None);
                return Vec::new();
            }
        };
        sort_by_strategy(
            &mut entries,
            self.category_sort,
            self.config.category_sorting_ascending,
            |(path, stamp): &(PathBuf, FileStamp)| SortKey {
                path,
                created: stamp.created,
                modified: stamp.modified,
            },
        );

        let names = entries
            .iter()
            .filter_map(|(path, _)| dir_name(path))
            .collect::<Vec<_>>();
        self.category_listing = Some(names.clone());
        names
    }

    /// (Re)builds one category's cache entry and notifies the sink.
    ///
    /// Returns `false` after reporting a failure.
    pub fn discover_category(&mut self, name: &str) -> bool {
        match self.rebuild_category(name) {
            Ok(()) => {
                self.sink.push_discover_category(name);
                true
            }
            Err(err) => {
                self.report_failure(&err);
                false
            }
        }
    }

    /// Discovers every category, notifying in filesystem order.
    ///
    /// Returns the number of categories discovered.
    pub fn discover_categories(&mut self) -> usize {
        let root = match self.require_root() {
            Ok(root) => root,
            Err(err) => {
                self.report_failure(&err);
                return 0;
            }
        };
        let entries = match list_category_dirs(&root) {
            Ok(entries) => entries,
            Err(err) => {
                self.report_failure(&err);
                self.set_storage_path(None);
                return 0;
            }
        };

        let mut discovered = 0;
        for name in entries.iter().filter_map(|(path, _)| dir_name(path)) {
            if self.discover_category(&name) {
                discovered += 1;
            }
        }
        info!(
            "event=categories_discovered module=repo status=ok count={}",
            discovered
        );
        discovered
    }

    pub fn current_category(&self) -> Option<&str> {
        self.current_category.as_deref()
    }

    /// Selects a cached category, or clears the selection with `None`.
    ///
    /// A selection gets a fresh cursor at `0` sized to the note count.
    ///
    /// # Errors
    /// - `NotFound` for a name missing from the cache; the selection is
    ///   cleared in that case.
    pub fn set_current_category(&mut self, name: Option<&str>) -> RepoResult<()> {
        let Some(name) = name else {
            self.current_category = None;
            self.index = None;
            return Ok(());
        };
        match self.cache.get(name) {
            Some(files) => {
                self.index = Some(RollingIndex::new(files.len()));
                self.current_category = Some(name.to_string());
                Ok(())
            }
            None => {
                self.current_category = None;
                self.index = None;
                Err(RepoError::NotFound(name.to_string()))
            }
        }
    }

    /// Note count of the selected category; `0` without a selection.
    pub fn index_size(&self) -> usize {
        self.index.map_or(0, |index| index.size())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index.map(|index| index.current())
    }

    /// Jumps to `idx` and returns that note.
    pub fn get_note(&mut self, idx: usize) -> RepoResult<NoteDocument> {
        self.cursor_mut()?.set(idx)?;
        self.resolve_current()
    }

    pub fn get_next_note(&mut self) -> RepoResult<NoteDocument> {
        self.cursor_mut()?.next(false);
        self.resolve_current()
    }

    pub fn get_previous_note(&mut self) -> RepoResult<NoteDocument> {
        self.cursor_mut()?.previous(false);
        self.resolve_current()
    }

    pub fn get_current_note(&mut self) -> RepoResult<NoteDocument> {
        self.resolve_current()
    }

    /// Index the next call to `get_next_note` would land on.
    pub fn peek_next_index(&mut self) -> RepoResult<usize> {
        Ok(self.cursor_mut()?.next(true))
    }

    pub fn peek_previous_index(&mut self) -> RepoResult<usize> {
        Ok(self.cursor_mut()?.previous(true))
    }

    /// Schedules a save of `note`.
    ///
    /// New notes are written to `{storage}/{category}/{title}.md`; edits
    /// overwrite the source file. `on_complete(success, document)` receives
    /// the freshly parsed document on success. When the saved note belongs
    /// to the selected category the cursor moves onto it.
    pub fn save_note<F>(&mut self, note: EditableNote, on_complete: F)
    where
        F: FnOnce(bool, Option<NoteDocument>) + 'static,
    {
        let target = match self.note_target(&note) {
            Ok(target) => target,
            Err(err) => {
                let chain = Chain::new("save_note")
                    .then(move |_: &mut NoteRepository| Err(err))
                    .on_settled(move |_: &mut NoteRepository, outcome: RepoResult<()>| {
                        if let Err(err) = outcome {
                            warn!("event=note_save module=repo status=error error={}", err);
                        }
                        on_complete(false, None);
                    });
                self.scheduler.submit(chain);
                return;
            }
        };

        let generation = self.storage_generation;
        let category = note.category.clone();
        let is_new = note.is_new();
        let write_target = target.clone();
        let index_target = target.clone();
        let index_category = category.clone();

        let chain = Chain::new("save_note")
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                let files = repo
                    .cache
                    .get(&note.category)
                    .ok_or_else(|| RepoError::NotFound(note.category.clone()))?;
                if is_new {
                    if write_target.exists() {
                        return Err(RepoError::AlreadyExists(write_target.display().to_string()));
                    }
                } else {
                    // Edits may only overwrite a note already indexed in this category.
                    files.get_note_by_path(&write_target)?;
                }
                fs::write(&write_target, note.edit_text.as_bytes())
                    .map_err(|err| RepoError::io(write_target.as_path(), err))
            })
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                let files = repo
                    .cache
                    .get_mut(&index_category)
                    .ok_or_else(|| RepoError::NotFound(index_category.clone()))?;
                let idx = if is_new {
                    files.add_note_from_path(index_target.clone())?
                } else {
                    files.get_note_by_path_mut(&index_target)?.invalidate();
                    files.update_note_ages(Some(std::slice::from_ref(&index_target)))?;
                    files.reindex_notes();
                    files.get_note_by_path(&index_target)?.index
                };
                let len = files.len();
                repo.sync_cursor(&index_category, len, Some(idx))
            })
            .on_settled(move |repo: &mut NoteRepository, outcome: RepoResult<()>| {
                match outcome.and_then(|()| repo.document_for_path(&category, &target)) {
                    Ok(document) => {
                        info!(
                            "event=note_save module=repo status=ok category={} idx={} new={}",
                            category, document.idx, is_new
                        );
                        on_complete(true, Some(document));
                    }
                    Err(err) => {
                        warn!(
                            "event=note_save module=repo status=error category={} error={}",
                            category, err
                        );
                        on_complete(false, None);
                    }
                }
            });
        self.scheduler.submit(chain);
    }

    /// Schedules deletion of note `idx` in the selected category.
    ///
    /// `on_complete(success, path)` receives the removed file path.
    pub fn delete_note<F>(&mut self, idx: usize, on_complete: F)
    where
        F: FnOnce(bool, PathBuf) + 'static,
    {
        let resolved = self.selected_files().and_then(|(category, files)| {
            let path = files.get_note_by_idx(idx)?.path.clone();
            Ok((category.to_string(), path))
        });
        let (category, path) = match resolved {
            Ok(found) => found,
            Err(err) => {
                let chain = Chain::new("delete_note")
                    .then(move |_: &mut NoteRepository| Err(err))
                    .on_settled(move |_: &mut NoteRepository, outcome: RepoResult<()>| {
                        if let Err(err) = outcome {
                            warn!("event=note_delete module=repo status=error error={}", err);
                        }
                        on_complete(false, PathBuf::new());
                    });
                self.scheduler.submit(chain);
                return;
            }
        };

        let generation = self.storage_generation;
        let remove_path = path.clone();
        let index_path = path.clone();
        let chain = Chain::new("delete_note")
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                fs::remove_file(&remove_path).map_err(|err| RepoError::io(remove_path.as_path(), err))
            })
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                let files = repo
                    .cache
                    .get_mut(&category)
                    .ok_or_else(|| RepoError::NotFound(category.clone()))?;
                files.remove_note_by_path(&index_path)?;
                let len = files.len();
                repo.sync_cursor(&category, len, None)
            })
            .on_settled(move |_: &mut NoteRepository, outcome: RepoResult<()>| {
                match &outcome {
                    Ok(()) => info!(
                        "event=note_delete module=repo status=ok path={}",
                        path.display()
                    ),
                    Err(err) => warn!(
                        "event=note_delete module=repo status=error path={} error={}",
                        path.display(),
                        err
                    ),
                }
                on_complete(outcome.is_ok(), path);
            });
        self.scheduler.submit(chain);
    }

    /// Schedules creation of category `name`, trimmed of surrounding whitespace.
    ///
    /// Steps: create the directory (rejecting duplicates before touching the
    /// disk), copy `image_path` in as `{name}.{ext}`, then index the new
    /// category and notify the sink. The first failing step settles the
    /// chain with `on_complete(false, path)`.
    pub fn create_category<F>(&mut self, name: &str, image_path: Option<PathBuf>, on_complete: F)
    where
        F: FnOnce(bool, PathBuf) + 'static,
    {
        let generation = self.storage_generation;
        let name = name.trim();
        let path = self
            .storage_path()
            .map_or_else(|| PathBuf::from(name), |root| root.join(name));

        let mkdir_name = name.to_string();
        let mkdir_path = path.clone();
        let image_name = name.to_string();
        let image_dir = path.clone();
        let discover_name = name.to_string();

        let chain = Chain::new("create_category")
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                repo.require_root()?;
                validate_file_name("category name", &mkdir_name)?;
                if !repo.category_name_unique(&mkdir_name) {
                    return Err(RepoError::AlreadyExists(mkdir_name));
                }
                fs::create_dir(&mkdir_path).map_err(|err| RepoError::io(mkdir_path.as_path(), err))
            })
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                let Some(source) = image_path else {
                    return Ok(());
                };
                let file_name = match source.extension() {
                    Some(ext) => format!("{image_name}.{}", ext.to_string_lossy()),
                    None => image_name,
                };
                fs::copy(&source, image_dir.join(file_name))
                    .map(|_| ())
                    .map_err(|err| RepoError::io(source.as_path(), err))
            })
            .then(move |repo: &mut NoteRepository| {
                repo.ensure_generation(generation)?;
                repo.category_listing = None;
                repo.rebuild_category(&discover_name)?;
                repo.sink.push_discover_category(&discover_name);
                Ok(())
            })
            .on_settled(move |_: &mut NoteRepository, outcome: RepoResult<()>| {
                match &outcome {
                    Ok(()) => info!(
                        "event=category_create module=repo status=ok path={}",
                        path.display()
                    ),
                    Err(err) => warn!(
                        "event=category_create module=repo status=error path={} error={}",
                        path.display(),
                        err
                    ),
                }
                on_complete(outcome.is_ok(), path);
            });
        self.scheduler.submit(chain);
    }

    /// Case-insensitive uniqueness check: cache first, then the disk.
    ///
    /// Surrounding whitespace is ignored, as it is when creating a category.
    pub fn category_name_unique(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        if self.cache.keys().any(|cached| cached.to_lowercase() == wanted) {
            return false;
        }
        let Some(root) = self.storage_path() else {
            return true;
        };
        match list_category_dirs(root) {
            Ok(entries) => !entries
                .iter()
                .filter_map(|(path, _)| dir_name(path))
                .any(|existing| existing.to_lowercase() == wanted),
            Err(err) => {
                warn!(
                    "event=category_unique_scan module=repo status=error error={}",
                    err
                );
                true
            }
        }
    }

    /// Searches one cached category; `None` when nothing matches.
    ///
    /// Notes that fail to parse are reported to the sink one by one and left
    /// out of the ranking; the remaining notes are still searched.
    pub fn query_notes(&mut self, category: &str, query: &str) -> Option<Vec<Suggestion>> {
        let parsed = match self.cache.get_mut(category) {
            Some(files) => files.parse_md_notes(false).map(|(documents, failures)| {
                let hits = rank(query, documents.into_iter().map(SearchCandidate::from));
                (hits, failures)
            }),
            None => Err(RepoError::NotFound(category.to_string())),
        };
        match parsed {
            Ok((hits, failures)) => {
                for err in &failures {
                    self.report_failure(err);
                }
                debug!(
                    "event=notes_query module=repo status=ok category={} hits={} skipped={}",
                    category,
                    hits.as_ref().map_or(0, Vec::len),
                    failures.len()
                );
                hits
            }
            Err(err) => {
                self.report_failure(&err);
                None
            }
        }
    }

    /// Parsed documents of a cached category, in index order.
    pub fn get_md_notes(&mut self, category: &str, refresh: bool) -> RepoResult<Vec<NoteDocument>> {
        let files = self
            .cache
            .get_mut(category)
            .ok_or_else(|| RepoError::NotFound(category.to_string()))?;
        Ok(files.get_md_notes(refresh)?.into_iter().cloned().collect())
    }

    pub fn category_image(&self, name: &str) -> Option<&ImageResource> {
        self.cache.get(name).and_then(CategoryResourceFiles::image)
    }

    pub fn note_count(&self, name: &str) -> Option<usize> {
        self.cache.get(name).map(CategoryResourceFiles::len)
    }

    pub fn category_files(&self, name: &str) -> Option<&CategoryResourceFiles> {
        self.cache.get(name)
    }

    /// Cached category names, alphabetically.
    pub fn cached_categories(&self) -> Vec<String> {
        let mut names = self.cache.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Runs one scheduled step; returns `false` when idle.
    pub fn tick(&mut self) -> bool {
        scheduler::tick(self)
    }

    /// Ticks until no chain is pending.
    pub fn run_pending(&mut self) -> usize {
        scheduler::run_until_idle(self)
    }

    pub fn pending_chains(&self) -> usize {
        self.scheduler.pending()
    }

    fn require_root(&self) -> RepoResult<PathBuf> {
        self.storage_path()
            .map(Path::to_path_buf)
            .ok_or(RepoError::NotConfigured)
    }

    fn ensure_generation(&self, generation: u64) -> RepoResult<()> {
        if self.storage_generation == generation {
            Ok(())
        } else {
            Err(RepoError::StorageChanged)
        }
    }

    fn rebuild_category(&mut self, name: &str) -> RepoResult<()> {
        let root = self.require_root()?;
        let files = CategoryResourceFiles::scan_directory(
            name,
            &root.join(name),
            self.note_sort,
            self.config.sort_ascending,
        )?;
        let len = files.len();
        self.cache.insert(name.to_string(), files);
        if self.current_category.as_deref() == Some(name) {
            self.index = Some(RollingIndex::new(len));
        }
        Ok(())
    }

    fn cursor_mut(&mut self) -> RepoResult<&mut RollingIndex> {
        if self.current_category.is_none() {
            return Err(RepoError::NoIndex);
        }
        self.index.as_mut().ok_or(RepoError::NoIndex)
    }

    fn selected_files(&self) -> RepoResult<(&str, &CategoryResourceFiles)> {
        let category = self.current_category.as_deref().ok_or(RepoError::NoIndex)?;
        let files = self
            .cache
            .get(category)
            .ok_or(RepoError::LogicError("selected category missing from cache"))?;
        Ok((category, files))
    }

    fn resolve_current(&mut self) -> RepoResult<NoteDocument> {
        let idx = self.cursor_mut()?.current();
        let category = self.current_category.clone().ok_or(RepoError::NoIndex)?;
        let files = self
            .cache
            .get_mut(&category)
            .ok_or(RepoError::LogicError("selected category missing from cache"))?;
        let idx = files.get_note_by_idx(idx)?.index;
        files.document_at(idx).cloned()
    }

    fn document_for_path(&mut self, category: &str, path: &Path) -> RepoResult<NoteDocument> {
        let files = self
            .cache
            .get_mut(category)
            .ok_or_else(|| RepoError::NotFound(category.to_string()))?;
        let idx = files.get_note_by_path(path)?.index;
        files.document_at(idx).cloned()
    }

    fn sync_cursor(&mut self, category: &str, len: usize, focus: Option<usize>) -> RepoResult<()> {
        if self.current_category.as_deref() != Some(category) {
            return Ok(());
        }
        let index = self.index.get_or_insert_with(RollingIndex::default);
        index.resize(len);
        if let Some(focus) = focus {
            index.set(focus)?;
        }
        Ok(())
    }

    fn note_target(&self, note: &EditableNote) -> RepoResult<PathBuf> {
        if let Some(source) = &note.source_note {
            return Ok(source.clone());
        }
        let root = self.require_root()?;
        validate_file_name("category name", &note.category)?;
        let title = validate_file_name("note title", &note.edit_title)?;
        Ok(root
            .join(&note.category)
            .join(format!("{title}.{NOTE_EXTENSION}")))
    }

    fn report_failure(&self, err: &RepoError) {
        warn!(
            "event=query_failure module=repo status=error kind={} error={}",
            err.failure_kind().as_str(),
            err
        );
        self.sink
            .push_query_failure(err.failure_kind(), &err.remediation());
    }
}

/// Subdirectories of `root` in filesystem enumeration order, hidden ones skipped.
fn list_category_dirs(root: &Path) -> RepoResult<Vec<(PathBuf, FileStamp)>> {
    let entries = fs::read_dir(root).map_err(|err| RepoError::io(root, err))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| RepoError::io(root, err))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|err| RepoError::io(path.as_path(), err))?;
        if !file_type.is_dir() || dir_name(&path).map_or(true, |name| name.starts_with('.')) {
            continue;
        }
        let stamp = FileStamp::read(&path).map_err(|err| RepoError::io(path.as_path(), err))?;
        dirs.push((path, stamp));
    }
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn validate_file_name(what: &str, value: &str) -> RepoResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidInput(format!("{what} must not be blank")));
    }
    if trimmed.starts_with('.') || INVALID_NAME_RE.is_match(trimmed) {
        return Err(RepoError::InvalidInput(format!(
            "{what} `{trimmed}` contains characters that cannot be used in file names"
        )));
    }
    Ok(trimmed.to_string())
}
