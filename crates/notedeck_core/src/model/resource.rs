//! Classified category files.
//!
//! # Responsibility
//! - Classify a category's files into notes and images by extension.
//! - Cache filesystem timestamps used for ordering.
//!
//! # Invariants
//! - `.png`, `.jpg` and `.jpeg` (any case) are images; everything else is a note.
//! - Only notes carry an index and a parsed document.

use crate::model::document::NoteDocument;
use crate::model::sort::SortKey;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File extensions treated as category images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Returns whether `path` has an image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Creation and modification time of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub created: SystemTime,
    pub modified: SystemTime,
}

impl FileStamp {
    /// Reads timestamps from disk.
    ///
    /// Filesystems without birth time report the modification time instead.
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let created = metadata.created().unwrap_or(modified);
        Ok(Self { created, modified })
    }
}

/// One note file of a category.
#[derive(Debug, Clone)]
pub struct NoteResource {
    pub path: PathBuf,
    pub category: String,
    /// Cached modification time.
    pub age: SystemTime,
    pub created: SystemTime,
    /// Position in the category's active sort order.
    pub index: usize,
    /// Parsed content; `None` until parsed or after invalidation.
    pub document: Option<NoteDocument>,
}

impl NoteResource {
    pub fn title(&self) -> String {
        note_title(&self.path)
    }

    /// Drops the cached document so the next read re-parses the file.
    pub fn invalidate(&mut self) {
        self.document = None;
    }

    pub fn sort_key(&self) -> SortKey<'_> {
        SortKey {
            path: &self.path,
            created: self.created,
            modified: self.age,
        }
    }
}

/// The image file of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    pub path: PathBuf,
    pub category: String,
    pub age: SystemTime,
    pub created: SystemTime,
}

/// Classified file entry inside a category directory.
#[derive(Debug, Clone)]
pub enum ResourceFile {
    Note(NoteResource),
    Image(ImageResource),
}

impl ResourceFile {
    /// Stats `path` and classifies it by extension.
    ///
    /// Notes start at index `0`; callers assign real indices after sorting.
    pub fn from_path(category: &str, path: PathBuf) -> io::Result<Self> {
        let stamp = FileStamp::read(&path)?;
        Ok(Self::from_stamp(category, path, stamp))
    }

    pub fn from_stamp(category: &str, path: PathBuf, stamp: FileStamp) -> Self {
        if is_image_path(&path) {
            Self::Image(ImageResource {
                path,
                category: category.to_string(),
                age: stamp.modified,
                created: stamp.created,
            })
        } else {
            Self::Note(NoteResource {
                path,
                category: category.to_string(),
                age: stamp.modified,
                created: stamp.created,
                index: 0,
                document: None,
            })
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Note(note) => &note.path,
            Self::Image(image) => &image.path,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Self::Note(note) => &note.category,
            Self::Image(image) => &image.category,
        }
    }

    pub fn age(&self) -> SystemTime {
        match self {
            Self::Note(note) => note.age,
            Self::Image(image) => image.age,
        }
    }

    pub fn sort_key(&self) -> SortKey<'_> {
        match self {
            Self::Note(note) => note.sort_key(),
            Self::Image(image) => SortKey {
                path: &image.path,
                created: image.created,
                modified: image.age,
            },
        }
    }
}

/// Derives a note title from its file name (stem without extension).
pub fn note_title(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
