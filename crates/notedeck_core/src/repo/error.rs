//! Error taxonomy for category storage and the note repository.

use crate::paging::rolling_index::RollingIndexError;
use crate::repo::events::QueryFailureKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level error for discovery, paging and mutations.
#[derive(Debug)]
pub enum RepoError {
    /// No storage root is configured.
    NotConfigured,
    /// Unknown category or missing resource.
    NotFound(String),
    /// OS-level IO failure on `path`.
    PermissionError { path: PathBuf, source: io::Error },
    /// Cursor placement outside the selected category.
    OutOfRange { index: usize, size: usize },
    /// Paging requested while no category is selected.
    NoIndex,
    /// A category with this name (case-insensitive) already exists.
    AlreadyExists(String),
    /// Caller-supplied name or title is unusable as a file name.
    InvalidInput(String),
    /// The storage root changed while a chain was in flight.
    StorageChanged,
    /// Internal invariant violation.
    LogicError(&'static str),
}

impl RepoError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path.display().to_string());
        }
        Self::PermissionError { path, source }
    }

    /// Failure class reported to the event sink.
    pub fn failure_kind(&self) -> QueryFailureKind {
        match self {
            Self::NotConfigured | Self::StorageChanged => QueryFailureKind::NotSet,
            Self::NotFound(_) | Self::OutOfRange { .. } | Self::NoIndex => {
                QueryFailureKind::NotFound
            }
            Self::PermissionError { .. }
            | Self::AlreadyExists(_)
            | Self::InvalidInput(_)
            | Self::LogicError(_) => QueryFailureKind::PermissionError,
        }
    }

    /// User-facing guidance for failure notifications.
    pub fn remediation(&self) -> String {
        match self {
            Self::NotConfigured => {
                "No notes folder is set. Choose a storage folder in the settings.".to_string()
            }
            Self::StorageChanged => {
                "The notes folder changed while saving. Please try again.".to_string()
            }
            Self::NotFound(what) => {
                format!("`{what}` could not be found. It may have been moved or deleted.")
            }
            Self::PermissionError { path, .. } => format!(
                "`{}` cannot be accessed. Check that the folder exists and is readable.",
                path.display()
            ),
            Self::OutOfRange { .. } | Self::NoIndex => {
                "Select a category before browsing notes.".to_string()
            }
            Self::AlreadyExists(name) => format!("A category named `{name}` already exists."),
            Self::InvalidInput(message) => message.clone(),
            Self::LogicError(details) => format!("Internal error: {details}"),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "storage path is not configured"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::PermissionError { path, source } => {
                write!(f, "io failure at `{}`: {source}", path.display())
            }
            Self::OutOfRange { index, size } => {
                write!(f, "note index {index} is out of range for {size} notes")
            }
            Self::NoIndex => write!(f, "no category selected"),
            Self::AlreadyExists(name) => write!(f, "category already exists: {name}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::StorageChanged => write!(f, "storage path changed during operation"),
            Self::LogicError(details) => write!(f, "logic error: {details}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PermissionError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RollingIndexError> for RepoError {
    fn from(value: RollingIndexError) -> Self {
        match value {
            RollingIndexError::OutOfRange { index, size } => Self::OutOfRange { index, size },
        }
    }
}
