//! Core storage engine for NoteDeck.
//! Categories are directories, notes are files; this crate owns indexing,
//! paging, search and the sequencing of filesystem mutations.

pub mod logging;
pub mod model;
pub mod paging;
pub mod repo;
pub mod scheduler;
pub mod search;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{AstKind, AstNode, EditableNote, MarkdownAst, NoteDocument, Suggestion};
pub use model::resource::{FileStamp, ImageResource, NoteResource, ResourceFile};
pub use model::sort::SortStrategy;
pub use paging::rolling_index::{RollingIndex, RollingIndexError};
pub use repo::category_files::CategoryResourceFiles;
pub use repo::config::RepositoryConfig;
pub use repo::error::{RepoError, RepoResult};
pub use repo::events::{EventSink, NullEventSink, QueryFailureKind, QueuedEventSink, RepoEvent};
pub use repo::note_repo::NoteRepository;
pub use scheduler::{Chain, HostLoop, Scheduler};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
