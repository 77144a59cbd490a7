//! Event sink contract consumed by the repository.
//!
//! The UI layer implements [`EventSink`]; the repository only pushes.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Failure classes surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFailureKind {
    NotSet,
    NotFound,
    PermissionError,
}

impl QueryFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::NotFound => "not_found",
            Self::PermissionError => "permission_error",
        }
    }
}

/// Receiver for discovery and failure notifications.
pub trait EventSink {
    /// Called once per discovered category, in filesystem order.
    fn push_discover_category(&self, name: &str);
    /// Called when discovery or search fails.
    fn push_query_failure(&self, kind: QueryFailureKind, message: &str);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn push_discover_category(&self, _name: &str) {}

    fn push_query_failure(&self, _kind: QueryFailureKind, _message: &str) {}
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoEvent {
    DiscoverCategory(String),
    QueryFailure {
        kind: QueryFailureKind,
        message: String,
    },
}

/// Sink that queues events for a host loop to drain.
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct QueuedEventSink {
    events: Rc<RefCell<Vec<RepoEvent>>>,
}

impl QueuedEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all queued events in push order.
    pub fn drain(&self) -> Vec<RepoEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for QueuedEventSink {
    fn push_discover_category(&self, name: &str) {
        self.events
            .borrow_mut()
            .push(RepoEvent::DiscoverCategory(name.to_string()));
    }

    fn push_query_failure(&self, kind: QueryFailureKind, message: &str) {
        self.events.borrow_mut().push(RepoEvent::QueryFailure {
            kind,
            message: message.to_string(),
        });
    }
}
