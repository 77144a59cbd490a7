//! Sort strategies for category directories and note files.
//!
//! # Responsibility
//! - Map settings strings to `SortStrategy` values.
//! - Order files and directories by title, creation or modification time.
//!
//! # Invariants
//! - Unknown settings strings resolve to `LastModifiedDate` with a warning.
//! - Ordering is total: equal keys fall back to the path, so flipping the
//!   direction reverses the order exactly.

use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;

/// Setting value for [`SortStrategy::CreationDate`].
pub const SORT_CREATION_DATE: &str = "creation_date";
/// Setting value for [`SortStrategy::Title`].
pub const SORT_TITLE: &str = "title";
/// Setting value for [`SortStrategy::LastModifiedDate`].
pub const SORT_LAST_MODIFIED_DATE: &str = "last_modified_date";

/// Ordering key applied to a category's files or to the category list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    CreationDate,
    Title,
    #[default]
    LastModifiedDate,
}

impl SortStrategy {
    /// Stable string id used in settings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreationDate => SORT_CREATION_DATE,
            Self::Title => SORT_TITLE,
            Self::LastModifiedDate => SORT_LAST_MODIFIED_DATE,
        }
    }

    /// Parses a settings string, falling back to `LastModifiedDate`.
    ///
    /// Accepts any case and tolerates `-` or spaces in place of `_`, so
    /// `"Last Modified Date"` and `"creation-date"` both resolve. Anything
    /// else logs a warning and yields `LastModifiedDate`.
    pub fn from_setting(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            SORT_CREATION_DATE => Self::CreationDate,
            SORT_TITLE => Self::Title,
            SORT_LAST_MODIFIED_DATE => Self::LastModifiedDate,
            _ => {
                warn!(
                    "event=sort_strategy_fallback module=model status=warn value={:?} fallback={}",
                    value, SORT_LAST_MODIFIED_DATE
                );
                Self::LastModifiedDate
            }
        }
    }
}

/// Sort-relevant facts about one filesystem entry.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    pub path: &'a Path,
    pub created: SystemTime,
    pub modified: SystemTime,
}

/// Total order for `strategy`; ties break on the full path.
///
/// The order is total so that flipping the direction reverses it exactly.
pub fn compare(strategy: SortStrategy, left: &SortKey<'_>, right: &SortKey<'_>) -> Ordering {
    let primary = match strategy {
        SortStrategy::CreationDate => left.created.cmp(&right.created),
        SortStrategy::LastModifiedDate => left.modified.cmp(&right.modified),
        SortStrategy::Title => title_key(left.path).cmp(&title_key(right.path)),
    };
    primary.then_with(|| left.path.cmp(right.path))
}

/// Sorts `items` by `strategy`, descending when `ascending` is false.
pub fn sort_by_strategy<T, F>(items: &mut [T], strategy: SortStrategy, ascending: bool, key: F)
where
    F: Fn(&T) -> SortKey<'_>,
{
    items.sort_by(|left, right| {
        let ordering = compare(strategy, &key(left), &key(right));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn title_key(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
