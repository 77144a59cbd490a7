//! Repository settings handed over by the host.
//!
//! # Responsibility
//! - Carry storage root and sort preferences in one serde-friendly shape.
//!
//! # Invariants
//! - Sort strategy strings are resolved through `SortStrategy::from_setting`,
//!   so unknown values degrade to `LastModifiedDate`.

use crate::model::sort::{SortStrategy, SORT_LAST_MODIFIED_DATE, SORT_TITLE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings that drive discovery and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Root directory holding one subdirectory per category.
    pub storage_path: Option<PathBuf>,
    /// Note ordering inside a category.
    pub sort_strategy: String,
    pub sort_ascending: bool,
    /// Ordering of the category list.
    pub category_sorting: String,
    pub category_sorting_ascending: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            sort_strategy: SORT_LAST_MODIFIED_DATE.to_string(),
            sort_ascending: false,
            category_sorting: SORT_TITLE.to_string(),
            category_sorting_ascending: true,
        }
    }
}

impl RepositoryConfig {
    pub fn note_sort(&self) -> SortStrategy {
        SortStrategy::from_setting(&self.sort_strategy)
    }

    pub fn category_sort(&self) -> SortStrategy {
        SortStrategy::from_setting(&self.category_sorting)
    }
}
