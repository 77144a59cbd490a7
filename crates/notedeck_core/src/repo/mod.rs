//! File-backed storage layer for categories and notes.
//!
//! # Responsibility
//! - Index category directories and their note/image files.
//! - Orchestrate discovery, paging, CRUD and search for the UI layer.
//!
//! # Invariants
//! - Every mutation leaves note indices contiguous in active sort order.
//! - IO failures surface as `RepoError` or sink notifications, never panics.

pub mod category_files;
pub mod config;
pub mod error;
pub mod events;
pub mod note_repo;
