//! Domain model for file-backed categories and notes.
//!
//! # Responsibility
//! - Define classified resource entries, parsed documents and edit buffers.
//! - Define sort strategies shared by notes and categories.
//!
//! # Invariants
//! - A note is identified by its file path; a category by its directory name.
//! - Image vs. note classification is decided by file extension only.

pub mod document;
pub mod resource;
pub mod sort;
