//! Note search entry points.
//!
//! # Responsibility
//! - Rank a category's parsed notes against a plain substring query.
//!
//! # See also
//! - `NoteRepository::query_notes`

pub mod substring;
