//! Pagination primitives over per-category note sequences.
//!
//! # Responsibility
//! - Track "where am I" inside the selected category's notes.
//!
//! # Invariants
//! - A cursor never points outside `[0, size)` while `size > 0`.

pub mod rolling_index;
