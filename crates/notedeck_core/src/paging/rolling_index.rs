//! Circular cursor over a fixed-size sequence.
//!
//! # Responsibility
//! - Advance/retreat with wrap-around for note paging.
//! - Offer side-effect free `peek` lookups for prefetching neighbours.
//!
//! # Invariants
//! - `current < size` whenever `size > 0`.
//! - `size == 0` pins `current` to `0`; `next`/`previous` are no-ops.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised by direct cursor placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingIndexError {
    /// Requested position is not inside `[0, size)`.
    OutOfRange { index: usize, size: usize },
}

impl Display for RollingIndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, size } => {
                write!(f, "index {index} is out of range for size {size}")
            }
        }
    }
}

impl Error for RollingIndexError {}

/// Circular cursor with wrap-around in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollingIndex {
    size: usize,
    current: usize,
}

impl RollingIndex {
    /// Creates a cursor at position `0`.
    pub fn new(size: usize) -> Self {
        Self { size, current: 0 }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Moves forward by one, wrapping from `size - 1` to `0`.
    ///
    /// With `peek == true` the result is computed but the cursor is left
    /// untouched.
    pub fn next(&mut self, peek: bool) -> usize {
        if self.size == 0 {
            return 0;
        }
        let target = (self.current + 1) % self.size;
        if !peek {
            self.current = target;
        }
        target
    }

    /// Moves backward by one, wrapping from `0` to `size - 1`.
    pub fn previous(&mut self, peek: bool) -> usize {
        if self.size == 0 {
            return 0;
        }
        let target = (self.current + self.size - 1) % self.size;
        if !peek {
            self.current = target;
        }
        target
    }

    /// Places the cursor at `index`.
    ///
    /// # Errors
    /// - `OutOfRange` when `index >= size` (including every `index` when empty).
    pub fn set(&mut self, index: usize) -> Result<(), RollingIndexError> {
        if index >= self.size {
            return Err(RollingIndexError::OutOfRange {
                index,
                size: self.size,
            });
        }
        self.current = index;
        Ok(())
    }

    /// Changes the sequence length, keeping `current` when still valid.
    ///
    /// A shrinking resize clamps `current` to the new last position.
    pub fn resize(&mut self, size: usize) {
        self.size = size;
        if size == 0 {
            self.current = 0;
        } else if self.current >= size {
            self.current = size - 1;
        }
    }
}
