//! Error kinds reported by the storage core.
//!
//! Every operation validates its inputs before touching the buffer, so a
//! returned error always leaves the buffer in its pre-call state.

use thiserror::Error;

/// Result alias used throughout the buffer and storage crates.
pub type TextResult<T> = Result<T, TextError>;

/// Errors that can occur during buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TextError {
    /// A supplied range is inverted or falls outside `[0, length]`.
    #[error("range {start}..{end} is invalid for length {len}")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// A `get_chars` destination window does not fit the destination slice.
    #[error("destination window at {dest_start} for {needed} chars exceeds destination length {dest_len}")]
    InvalidDestination {
        dest_start: usize,
        needed: usize,
        dest_len: usize,
    },

    /// A mark lookup named a token that was never registered (or was
    /// already removed).
    #[error("mark is not registered")]
    UnknownMark,

    /// `mark_range` was called with a token that is already registered.
    #[error("mark is already registered")]
    DuplicateMark,

    /// A mark operation reached a buffer that maintains no mark table.
    #[error("this buffer does not maintain marks")]
    MarksUnsupported,
}

impl TextError {
    /// Helper for the common bounds check: `start <= end <= len`.
    pub(crate) fn check_range(start: usize, end: usize, len: usize) -> TextResult<()> {
        if start > end || end > len {
            Err(TextError::InvalidRange { start, end, len })
        } else {
            Ok(())
        }
    }
}
