//! vellum-buffer: gap-buffer text storage with range marks.
//!
//! This crate provides the editable-sequence core of vellum:
//!
//! - [`GapBuffer`]: a flat character array with a movable gap, giving O(1)
//!   amortized localized edits and O(n) random edits.
//! - [`MarkedGapBuffer`]: a gap buffer plus a registry of caller-supplied
//!   opaque mark tokens whose ranges stay current across edits.
//! - [`ReplayingGapBuffer`]: a marked buffer that additionally tracks a
//!   compacted diff window so a stale copy can catch up by replaying the
//!   recent edits instead of copying the whole content.
//!
//! # Example
//!
//! ```
//! use vellum_buffer::{MarkedGapBuffer, RangeSpec, TextOps, TextRange};
//!
//! let mut buf: MarkedGapBuffer<&str> = MarkedGapBuffer::from_str("hello world");
//! buf.mark_range(RangeSpec::from((6, 11)), "word", None).unwrap();
//!
//! // Edit before the mark; its range follows the shift.
//! buf.replace(RangeSpec::from((0, 5)), &"goodbye", TextRange::new(0, 7), None)
//!     .unwrap();
//! assert_eq!(buf.contents(), "goodbye world");
//! assert_eq!(buf.range_for_mark(&"word", None).unwrap(), TextRange::new(8, 13));
//!
//! // Replace the mark's whole span through the mark itself: it collapses
//! // to a point at the edit site.
//! buf.replace(RangeSpec::Unspecified, &"there", TextRange::new(0, 5), Some(&"word"))
//!     .unwrap();
//! assert_eq!(buf.contents(), "goodbye there");
//! assert_eq!(buf.range_for_mark(&"word", None).unwrap(), TextRange::new(8, 8));
//! ```
//!
//! All operations validate their inputs up front and leave the buffer
//! untouched on error. Replacement text arrives through the [`CharSource`]
//! capability, so any representation that can bulk-copy characters into an
//! array can feed an edit.

mod char_source;
mod error;
mod gap_buffer;
mod marks;
mod ops;
mod replay;
mod types;

pub use char_source::CharSource;
pub use error::{TextError, TextResult};
pub use gap_buffer::{GapBuffer, DEFAULT_MIN_GAP};
pub use marks::{MarkTable, MarkedGapBuffer};
pub use ops::{MarkToken, TextOps, VersionBuffer};
pub use replay::{BufferId, DiffWindow, ReplayingGapBuffer};
pub use types::{EditShift, RangeSpec, TextRange};
