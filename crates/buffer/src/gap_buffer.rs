//! Gap buffer engine: the fundamental editable character sequence.
//!
//! A gap buffer is a flat character array with a movable "gap" of unused
//! cells. Before each edit the gap is relocated to the edit site, so runs of
//! localized edits are O(1) amortized while a random edit pays one O(n) gap
//! move. The logical text is the array with the gap removed: logical offset
//! `i` maps to physical `i` below the gap and `i + gap_len` above it.
//!
//! This engine knows nothing about marks; the mark-aware layers build on top
//! of it.

use crate::char_source::CharSource;
use crate::error::{TextError, TextResult};
use crate::types::{RangeSpec, TextRange};

/// Smallest gap kept available after any edit. An edit that would shrink the
/// gap below this triggers a growth reallocation.
pub const DEFAULT_MIN_GAP: usize = 8;

/// Capacity multiplier applied when the backing array must grow.
const GROWTH_FACTOR: usize = 2;

/// A gap buffer holding a logical sequence of `char`s.
///
/// The backing store looks like:
///
/// ```text
///  [ text-before-gap | gap (unused) | text-after-gap ]
///    0..gap_start      gap_start..gap_end   gap_end..capacity
/// ```
#[derive(Debug, Clone)]
pub struct GapBuffer {
    /// Backing store; its length is the buffer capacity.
    data: Vec<char>,
    /// First unused cell.
    gap_start: usize,
    /// One past the last unused cell.
    gap_end: usize,
    /// Smallest gap this buffer keeps available after an edit.
    min_gap: usize,
}

impl GapBuffer {
    /// Creates an empty buffer with the default minimum gap.
    pub fn new() -> Self {
        Self::with_min_gap(DEFAULT_MIN_GAP)
    }

    /// Creates an empty buffer that keeps at least `min_gap` unused cells.
    pub fn with_min_gap(min_gap: usize) -> Self {
        let capacity = min_gap * 2;
        Self {
            data: vec!['\0'; capacity],
            gap_start: 0,
            gap_end: capacity,
            min_gap,
        }
    }

    /// Creates a buffer pre-loaded with `text`, gap parked at the end so
    /// appending is cheap.
    pub fn from_str(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let capacity = len + DEFAULT_MIN_GAP * 2;

        let mut data = chars;
        data.resize(capacity, '\0');

        Self {
            data,
            gap_start: len,
            gap_end: capacity,
            min_gap: DEFAULT_MIN_GAP,
        }
    }

    /// Logical length of the buffer (excluding the gap).
    pub fn len(&self) -> usize {
        self.data.len() - self.gap_len()
    }

    /// True if the buffer holds no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the backing array.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current number of unused cells.
    pub fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Returns the character at logical position `index`.
    pub fn get(&self, index: usize) -> TextResult<char> {
        if index >= self.len() {
            return Err(TextError::InvalidRange {
                start: index,
                end: index + 1,
                len: self.len(),
            });
        }
        let physical = if index < self.gap_start {
            index
        } else {
            index + self.gap_len()
        };
        Ok(self.data[physical])
    }

    /// Copies logical `[src_begin, src_end)` into `dest` starting at
    /// `dest_begin`.
    pub fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
    ) -> TextResult<()> {
        TextError::check_range(src_begin, src_end, self.len())?;
        let needed = src_end - src_begin;
        if dest_begin > dest.len() || dest.len() - dest_begin < needed {
            return Err(TextError::InvalidDestination {
                dest_start: dest_begin,
                needed,
                dest_len: dest.len(),
            });
        }
        self.copy_logical(src_begin, src_end, dest, dest_begin);
        Ok(())
    }

    /// The single edit primitive: deletes `range` and inserts
    /// `[src_range.start, src_range.end)` of `src` in its place.
    ///
    /// An unspecified `range` resolves to the whole current content. The gap
    /// is grown or slid so that it sits at the edit site; afterwards the gap
    /// begins immediately after the inserted text.
    pub fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: RangeSpec,
        src: &S,
        src_range: TextRange,
    ) -> TextResult<()> {
        let len = self.len();
        let range = range.resolve(TextRange::new(0, len));
        TextError::check_range(range.start, range.end, len)?;
        TextError::check_range(src_range.start, src_range.end, src.source_len())?;

        let removed = range.len();
        let inserted = src_range.len();
        if removed == 0 && inserted == 0 {
            return Ok(());
        }

        if self.gap_len() + removed < inserted + self.min_gap {
            self.grow_for(range, inserted);
        } else {
            self.slide_gap_to(range);
            self.delete_at_gap(range);
        }

        src.copy_into(src_range, &mut self.data, self.gap_start);
        self.gap_start += inserted;
        Ok(())
    }

    /// Overwrites this buffer's contents with `other`'s, reusing the backing
    /// array when it is large enough. The gap ends up parked at the end.
    pub fn copy_from(&mut self, other: &GapBuffer) {
        let len = other.len();
        if self.data.len() < len + self.min_gap {
            self.data.clear();
            self.data.resize(len + self.min_gap * 2, '\0');
        }
        other.copy_logical(0, len, &mut self.data, 0);
        self.gap_start = len;
        self.gap_end = self.data.len();
    }

    /// Iterator over the logical content.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.data[..self.gap_start]
            .iter()
            .chain(self.data[self.gap_end..].iter())
            .copied()
    }

    /// The content of a logical range as a `String`; out-of-bounds endpoints
    /// are clamped.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let start = start.min(self.len());
        let end = end.min(self.len()).max(start);
        let mut out = vec!['\0'; end - start];
        self.copy_logical(start, end, &mut out, 0);
        out.into_iter().collect()
    }

    /// The entire content as a `String`.
    pub fn contents(&self) -> String {
        self.chars().collect()
    }

    /// Unvalidated three-case copy of logical `[src_begin, src_end)`:
    /// entirely below the gap, entirely above it, or straddling it.
    fn copy_logical(&self, src_begin: usize, src_end: usize, dest: &mut [char], dest_begin: usize) {
        let gap = self.gap_len();
        let count = src_end - src_begin;
        if src_end <= self.gap_start {
            dest[dest_begin..dest_begin + count].copy_from_slice(&self.data[src_begin..src_end]);
        } else if src_begin >= self.gap_start {
            dest[dest_begin..dest_begin + count]
                .copy_from_slice(&self.data[src_begin + gap..src_end + gap]);
        } else {
            let head = self.gap_start - src_begin;
            dest[dest_begin..dest_begin + head]
                .copy_from_slice(&self.data[src_begin..self.gap_start]);
            dest[dest_begin + head..dest_begin + count]
                .copy_from_slice(&self.data[self.gap_end..src_end + gap]);
        }
    }

    /// Moves the gap so it is adjacent to the edit range: right below
    /// `range.start` if it sits before the range, right above `range.end` if
    /// it sits past it. A gap already inside the range stays put; deletion
    /// swallows it.
    fn slide_gap_to(&mut self, range: TextRange) {
        if self.gap_start < range.start {
            // Slide right: text between gap and edit site moves down.
            let shift = range.start - self.gap_start;
            self.data
                .copy_within(self.gap_end..self.gap_end + shift, self.gap_start);
            self.gap_start += shift;
            self.gap_end += shift;
        } else if self.gap_start > range.end {
            // Slide left: text between edit site and gap moves up.
            let shift = self.gap_start - range.end;
            self.data
                .copy_within(range.end..self.gap_start, self.gap_end - shift);
            self.gap_start = range.end;
            self.gap_end -= shift;
        }
    }

    /// Expands the gap to swallow the deleted range. After `slide_gap_to`
    /// the gap borders the range (or lies inside it), so this is pure index
    /// arithmetic.
    fn delete_at_gap(&mut self, range: TextRange) {
        if self.gap_start == range.start {
            // Deleted text sits physically just above the gap.
            self.gap_end += range.len();
        } else if self.gap_start == range.end {
            // Deleted text sits physically just below the gap.
            self.gap_start -= range.len();
        } else {
            // Gap interior to the range: swallow both sides.
            self.gap_end += range.end - self.gap_start;
            self.gap_start = range.start;
        }
        debug_assert_eq!(self.gap_start, range.start);
    }

    /// Reallocates for an edit the current gap cannot absorb. Capacity at
    /// least doubles; the retained prefix lands at the head, the retained
    /// suffix at the tail, and the gap opens at the insertion point.
    fn grow_for(&mut self, range: TextRange, inserted: usize) {
        let len = self.len();
        let new_len = len - range.len() + inserted;
        let new_cap = (self.data.len() * GROWTH_FACTOR).max(new_len + 2 * self.min_gap);

        let mut data = vec!['\0'; new_cap];
        let suffix = len - range.end;
        self.copy_logical(0, range.start, &mut data, 0);
        self.copy_logical(range.end, len, &mut data, new_cap - suffix);

        self.data = data;
        self.gap_start = range.start;
        self.gap_end = new_cap - suffix;
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.chars() {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

impl CharSource for GapBuffer {
    fn source_len(&self) -> usize {
        self.len()
    }

    fn copy_into(&self, src: TextRange, dest: &mut [char], dest_start: usize) {
        self.copy_logical(src.start, src.end, dest, dest_start);
    }
}
