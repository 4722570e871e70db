//! Mark tracking: opaque caller tokens bound to live ranges.
//!
//! A mark is registered over a range and the table keeps that range current
//! as the text is edited. Tokens are compared with `==` and never inspected
//! beyond that; the table is an association list, which keeps enumeration
//! deterministic and suits the small mark counts typical of one buffer.
//!
//! Boundary convention is sticky-outside: an insertion exactly at a mark's
//! endpoint lands outside the mark. Text inserted at the start pushes the
//! mark right; text inserted at the end extends the suffix, not the mark.

use crate::char_source::CharSource;
use crate::error::{TextError, TextResult};
use crate::gap_buffer::GapBuffer;
use crate::ops::{MarkToken, TextOps, VersionBuffer};
use crate::types::{EditShift, RangeSpec, TextRange};

/// Association list from mark token to current absolute range.
#[derive(Debug, Clone)]
pub struct MarkTable<M> {
    entries: Vec<(M, TextRange)>,
}

impl<M: MarkToken> MarkTable<M> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers `mark` over `range`. Rejects a token that is already
    /// present.
    pub fn insert(&mut self, mark: M, range: TextRange) -> TextResult<()> {
        if self.get(&mark).is_some() {
            return Err(TextError::DuplicateMark);
        }
        self.entries.push((mark, range));
        Ok(())
    }

    /// Removes `mark`. Absent tokens are ignored.
    pub fn remove(&mut self, mark: &M) {
        self.entries.retain(|(m, _)| m != mark);
    }

    /// The current absolute range of `mark`.
    pub fn get(&self, mark: &M) -> Option<TextRange> {
        self.entries
            .iter()
            .find(|(m, _)| m == mark)
            .map(|(_, r)| *r)
    }

    /// Iterates all `(token, absolute range)` entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&M, TextRange)> {
        self.entries.iter().map(|(m, r)| (m, *r))
    }

    /// Drops every mark.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves every live range across one applied edit.
    ///
    /// For an edit deleting `[s, e)` and inserting `k` characters at `s`,
    /// a mark `[ms, me)` becomes:
    ///
    /// - `me <= s`: untouched (this also pins a point mark at the insertion
    ///   site: the new text lands after it).
    /// - `ms >= e`: both endpoints shift by `k - (e - s)`.
    /// - inside the edit (`s <= ms`, `me <= e`): collapses to the empty
    ///   range at `s`; the token stays registered.
    /// - overlapping the start only: truncated to `[ms, s)`; the mark does
    ///   not grow into the insertion.
    /// - overlapping the end only: `[s + k, me + delta)`.
    /// - containing the edit: the mark absorbs the net change.
    pub fn apply_shift(&mut self, shift: EditShift) {
        if shift.is_noop() {
            return;
        }
        let s = shift.start;
        let e = shift.removed_end();
        let k = shift.inserted;
        let delta = shift.delta();

        for (_, range) in self.entries.iter_mut() {
            let (ms, me) = (range.start, range.end);
            *range = if me <= s {
                *range
            } else if ms >= e {
                range.shifted(delta)
            } else if s <= ms && me <= e {
                TextRange::empty_at(s)
            } else if ms < s && me <= e {
                TextRange::new(ms, s)
            } else if ms >= s && me > e {
                TextRange::new(s + k, crate::types::offset(me, delta))
            } else {
                TextRange::new(ms, crate::types::offset(me, delta))
            };
        }
    }
}

impl<M: MarkToken> Default for MarkTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A gap buffer with a mark table: the full editable sequence of the storage
/// layer, minus diff tracking.
#[derive(Debug, Clone)]
pub struct MarkedGapBuffer<M> {
    text: GapBuffer,
    marks: MarkTable<M>,
}

impl<M: MarkToken> MarkedGapBuffer<M> {
    pub fn new() -> Self {
        Self {
            text: GapBuffer::new(),
            marks: MarkTable::new(),
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            text: GapBuffer::from_str(text),
            marks: MarkTable::new(),
        }
    }

    /// The underlying engine, for read-only use.
    pub fn text(&self) -> &GapBuffer {
        &self.text
    }

    /// Number of registered marks.
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text.slice(start, end)
    }

    /// Resolves an operation's base range: the whole buffer, or the current
    /// range of `source` when the operation is mark-relative.
    fn base(&self, source: Option<&M>) -> TextResult<TextRange> {
        match source {
            None => Ok(TextRange::new(0, self.text.len())),
            Some(mark) => self.marks.get(mark).ok_or(TextError::UnknownMark),
        }
    }

    /// Resolves and bounds-checks a caller range against the content.
    pub fn resolve_range(&self, range: RangeSpec, source: Option<&M>) -> TextResult<TextRange> {
        let resolved = range.resolve(self.base(source)?);
        TextError::check_range(resolved.start, resolved.end, self.text.len())?;
        Ok(resolved)
    }

    /// Overwrites content and marks wholesale from `source`.
    pub fn copy_from(&mut self, source: &MarkedGapBuffer<M>) {
        self.text.copy_from(&source.text);
        self.marks = source.marks.clone();
    }

    pub(crate) fn marks(&self) -> &MarkTable<M> {
        &self.marks
    }

    pub(crate) fn set_marks(&mut self, marks: MarkTable<M>) {
        self.marks = marks;
    }

    /// Replace with the resolved absolute range already in hand. Used by the
    /// replaying layer, which needs the absolute coordinates for diff
    /// tracking.
    pub(crate) fn replace_absolute<S: CharSource + ?Sized>(
        &mut self,
        range: TextRange,
        src: &S,
        src_range: TextRange,
    ) -> TextResult<()> {
        self.text.replace(RangeSpec::Range(range), src, src_range)?;
        self.marks.apply_shift(EditShift {
            start: range.start,
            removed: range.len(),
            inserted: src_range.len(),
        });
        Ok(())
    }

    /// True if `mark_range` intersects the query range: strict overlap for a
    /// non-empty query, closed point containment for an empty one.
    fn query_matches(mark_range: TextRange, query: TextRange) -> bool {
        if query.is_empty() {
            mark_range.contains_point(query.start)
        } else {
            mark_range.intersects(&query)
        }
    }
}

impl<M: MarkToken> TextOps for MarkedGapBuffer<M> {
    type Mark = M;

    fn len(&self) -> usize {
        self.text.len()
    }

    fn get(&self, index: usize, source: Option<&M>) -> TextResult<char> {
        let base = self.base(source)?;
        self.text.get(base.start + index)
    }

    fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
        source: Option<&M>,
    ) -> TextResult<()> {
        let base = self.base(source)?;
        self.text
            .get_chars(base.start + src_begin, base.start + src_end, dest, dest_begin)
    }

    fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: RangeSpec,
        src: &S,
        src_range: TextRange,
        source: Option<&M>,
    ) -> TextResult<()> {
        let resolved = self.resolve_range(range, source)?;
        self.replace_absolute(resolved, src, src_range)
    }

    fn mark_range(&mut self, range: RangeSpec, mark: M, source: Option<&M>) -> TextResult<()> {
        let resolved = self.resolve_range(range, source)?;
        self.marks.insert(mark, resolved)
    }

    fn unmark(&mut self, mark: &M) -> TextResult<()> {
        self.marks.remove(mark);
        Ok(())
    }

    fn range_for_mark(&self, mark: &M, source: Option<&M>) -> TextResult<TextRange> {
        let range = self.marks.get(mark).ok_or(TextError::UnknownMark)?;
        match source {
            None => Ok(range),
            Some(base_mark) => {
                let base = self.marks.get(base_mark).ok_or(TextError::UnknownMark)?;
                if range.start < base.start {
                    // A range cannot be expressed relative to a mark that
                    // begins past it.
                    return Err(TextError::InvalidRange {
                        start: range.start,
                        end: range.end,
                        len: self.text.len(),
                    });
                }
                Ok(range.rebased(base.start))
            }
        }
    }

    fn marks_intersecting<T, F>(
        &self,
        range: RangeSpec,
        source: Option<&M>,
        mut filter: F,
    ) -> TextResult<Vec<T>>
    where
        F: FnMut(&M, TextRange) -> Option<T>,
    {
        let query = self.resolve_range(range, source)?;
        let mut hits = Vec::new();
        for (mark, mark_range) in self.marks.entries() {
            if Self::query_matches(mark_range, query) {
                if let Some(value) = filter(mark, mark_range) {
                    hits.push(value);
                }
            }
        }
        Ok(hits)
    }

    fn contents(&self) -> String {
        self.text.contents()
    }
}

impl<M: MarkToken> VersionBuffer for MarkedGapBuffer<M> {
    fn fresh() -> Self {
        Self::new()
    }

    fn from_str(text: &str) -> Self {
        MarkedGapBuffer::from_str(text)
    }

    fn sync_from(&mut self, source: &Self) -> TextResult<()> {
        self.copy_from(source);
        Ok(())
    }
}

impl<M: MarkToken> Default for MarkedGapBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MarkToken> std::fmt::Display for MarkedGapBuffer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarkedGapBuffer(\"{}\")", self.text)
    }
}

impl<M: MarkToken> CharSource for MarkedGapBuffer<M> {
    fn source_len(&self) -> usize {
        self.text.len()
    }

    fn copy_into(&self, src: TextRange, dest: &mut [char], dest_start: usize) {
        self.text.copy_into(src, dest, dest_start)
    }
}
