//! The operation surface shared by every buffer layer.
//!
//! `TextOps` is the full read/write/mark contract a storage facade needs
//! from the buffer it wraps. The plain [`GapBuffer`] implements it with mark
//! operations rejected; the marked and replaying layers implement the whole
//! surface. `VersionBuffer` adds what a version-record chain needs on top:
//! allocating a fresh buffer and overwriting one buffer's state from
//! another when a copy-on-write fork happens.

use crate::char_source::CharSource;
use crate::error::{TextError, TextResult};
use crate::gap_buffer::GapBuffer;
use crate::types::{RangeSpec, TextRange};

/// Requirements on a caller-supplied mark token.
///
/// The registry treats token equality as identity and never hashes or
/// otherwise inspects token contents.
pub trait MarkToken: Clone + PartialEq {}

impl<T: Clone + PartialEq> MarkToken for T {}

/// Read, write, and mark operations over an editable character sequence.
///
/// Every operation takes an optional `source` mark; when given, all ranges
/// and indices are interpreted relative to that mark's current start, and an
/// unspecified range defaults to the mark's whole range instead of the whole
/// buffer.
pub trait TextOps {
    /// The opaque token type identifying marks on this buffer.
    type Mark: MarkToken;

    /// Logical character count.
    fn len(&self) -> usize;

    /// True if the buffer holds no characters.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The character at `index`.
    fn get(&self, index: usize, source: Option<&Self::Mark>) -> TextResult<char>;

    /// Copies `[src_begin, src_end)` into `dest` starting at `dest_begin`.
    fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
        source: Option<&Self::Mark>,
    ) -> TextResult<()>;

    /// Deletes `range` and inserts `src_range` of `src` in its place.
    fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: RangeSpec,
        src: &S,
        src_range: TextRange,
        source: Option<&Self::Mark>,
    ) -> TextResult<()>;

    /// Registers `mark` over `range`. Fails with [`TextError::DuplicateMark`]
    /// if the token is already present.
    fn mark_range(
        &mut self,
        range: RangeSpec,
        mark: Self::Mark,
        source: Option<&Self::Mark>,
    ) -> TextResult<()>;

    /// Removes `mark`; silently succeeds if it was never registered.
    fn unmark(&mut self, mark: &Self::Mark) -> TextResult<()>;

    /// The current range of `mark`, relative to `source` if given.
    fn range_for_mark(
        &self,
        mark: &Self::Mark,
        source: Option<&Self::Mark>,
    ) -> TextResult<TextRange>;

    /// Invokes `filter` for every mark whose range intersects the resolved
    /// query range, collecting the non-`None` results in enumeration order.
    fn marks_intersecting<T, F>(
        &self,
        range: RangeSpec,
        source: Option<&Self::Mark>,
        filter: F,
    ) -> TextResult<Vec<T>>
    where
        F: FnMut(&Self::Mark, TextRange) -> Option<T>;

    /// The whole content as a `String`.
    fn contents(&self) -> String;
}

/// What a version-record chain needs from its buffers beyond [`TextOps`]:
/// fresh allocation for lazily created records and state adoption for
/// copy-on-write forks.
pub trait VersionBuffer: TextOps {
    /// An empty buffer.
    fn fresh() -> Self;

    /// A buffer pre-loaded with `text`.
    fn from_str(text: &str) -> Self;

    /// Overwrites this buffer's content and marks with `source`'s.
    /// Implementations may exploit knowledge of how the two buffers have
    /// diverged to avoid a full copy.
    fn sync_from(&mut self, source: &Self) -> TextResult<()>;
}

/// The plain engine carries no mark table: operations that name a mark are
/// rejected, everything else delegates straight to the engine.
impl TextOps for GapBuffer {
    type Mark = ();

    fn len(&self) -> usize {
        GapBuffer::len(self)
    }

    fn get(&self, index: usize, source: Option<&()>) -> TextResult<char> {
        reject_mark(source)?;
        GapBuffer::get(self, index)
    }

    fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
        source: Option<&()>,
    ) -> TextResult<()> {
        reject_mark(source)?;
        GapBuffer::get_chars(self, src_begin, src_end, dest, dest_begin)
    }

    fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: RangeSpec,
        src: &S,
        src_range: TextRange,
        source: Option<&()>,
    ) -> TextResult<()> {
        reject_mark(source)?;
        GapBuffer::replace(self, range, src, src_range)
    }

    fn mark_range(&mut self, _range: RangeSpec, _mark: (), _source: Option<&()>) -> TextResult<()> {
        Err(TextError::MarksUnsupported)
    }

    fn unmark(&mut self, _mark: &()) -> TextResult<()> {
        Err(TextError::MarksUnsupported)
    }

    fn range_for_mark(&self, _mark: &(), _source: Option<&()>) -> TextResult<TextRange> {
        Err(TextError::MarksUnsupported)
    }

    fn marks_intersecting<T, F>(
        &self,
        _range: RangeSpec,
        _source: Option<&()>,
        _filter: F,
    ) -> TextResult<Vec<T>>
    where
        F: FnMut(&(), TextRange) -> Option<T>,
    {
        Err(TextError::MarksUnsupported)
    }

    fn contents(&self) -> String {
        GapBuffer::contents(self)
    }
}

fn reject_mark(source: Option<&()>) -> TextResult<()> {
    match source {
        None => Ok(()),
        Some(_) => Err(TextError::MarksUnsupported),
    }
}
