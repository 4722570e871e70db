//! Replaying buffer: a marked gap buffer that remembers its recent edits.
//!
//! Copy-on-write forks dominate the cost of versioned text when every fork
//! clones the whole content. In practice a fork is followed by a short run
//! of localized edits, so this layer keeps a single compacted *diff window*
//! describing everything that changed since the buffer last synchronized
//! with another one. When a stale twin later needs to catch up (typically a
//! pooled buffer being re-issued for the next fork), it replays that window
//! instead of copying the full content.
//!
//! The window is a pair of ranges: `source_range` in the sync source's
//! coordinates and `result_range` in this buffer's coordinates, such that
//! replacing `source_range` with the characters of `result_range`
//! reproduces this buffer from the source. Edits strictly adjacent to the
//! window extend it; any other edit abandons tracking until the next sync.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::char_source::CharSource;
use crate::error::TextResult;
use crate::marks::MarkedGapBuffer;
use crate::ops::{MarkToken, TextOps, VersionBuffer};
use crate::types::{RangeSpec, TextRange};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one replaying buffer. Survives content resets
/// and pooling; used to recognize "the buffer I was last synced from".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The compacted summary of all edits since the last sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffWindow {
    /// Range in the sync source that the edits replaced.
    pub source_range: TextRange,
    /// Range in this buffer holding the replacement characters.
    pub result_range: TextRange,
}

/// Edit-tracking state. `Clean` means no edits since the last sync;
/// `Abandoned` means an edit could not be merged into the window and replay
/// is off the table until the next sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffState {
    Clean,
    Tracking(DiffWindow),
    Abandoned,
}

/// A marked gap buffer with diff-window tracking and replay-aware sync.
#[derive(Debug)]
pub struct ReplayingGapBuffer<M> {
    inner: MarkedGapBuffer<M>,
    id: BufferId,
    /// Bumped on every content change. Replay is only sound against a twin
    /// whose content has not moved since the window's edits were recorded,
    /// so the sync origin is remembered as (identity, generation).
    generation: u64,
    /// Identity and generation of the buffer this one last synchronized
    /// from.
    synced_from: Option<(BufferId, u64)>,
    diff: DiffState,
}

impl<M: MarkToken> ReplayingGapBuffer<M> {
    pub fn new() -> Self {
        Self {
            inner: MarkedGapBuffer::new(),
            id: BufferId::next(),
            generation: 0,
            synced_from: None,
            diff: DiffState::Clean,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            inner: MarkedGapBuffer::from_str(text),
            id: BufferId::next(),
            generation: 0,
            synced_from: None,
            diff: DiffState::Clean,
        }
    }

    /// This buffer's process-unique identity.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// The current diff window, if edits are being tracked.
    pub fn diff_window(&self) -> Option<DiffWindow> {
        match self.diff {
            DiffState::Tracking(w) => Some(w),
            _ => None,
        }
    }

    /// False once an edit could not be merged into the window.
    pub fn diff_valid(&self) -> bool {
        !matches!(self.diff, DiffState::Abandoned)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.inner.chars()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.inner.slice(start, end)
    }

    pub fn mark_count(&self) -> usize {
        self.inner.mark_count()
    }

    /// Replaces this buffer's contents and marks with `source`'s.
    ///
    /// Fast path: if `source` was last synchronized from this very buffer,
    /// this buffer has not changed since, and `source` still holds a valid
    /// diff window, only the window is replayed; this buffer already holds
    /// the pre-fork content the window applies to. Otherwise the content is
    /// copied wholesale. Either way this buffer ends up clean, recorded as
    /// synced from `source`.
    pub fn sync_from(&mut self, source: &ReplayingGapBuffer<M>) -> TextResult<()> {
        let replayable = source.synced_from == Some((self.id, self.generation));
        match (replayable, source.diff) {
            (true, DiffState::Tracking(w)) => {
                self.inner
                    .replace_absolute(w.source_range, &source.inner, w.result_range)?;
            }
            _ => {
                self.inner.copy_from(&source.inner);
            }
        }
        // Marks travel wholesale; replaying the window would move this
        // buffer's stale marks, not reproduce the source's.
        self.inner.set_marks(source.inner.marks().clone());
        self.generation += 1;
        self.synced_from = Some((source.id, source.generation));
        self.diff = DiffState::Clean;
        Ok(())
    }

    /// Folds one applied edit into the diff window.
    fn track(&mut self, range: TextRange, inserted: usize) {
        if range.is_empty() && inserted == 0 {
            return;
        }
        self.diff = match self.diff {
            DiffState::Abandoned => DiffState::Abandoned,
            DiffState::Clean => DiffState::Tracking(DiffWindow {
                source_range: range,
                result_range: TextRange::new(range.start, range.start + inserted),
            }),
            DiffState::Tracking(w) => {
                if range.start == w.result_range.end {
                    // Strict append: the edit begins exactly where the window
                    // ends. Deleted characters lie past the window, so they
                    // map straight back into source coordinates.
                    DiffState::Tracking(DiffWindow {
                        source_range: TextRange::new(
                            w.source_range.start,
                            range.end - w.result_range.len() + w.source_range.len(),
                        ),
                        result_range: TextRange::new(
                            w.result_range.start,
                            range.start + inserted,
                        ),
                    })
                } else if range.end == w.result_range.start {
                    // Strict prepend: the edit ends exactly where the window
                    // begins.
                    DiffState::Tracking(DiffWindow {
                        source_range: TextRange::new(range.start, w.source_range.end),
                        result_range: TextRange::new(
                            range.start,
                            w.result_range.end + inserted - range.len(),
                        ),
                    })
                } else {
                    // Disjoint from or overlapping the window: a single
                    // window cannot express it.
                    DiffState::Abandoned
                }
            }
        };
    }
}

impl<M: MarkToken> TextOps for ReplayingGapBuffer<M> {
    type Mark = M;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize, source: Option<&M>) -> TextResult<char> {
        self.inner.get(index, source)
    }

    fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
        source: Option<&M>,
    ) -> TextResult<()> {
        self.inner
            .get_chars(src_begin, src_end, dest, dest_begin, source)
    }

    fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: RangeSpec,
        src: &S,
        src_range: TextRange,
        source: Option<&M>,
    ) -> TextResult<()> {
        let resolved = self.inner.resolve_range(range, source)?;
        self.inner.replace_absolute(resolved, src, src_range)?;
        if !(resolved.is_empty() && src_range.is_empty()) {
            self.generation += 1;
        }
        self.track(resolved, src_range.len());
        Ok(())
    }

    fn mark_range(&mut self, range: RangeSpec, mark: M, source: Option<&M>) -> TextResult<()> {
        self.inner.mark_range(range, mark, source)
    }

    fn unmark(&mut self, mark: &M) -> TextResult<()> {
        self.inner.unmark(mark)
    }

    fn range_for_mark(&self, mark: &M, source: Option<&M>) -> TextResult<TextRange> {
        self.inner.range_for_mark(mark, source)
    }

    fn marks_intersecting<T, F>(
        &self,
        range: RangeSpec,
        source: Option<&M>,
        filter: F,
    ) -> TextResult<Vec<T>>
    where
        F: FnMut(&M, TextRange) -> Option<T>,
    {
        self.inner.marks_intersecting(range, source, filter)
    }

    fn contents(&self) -> String {
        self.inner.contents()
    }
}

impl<M: MarkToken> VersionBuffer for ReplayingGapBuffer<M> {
    fn fresh() -> Self {
        Self::new()
    }

    fn from_str(text: &str) -> Self {
        ReplayingGapBuffer::from_str(text)
    }

    fn sync_from(&mut self, source: &Self) -> TextResult<()> {
        ReplayingGapBuffer::sync_from(self, source)
    }
}

impl<M: MarkToken> Default for ReplayingGapBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MarkToken> std::fmt::Display for ReplayingGapBuffer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReplayingGapBuffer(\"{}\")", self.inner.text())
    }
}

impl<M: MarkToken> CharSource for ReplayingGapBuffer<M> {
    fn source_len(&self) -> usize {
        self.inner.len()
    }

    fn copy_into(&self, src: TextRange, dest: &mut [char], dest_start: usize) {
        self.inner.copy_into(src, dest, dest_start)
    }
}
