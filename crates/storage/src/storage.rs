//! The snapshot-aware text storage facade.
//!
//! `SnapshotStorage` wraps one buffer type behind a version-record chain
//! tied to a [`SnapshotDomain`]. Reads resolve the record visible to the
//! ambient context and delegate to its buffer. Writes are strict
//! copy-on-write: the first write in a context forks a private buffer from
//! the visible state (through the pool), and all further writes in that
//! context mutate it in place. Commit and discard happen in the domain;
//! the chain observes them on the next access.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use vellum_buffer::{
    CharSource, MarkedGapBuffer, RangeSpec, ReplayingGapBuffer, TextOps, TextRange, TextResult,
    VersionBuffer,
};
use vellum_snapshot::SnapshotDomain;

use crate::pool::{BufferPool, SingleSlot};
use crate::record::RecordChain;

/// Snapshot-aware storage over any [`VersionBuffer`].
pub struct SnapshotStorage<B: VersionBuffer, P: BufferPool<B> = SingleSlot<B>> {
    domain: Rc<SnapshotDomain>,
    chain: RefCell<RecordChain<B>>,
    pool: Arc<P>,
}

/// The default storage: replaying buffers, so copy-on-write forks replay
/// recent edits instead of copying whole contents.
pub type TextStorage<M> = SnapshotStorage<ReplayingGapBuffer<M>>;

/// Storage over plain marked buffers: every fork is a full copy.
pub type BasicTextStorage<M> = SnapshotStorage<MarkedGapBuffer<M>>;

impl<B: VersionBuffer> SnapshotStorage<B> {
    /// An empty storage governed by `domain`, with a fresh single-slot pool.
    pub fn new(domain: Rc<SnapshotDomain>) -> Self {
        Self::with_pool(domain, Arc::new(SingleSlot::new()))
    }

    /// A storage pre-loaded with `text`.
    pub fn from_str(domain: Rc<SnapshotDomain>, text: &str) -> Self {
        let storage = Self::new(domain);
        {
            let mut chain = storage.chain.borrow_mut();
            let record = &mut chain.records[0];
            record.buffer = Some(B::from_str(text));
            record.private_copy = true;
        }
        storage
    }
}

impl<B: VersionBuffer, P: BufferPool<B>> SnapshotStorage<B, P> {
    /// A storage drawing fork buffers from a caller-supplied pool. Share
    /// one pool `Arc` across storages to recycle buffers between them.
    pub fn with_pool(domain: Rc<SnapshotDomain>, pool: Arc<P>) -> Self {
        Self {
            domain,
            chain: RefCell::new(RecordChain::new()),
            pool,
        }
    }

    /// The snapshot domain this storage participates in.
    pub fn domain(&self) -> &Rc<SnapshotDomain> {
        &self.domain
    }

    /// Resolves the readable record for the current context and runs `f`
    /// against its buffer, allocating an empty one lazily if the record has
    /// never been touched.
    fn with_readable<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        let mut chain = self.chain.borrow_mut();
        let pool = &self.pool;
        chain.reconcile(&self.domain, |buffer| pool.put(buffer));

        let idx = chain.readable_index(&self.domain, self.domain.current());
        let record = &mut chain.records[idx];
        if record.buffer.is_none() {
            record.private_copy = true;
        }
        f(record.buffer.get_or_insert_with(B::fresh))
    }

    /// Resolves a privately owned, in-place-mutable buffer for the current
    /// context and runs `f` against it, forking from the visible state
    /// first when needed. A failed fork propagates without leaving a new
    /// record behind.
    fn with_writable<R>(&self, f: impl FnOnce(&mut B) -> TextResult<R>) -> TextResult<R> {
        let mut chain = self.chain.borrow_mut();
        let pool = &self.pool;
        chain.reconcile(&self.domain, |buffer| pool.put(buffer));

        let current = self.domain.current();
        let idx = match chain.index_of(current) {
            Some(idx) => {
                if !chain.records[idx].private_copy {
                    // The record adopted a committed buffer earlier; fork it
                    // before mutating so the adopted state stays intact.
                    self.promote(&mut chain.records[idx])?;
                }
                idx
            }
            None => {
                let src_idx = chain.readable_index(&self.domain, current);
                let source = &mut chain.records[src_idx];
                if source.buffer.is_none() {
                    source.private_copy = true;
                }
                let forked = self.fork_from(source.buffer.get_or_insert_with(B::fresh))?;
                log::trace!(
                    "copy-on-write fork for {:?} from {:?}",
                    current,
                    chain.records[src_idx].version
                );
                chain.push_private(current, forked)
            }
        };
        f(chain.records[idx]
            .buffer
            .get_or_insert_with(B::fresh))
    }

    /// Builds a private buffer initialized from `source`, recycling a
    /// pooled buffer when one is available.
    fn fork_from(&self, source: &B) -> TextResult<B> {
        let mut buffer = match self.pool.take() {
            Some(buffer) => {
                log::trace!("fork reuses a pooled buffer");
                buffer
            }
            None => B::fresh(),
        };
        buffer.sync_from(source)?;
        Ok(buffer)
    }

    /// Re-forks a record's own buffer in place: the old buffer goes back to
    /// the pool, the record keeps a fresh private copy of the same state.
    fn promote(&self, record: &mut crate::record::VersionRecord<B>) -> TextResult<()> {
        match record.buffer.take() {
            None => {
                record.buffer = Some(B::fresh());
            }
            Some(old) => {
                let fresh = match self.fork_from(&old) {
                    Ok(fresh) => fresh,
                    Err(e) => {
                        // Restore the record before propagating.
                        record.buffer = Some(old);
                        return Err(e);
                    }
                };
                self.pool.put(old);
                record.buffer = Some(fresh);
            }
        }
        record.private_copy = true;
        Ok(())
    }

    // ==================== Read operations ====================

    /// Character count of the content visible to the current context.
    pub fn len(&self) -> usize {
        self.with_readable(|b| b.len())
    }

    /// True if the visible content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The character at `index`, relative to `source` if given.
    pub fn get(&self, index: usize, source: Option<&B::Mark>) -> TextResult<char> {
        self.with_readable(|b| b.get(index, source))
    }

    /// Copies `[src_begin, src_end)` of the visible content into `dest`
    /// starting at `dest_begin`.
    pub fn get_chars(
        &self,
        src_begin: usize,
        src_end: usize,
        dest: &mut [char],
        dest_begin: usize,
        source: Option<&B::Mark>,
    ) -> TextResult<()> {
        self.with_readable(|b| b.get_chars(src_begin, src_end, dest, dest_begin, source))
    }

    /// The visible content as a `String`.
    pub fn contents(&self) -> String {
        self.with_readable(|b| b.contents())
    }

    /// The current range of `mark`, relative to `source` if given.
    pub fn range_for_mark(
        &self,
        mark: &B::Mark,
        source: Option<&B::Mark>,
    ) -> TextResult<TextRange> {
        self.with_readable(|b| b.range_for_mark(mark, source))
    }

    /// Collects `filter` results for every mark intersecting the resolved
    /// query range.
    pub fn marks_intersecting<T, F>(
        &self,
        range: impl Into<RangeSpec>,
        source: Option<&B::Mark>,
        filter: F,
    ) -> TextResult<Vec<T>>
    where
        F: FnMut(&B::Mark, TextRange) -> Option<T>,
    {
        let range = range.into();
        self.with_readable(|b| b.marks_intersecting(range, source, filter))
    }

    // ==================== Write operations ====================

    /// Replaces `range` with `src_range` of `src`.
    pub fn replace<S: CharSource + ?Sized>(
        &mut self,
        range: impl Into<RangeSpec>,
        src: &S,
        src_range: TextRange,
        source: Option<&B::Mark>,
    ) -> TextResult<()> {
        let range = range.into();
        self.with_writable(|b| b.replace(range, src, src_range, source))
    }

    /// Replaces `range` with one character.
    pub fn replace_char(
        &mut self,
        range: impl Into<RangeSpec>,
        ch: char,
        source: Option<&B::Mark>,
    ) -> TextResult<()> {
        self.replace(range, &ch, TextRange::new(0, 1), source)
    }

    /// Replaces `range` with the characters of `text`.
    pub fn replace_str(
        &mut self,
        range: impl Into<RangeSpec>,
        text: &str,
        source: Option<&B::Mark>,
    ) -> TextResult<()> {
        let n = text.chars().count();
        self.replace(range, text, TextRange::new(0, n), source)
    }

    /// Registers `mark` over `range`.
    pub fn mark_range(
        &mut self,
        range: impl Into<RangeSpec>,
        mark: B::Mark,
        source: Option<&B::Mark>,
    ) -> TextResult<()> {
        let range = range.into();
        self.with_writable(|b| b.mark_range(range, mark, source))
    }

    /// Removes `mark`; silently succeeds if it was never registered.
    pub fn unmark(&mut self, mark: &B::Mark) -> TextResult<()> {
        self.with_writable(|b| b.unmark(mark))
    }
}

impl<B: VersionBuffer, P: BufferPool<B>> std::fmt::Display for SnapshotStorage<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TextStorage(\"{}\")", self.contents())
    }
}

impl<B: VersionBuffer, P: BufferPool<B>> std::fmt::Debug for SnapshotStorage<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStorage")
            .field("contents", &self.contents())
            .field("records", &self.chain.borrow().records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(text: &str) -> TextStorage<&'static str> {
        TextStorage::from_str(Rc::new(SnapshotDomain::new()), text)
    }

    #[test]
    fn test_reads_outside_any_snapshot() {
        let s = storage("foobar");
        assert_eq!(s.len(), 6);
        assert_eq!(s.get(3, None).unwrap(), 'b');
        assert_eq!(s.contents(), "foobar");
    }

    #[test]
    fn test_write_outside_any_snapshot() {
        let mut s = storage("foobar");
        s.replace_str((1, 5), "baz", None).unwrap();
        assert_eq!(s.contents(), "fbazr");
    }

    #[test]
    fn test_empty_storage_lazily_allocates() {
        let s: TextStorage<u32> = TextStorage::new(Rc::new(SnapshotDomain::new()));
        assert_eq!(s.len(), 0);
        assert_eq!(s.contents(), "");
    }

    #[test]
    fn test_marks_through_the_facade() {
        let mut s = storage("hello world");
        s.mark_range((6, 11), "word", None).unwrap();
        s.replace_str((0, 5), "goodbye", None).unwrap();
        assert_eq!(
            s.range_for_mark(&"word", None).unwrap(),
            TextRange::new(8, 13)
        );
        let hits = s
            .marks_intersecting(RangeSpec::Unspecified, None, |m, _| Some(*m))
            .unwrap();
        assert_eq!(hits, vec!["word"]);
        s.unmark(&"word").unwrap();
        assert!(s.range_for_mark(&"word", None).is_err());
    }

    #[test]
    fn test_display_renders_type_and_contents() {
        let s = storage("abc");
        assert_eq!(s.to_string(), "TextStorage(\"abc\")");
    }

    #[test]
    fn test_failed_write_leaves_state() {
        let mut s = storage("abc");
        assert!(s.replace_str((2, 9), "x", None).is_err());
        assert_eq!(s.contents(), "abc");
    }
}
