//! Buffer reuse across version-record lifecycles.
//!
//! Records hand their buffers back when a snapshot commits or a record is
//! dropped, and ask for one when a copy-on-write fork happens. Recycling
//! matters beyond allocation cost: a recycled buffer is usually the one the
//! new fork's source was itself synced from, which is exactly the case the
//! replaying buffer can catch up via diff replay instead of a full copy.

use std::sync::Mutex;

/// Hands out buffers for new version records and takes returns.
pub trait BufferPool<B> {
    /// A recycled buffer, if one is available. Content is stale; the caller
    /// overwrites it before use.
    fn take(&self) -> Option<B>;

    /// Offers a buffer back for reuse. The pool may drop it.
    fn put(&self, buffer: B);
}

/// No reuse: every request allocates, every return is dropped.
#[derive(Debug, Default)]
pub struct Unpooled;

impl<B> BufferPool<B> for Unpooled {
    fn take(&self) -> Option<B> {
        None
    }

    fn put(&self, _buffer: B) {}
}

/// One cached buffer. The slot hands its instance to at most one taker
/// between returns; under lock contention both sides fall back (taker
/// allocates, returner drops) rather than blocking.
#[derive(Debug, Default)]
pub struct SingleSlot<B> {
    slot: Mutex<Option<B>>,
}

impl<B> SingleSlot<B> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<B> BufferPool<B> for SingleSlot<B> {
    fn take(&self) -> Option<B> {
        match self.slot.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        }
    }

    fn put(&self, buffer: B) {
        if let Ok(mut slot) = self.slot.try_lock() {
            if slot.is_none() {
                *slot = Some(buffer);
            }
        }
    }
}
