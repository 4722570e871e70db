//! vellum: mutable text storage with range marks and snapshot isolation.
//!
//! This facade crate re-exports the workspace members:
//!
//! - [`vellum_buffer`]: the gap-buffer engine, mark tracking, and the
//!   replaying-diff buffer.
//! - [`vellum_snapshot`]: the MVCC snapshot domain (version tree, contexts,
//!   commit/discard).
//! - [`vellum_storage`]: the snapshot-aware [`TextStorage`] facade tying
//!   the two together with version records and buffer pooling.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vellum::{SnapshotDomain, TextStorage};
//!
//! let domain = Rc::new(SnapshotDomain::new());
//! let mut text: TextStorage<&str> = TextStorage::from_str(Rc::clone(&domain), "foobar");
//!
//! text.mark_range((3, 6), "suffix", None).unwrap();
//!
//! let snap = domain.fork(domain.current()).unwrap();
//! {
//!     let _ctx = domain.enter(snap).unwrap();
//!     text.replace_str((1, 5), "baz", None).unwrap();
//!     assert_eq!(text.contents(), "fbazr");
//! }
//! assert_eq!(text.contents(), "foobar");
//! domain.commit(snap).unwrap();
//! assert_eq!(text.contents(), "fbazr");
//! ```

pub use vellum_buffer::{
    BufferId, CharSource, DiffWindow, EditShift, GapBuffer, MarkTable, MarkToken, MarkedGapBuffer,
    RangeSpec, ReplayingGapBuffer, TextError, TextOps, TextRange, TextResult, VersionBuffer,
    DEFAULT_MIN_GAP,
};
pub use vellum_snapshot::{
    ContextGuard, Fate, SnapshotDomain, SnapshotError, SnapshotId, SnapshotStatus,
};
pub use vellum_storage::{
    BasicTextStorage, BufferPool, SingleSlot, SnapshotStorage, TextStorage, Unpooled,
};
