//! vellum-storage: snapshot-aware text storage.
//!
//! Wraps the vellum-buffer types behind a version-record chain integrated
//! with a [`vellum_snapshot::SnapshotDomain`], so multiple snapshot contexts
//! can read consistent views of one text while a writer prepares an update
//! that lands atomically on commit or vanishes on discard.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vellum_snapshot::SnapshotDomain;
//! use vellum_storage::TextStorage;
//!
//! let domain = Rc::new(SnapshotDomain::new());
//! let mut text: TextStorage<&str> = TextStorage::from_str(Rc::clone(&domain), "foobar");
//!
//! let snap = domain.fork(domain.current()).unwrap();
//! {
//!     let _ctx = domain.enter(snap).unwrap();
//!     text.replace_str((1, 5), "baz", None).unwrap();
//!     assert_eq!(text.contents(), "fbazr"); // visible inside the snapshot
//! }
//! assert_eq!(text.contents(), "foobar"); // parent still sees the old text
//!
//! domain.commit(snap).unwrap();
//! assert_eq!(text.contents(), "fbazr"); // committed atomically
//! ```

mod pool;
mod record;
mod storage;

pub use pool::{BufferPool, SingleSlot, Unpooled};
pub use storage::{BasicTextStorage, SnapshotStorage, TextStorage};
