//! vellum-snapshot: a minimal MVCC snapshot domain.
//!
//! This crate knows nothing about text. It manages a tree of versions
//! ("snapshots"), an ambient current-context stack, and the visibility and
//! fate queries that let versioned objects keep per-version state records
//! and reconcile them lazily after commits and discards.
//!
//! # Model
//!
//! - The base version is always open; it represents the committed state
//!   outside any snapshot.
//! - [`SnapshotDomain::fork`] creates a child version of an open parent.
//! - Code runs "inside" a snapshot by entering it
//!   ([`SnapshotDomain::enter`]); the returned guard pops the context on
//!   drop.
//! - [`SnapshotDomain::commit`] folds a version into its parent;
//!   [`SnapshotDomain::discard`] kills it together with its open
//!   descendants. Both are O(1) tree updates: objects holding per-version
//!   records observe the outcome through [`SnapshotDomain::fate`] on their
//!   next access, so visibility still flips atomically at the commit call.
//!
//! The domain is single-threaded by construction (interior mutability via
//! `RefCell`), which matches the one-writer-per-context discipline of the
//! storage layer and serializes committers trivially.

mod domain;

pub use domain::{
    ContextGuard, Fate, SnapshotDomain, SnapshotError, SnapshotId, SnapshotStatus,
};
