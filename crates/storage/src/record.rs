//! Version records: per-snapshot buffer state for one storage.
//!
//! A storage owns a chain of records, each tagging a buffer with the
//! snapshot version that produced it. The chain is reconciled lazily
//! against the domain: committed versions fold into their parent (the
//! parent record adopts the committed buffer), discarded versions drop
//! their record and release the buffer for reuse. Resolution walks the
//! current context's ancestry, so a context always reads the nearest
//! version that is itself or an ancestor.

use vellum_snapshot::{Fate, SnapshotDomain, SnapshotId};

/// One entry in a storage's version chain.
#[derive(Debug)]
pub(crate) struct VersionRecord<B> {
    /// The snapshot version this record's buffer belongs to.
    pub(crate) version: SnapshotId,
    /// The buffer, allocated lazily on first access.
    pub(crate) buffer: Option<B>,
    /// True when the buffer is a private copy this version may mutate in
    /// place. Cleared when the record adopts a committed child's buffer;
    /// the next write forks again.
    pub(crate) private_copy: bool,
}

impl<B> VersionRecord<B> {
    fn new(version: SnapshotId) -> Self {
        Self {
            version,
            buffer: None,
            private_copy: false,
        }
    }
}

/// The version chain of one storage, newest records first. A record for the
/// base version always exists.
#[derive(Debug)]
pub(crate) struct RecordChain<B> {
    pub(crate) records: Vec<VersionRecord<B>>,
}

impl<B> RecordChain<B> {
    pub(crate) fn new() -> Self {
        Self {
            records: vec![VersionRecord::new(SnapshotId::BASE)],
        }
    }

    /// Folds the chain against the domain's current version tree.
    ///
    /// Committed records are retagged to their surviving ancestor; when that
    /// leaves two records for one version, the newer one (the later commit)
    /// wins and the older record's buffer is released. Records of discarded
    /// versions are dropped outright. `release` receives every buffer that
    /// leaves the chain.
    pub(crate) fn reconcile<F: FnMut(B)>(&mut self, domain: &SnapshotDomain, mut release: F) {
        let mut i = 0;
        while i < self.records.len() {
            let version = self.records[i].version;
            match domain.fate(version) {
                Fate::Dead => {
                    let record = self.records.remove(i);
                    if let Some(buffer) = record.buffer {
                        release(buffer);
                    }
                }
                Fate::Live(folded) => {
                    if folded != version {
                        // This record's snapshot was committed: its buffer
                        // now belongs to the surviving ancestor, no longer
                        // privately owned by a live writer.
                        log::trace!("record {:?} folds into {:?}", version, folded);
                        self.records[i].version = folded;
                        self.records[i].private_copy = false;
                    }
                    i += 1;
                }
            }
        }

        // Deduplicate: the newest record per version carries the adopted
        // state; older records for the same version give up their buffers.
        let mut kept: Vec<SnapshotId> = Vec::new();
        let mut i = 0;
        while i < self.records.len() {
            let version = self.records[i].version;
            if kept.contains(&version) {
                let record = self.records.remove(i);
                if let Some(buffer) = record.buffer {
                    release(buffer);
                }
            } else {
                kept.push(version);
                i += 1;
            }
        }
    }

    /// Index of the record the context `ctx` reads: the record of `ctx`
    /// itself if present, else the nearest ancestor's. The base record
    /// exists at all times, so resolution always succeeds.
    pub(crate) fn readable_index(&self, domain: &SnapshotDomain, ctx: SnapshotId) -> usize {
        let mut at = Some(ctx);
        while let Some(version) = at {
            if let Some(idx) = self.index_of(version) {
                return idx;
            }
            at = domain.parent(version).unwrap_or(None);
        }
        // Unreachable in practice; fall back to the base record.
        self.index_of(SnapshotId::BASE)
            .unwrap_or(self.records.len() - 1)
    }

    /// Index of the record tagged exactly `version`.
    pub(crate) fn index_of(&self, version: SnapshotId) -> Option<usize> {
        self.records.iter().position(|r| r.version == version)
    }

    /// Prepends a record for `version` holding `buffer` as a private copy
    /// and returns its index.
    pub(crate) fn push_private(&mut self, version: SnapshotId, buffer: B) -> usize {
        self.records.insert(
            0,
            VersionRecord {
                version,
                buffer: Some(buffer),
                private_copy: true,
            },
        );
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_has_base_record() {
        let chain: RecordChain<String> = RecordChain::new();
        assert_eq!(chain.records.len(), 1);
        assert_eq!(chain.records[0].version, SnapshotId::BASE);
        assert!(chain.records[0].buffer.is_none());
        assert!(!chain.records[0].private_copy);
    }

    #[test]
    fn test_commit_folds_record_into_base() {
        let domain = SnapshotDomain::new();
        let snap = domain.fork(SnapshotId::BASE).unwrap();
        let mut chain: RecordChain<String> = RecordChain::new();
        chain.records[0].buffer = Some("committed".into());
        chain.push_private(snap, "pending".into());

        domain.commit(snap).unwrap();
        let mut released = Vec::new();
        chain.reconcile(&domain, |b| released.push(b));

        assert_eq!(chain.records.len(), 1);
        assert_eq!(chain.records[0].version, SnapshotId::BASE);
        assert_eq!(chain.records[0].buffer.as_deref(), Some("pending"));
        assert!(!chain.records[0].private_copy);
        assert_eq!(released, vec!["committed".to_string()]);
    }

    #[test]
    fn test_discard_drops_record() {
        let domain = SnapshotDomain::new();
        let snap = domain.fork(SnapshotId::BASE).unwrap();
        let mut chain: RecordChain<String> = RecordChain::new();
        chain.records[0].buffer = Some("kept".into());
        chain.push_private(snap, "doomed".into());

        domain.discard(snap).unwrap();
        let mut released = Vec::new();
        chain.reconcile(&domain, |b| released.push(b));

        assert_eq!(chain.records.len(), 1);
        assert_eq!(chain.records[0].buffer.as_deref(), Some("kept"));
        assert_eq!(released, vec!["doomed".to_string()]);
    }

    #[test]
    fn test_resolution_walks_ancestry() {
        let domain = SnapshotDomain::new();
        let outer = domain.fork(SnapshotId::BASE).unwrap();
        let inner = domain.fork(outer).unwrap();
        let mut chain: RecordChain<String> = RecordChain::new();
        chain.push_private(outer, "outer".into());

        // Inner has no record: it reads its parent's.
        let idx = chain.readable_index(&domain, inner);
        assert_eq!(chain.records[idx].version, outer);

        // A sibling of `outer` reads base, not the sibling record.
        let sibling = domain.fork(SnapshotId::BASE).unwrap();
        let idx = chain.readable_index(&domain, sibling);
        assert_eq!(chain.records[idx].version, SnapshotId::BASE);
    }

    #[test]
    fn test_later_commit_wins_dedup() {
        let domain = SnapshotDomain::new();
        let first = domain.fork(SnapshotId::BASE).unwrap();
        let second = domain.fork(SnapshotId::BASE).unwrap();
        let mut chain: RecordChain<String> = RecordChain::new();
        chain.records[0].buffer = Some("base".into());
        chain.push_private(first, "first".into());
        chain.push_private(second, "second".into());

        domain.commit(first).unwrap();
        domain.commit(second).unwrap();
        let mut released = Vec::new();
        chain.reconcile(&domain, |b| released.push(b));

        assert_eq!(chain.records.len(), 1);
        // The newest record survives the fold.
        assert_eq!(chain.records[0].buffer.as_deref(), Some("second"));
        assert_eq!(released.len(), 2);
    }
}
