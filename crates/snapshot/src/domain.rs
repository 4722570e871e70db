//! The snapshot domain: version tree, context stack, fate queries.

use std::cell::RefCell;

use thiserror::Error;

/// Handle to one version in a domain's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotId(u32);

impl SnapshotId {
    /// The always-open base version: committed state outside any snapshot.
    pub const BASE: SnapshotId = SnapshotId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle state of one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Open,
    Committed,
    Discarded,
}

/// What became of a version, after folding committed versions into their
/// parents: either some still-open version now owns its state, or the state
/// is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Live(SnapshotId),
    Dead,
}

/// Errors reported by domain operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot id does not belong to this domain")]
    UnknownSnapshot,

    #[error("snapshot is not open")]
    NotOpen,

    #[error("snapshot still has open children")]
    OpenChildren,

    #[error("snapshot is currently entered")]
    ContextActive,

    #[error("the base version cannot be committed or discarded")]
    BaseImmutable,
}

#[derive(Debug)]
struct Node {
    parent: Option<SnapshotId>,
    status: SnapshotStatus,
}

#[derive(Debug, Default)]
struct DomainState {
    nodes: Vec<Node>,
    context: Vec<SnapshotId>,
}

/// A tree of snapshot versions with an ambient current context.
///
/// Single-threaded: share it through `Rc` between the storages it governs.
#[derive(Debug)]
pub struct SnapshotDomain {
    state: RefCell<DomainState>,
}

impl SnapshotDomain {
    pub fn new() -> Self {
        let state = DomainState {
            nodes: vec![Node {
                parent: None,
                status: SnapshotStatus::Open,
            }],
            context: Vec::new(),
        };
        Self {
            state: RefCell::new(state),
        }
    }

    /// The version the ambient context currently runs under: the most
    /// recently entered snapshot, or the base version.
    pub fn current(&self) -> SnapshotId {
        self.state
            .borrow()
            .context
            .last()
            .copied()
            .unwrap_or(SnapshotId::BASE)
    }

    /// Creates a new open version under `parent`.
    pub fn fork(&self, parent: SnapshotId) -> Result<SnapshotId, SnapshotError> {
        let mut state = self.state.borrow_mut();
        state.check_open(parent)?;
        let id = SnapshotId(state.nodes.len() as u32);
        state.nodes.push(Node {
            parent: Some(parent),
            status: SnapshotStatus::Open,
        });
        log::debug!("forked snapshot {:?} from {:?}", id, parent);
        Ok(id)
    }

    /// Pushes `id` onto the context stack; the guard pops it on drop.
    pub fn enter(&self, id: SnapshotId) -> Result<ContextGuard<'_>, SnapshotError> {
        let mut state = self.state.borrow_mut();
        state.check_open(id)?;
        state.context.push(id);
        Ok(ContextGuard { domain: self })
    }

    /// Folds `id` into its parent. The version must be open, off the
    /// context stack, and have no open children.
    pub fn commit(&self, id: SnapshotId) -> Result<(), SnapshotError> {
        let mut state = self.state.borrow_mut();
        state.check_closable(id)?;
        state.nodes[id.index()].status = SnapshotStatus::Committed;
        log::debug!("committed snapshot {:?}", id);
        Ok(())
    }

    /// Kills `id` and every open descendant. The version must be open and
    /// neither it nor any descendant may be on the context stack.
    pub fn discard(&self, id: SnapshotId) -> Result<(), SnapshotError> {
        let mut state = self.state.borrow_mut();
        state.check_open(id)?;
        if id == SnapshotId::BASE {
            return Err(SnapshotError::BaseImmutable);
        }
        // Collect the open subtree rooted at `id`.
        let mut doomed = vec![id];
        for i in 0..state.nodes.len() {
            let candidate = SnapshotId(i as u32);
            if state.nodes[i].status == SnapshotStatus::Open
                && state.is_strict_descendant(candidate, id)
            {
                doomed.push(candidate);
            }
        }
        if state.context.iter().any(|c| doomed.contains(c)) {
            return Err(SnapshotError::ContextActive);
        }
        for d in &doomed {
            state.nodes[d.index()].status = SnapshotStatus::Discarded;
        }
        log::debug!("discarded snapshot {:?} ({} versions)", id, doomed.len());
        Ok(())
    }

    /// Lifecycle state of `id`.
    pub fn status(&self, id: SnapshotId) -> Result<SnapshotStatus, SnapshotError> {
        let state = self.state.borrow();
        state
            .nodes
            .get(id.index())
            .map(|n| n.status)
            .ok_or(SnapshotError::UnknownSnapshot)
    }

    /// Parent of `id`, `None` for the base version.
    pub fn parent(&self, id: SnapshotId) -> Result<Option<SnapshotId>, SnapshotError> {
        let state = self.state.borrow();
        state
            .nodes
            .get(id.index())
            .map(|n| n.parent)
            .ok_or(SnapshotError::UnknownSnapshot)
    }

    /// Resolves where state recorded under `id` now belongs: committed
    /// versions fold into the nearest open ancestor, discarded versions are
    /// dead.
    pub fn fate(&self, id: SnapshotId) -> Fate {
        let state = self.state.borrow();
        let mut at = id;
        loop {
            let node = &state.nodes[at.index()];
            match node.status {
                SnapshotStatus::Open => return Fate::Live(at),
                SnapshotStatus::Discarded => return Fate::Dead,
                SnapshotStatus::Committed => {
                    at = node.parent.unwrap_or(SnapshotId::BASE);
                }
            }
        }
    }

    /// True if state recorded under version `v` is visible from context
    /// `ctx`: `v` is `ctx` itself or an ancestor of it. Callers resolve
    /// `v` through [`fate`](Self::fate) first, so `v` is expected live.
    pub fn visible_from(&self, v: SnapshotId, ctx: SnapshotId) -> bool {
        let state = self.state.borrow();
        let mut at = Some(ctx);
        while let Some(c) = at {
            if c == v {
                return true;
            }
            at = state.nodes[c.index()].parent;
        }
        false
    }
}

impl Default for SnapshotDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainState {
    fn check_open(&self, id: SnapshotId) -> Result<(), SnapshotError> {
        match self.nodes.get(id.index()) {
            None => Err(SnapshotError::UnknownSnapshot),
            Some(n) if n.status != SnapshotStatus::Open => Err(SnapshotError::NotOpen),
            Some(_) => Ok(()),
        }
    }

    fn check_closable(&self, id: SnapshotId) -> Result<(), SnapshotError> {
        self.check_open(id)?;
        if id == SnapshotId::BASE {
            return Err(SnapshotError::BaseImmutable);
        }
        if self.context.contains(&id) {
            return Err(SnapshotError::ContextActive);
        }
        let has_open_child = self
            .nodes
            .iter()
            .any(|n| n.parent == Some(id) && n.status == SnapshotStatus::Open);
        if has_open_child {
            return Err(SnapshotError::OpenChildren);
        }
        Ok(())
    }

    /// True if `candidate` sits strictly below `ancestor` in the tree.
    fn is_strict_descendant(&self, candidate: SnapshotId, ancestor: SnapshotId) -> bool {
        let mut at = self.nodes[candidate.index()].parent;
        while let Some(p) = at {
            if p == ancestor {
                return true;
            }
            at = self.nodes[p.index()].parent;
        }
        false
    }
}

/// RAII context entry; pops the context stack when dropped.
#[derive(Debug)]
pub struct ContextGuard<'a> {
    domain: &'a SnapshotDomain,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.domain.state.borrow_mut().context.pop();
    }
}
