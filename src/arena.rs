//! Node storage.
//!
//! Every stored term is one node. Nodes are addressed by [`NodeId`] handles into
//! parallel vectors, so restructuring in the update engine moves handles
//! between branch lists instead of moving owned subtrees around.
//!
//! Layout per node id:
//! - `terms[id]`: key and score
//! - `branches[id]`: branch points, sorted by descending child rank
//!
//! Freed slots keep an empty key and are recycled by the next allocation.

use crate::rank::Ranks;

/// Handle to a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge from an owning node to `node`, taken once a query has matched `lcp`
/// bytes of the owner's key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct BranchPoint {
    pub(crate) lcp: usize,
    pub(crate) node: NodeId,
}

impl BranchPoint {
    #[inline]
    pub(crate) fn new(lcp: usize, node: NodeId) -> Self {
        Self { lcp, node }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Term<S> {
    pub(crate) key: Box<str>,
    pub(crate) score: S,
}

#[derive(Clone, Debug)]
pub(crate) struct NodeArena<S> {
    terms: Vec<Term<S>>,
    branches: Vec<Vec<BranchPoint>>,
    free: Vec<NodeId>,
}

impl<S> NodeArena<S> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
            branches: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Allocate a node with an empty branch list.
    pub(crate) fn alloc(&mut self, key: &str, score: S) -> NodeId {
        let term = Term {
            key: key.into(),
            score,
        };
        if let Some(id) = self.free.pop() {
            self.terms[id.index()] = term;
            debug_assert!(self.branches[id.index()].is_empty());
            return id;
        }
        let Ok(raw) = u32::try_from(self.terms.len()) else {
            panic!("node arena exhausted: more than {} nodes", u32::MAX);
        };
        let id = NodeId(raw);
        self.terms.push(term);
        self.branches.push(Vec::new());
        id
    }

    /// Return a node's slot to the free list. The node must already be
    /// unlinked and have no branch points left.
    pub(crate) fn free(&mut self, id: NodeId) {
        debug_assert!(self.branches[id.index()].is_empty());
        self.terms[id.index()].key = Box::default();
        self.free.push(id);
    }

    pub(crate) fn clear(&mut self) {
        self.terms.clear();
        self.branches.clear();
        self.free.clear();
    }

    /// Number of allocated, non-freed nodes.
    pub(crate) fn live(&self) -> usize {
        self.terms.len() - self.free.len()
    }

    pub(crate) fn slots(&self) -> usize {
        self.terms.len()
    }

    /// Slots currently on the free list.
    pub(crate) fn freed(&self) -> &[NodeId] {
        &self.free
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> &str {
        &self.terms[id.index()].key
    }

    #[inline]
    pub(crate) fn score(&self, id: NodeId) -> &S {
        &self.terms[id.index()].score
    }

    #[inline]
    pub(crate) fn set_score(&mut self, id: NodeId, score: S) {
        self.terms[id.index()].score = score;
    }

    #[inline]
    pub(crate) fn branches(&self, id: NodeId) -> &[BranchPoint] {
        &self.branches[id.index()]
    }

    #[inline]
    pub(crate) fn branches_mut(&mut self, id: NodeId) -> &mut Vec<BranchPoint> {
        &mut self.branches[id.index()]
    }

    pub(crate) fn take_branches(&mut self, id: NodeId) -> Vec<BranchPoint> {
        std::mem::take(&mut self.branches[id.index()])
    }

    pub(crate) fn set_branches(&mut self, id: NodeId, list: Vec<BranchPoint>) {
        self.branches[id.index()] = list;
    }

    /// Rank view over all terms, without borrowing any branch list.
    #[inline]
    pub(crate) fn ranks(&self) -> Ranks<'_, S> {
        Ranks::new(&self.terms)
    }

    /// Borrow one node's branch list mutably together with the rank view
    /// needed to keep it sorted.
    #[inline]
    pub(crate) fn split_list(&mut self, id: NodeId) -> (Ranks<'_, S>, &mut Vec<BranchPoint>) {
        (Ranks::new(&self.terms), &mut self.branches[id.index()])
    }
}
