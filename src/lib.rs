//! # scored-trie
//!
//! A dynamic score-decomposed trie: top-k completion of a prefix, ranked by a
//! caller-supplied score, with online insertion and score updates.
//!
//! Every stored term is one node. A node's branch points partition the terms
//! below it by the offset at which they diverge from its key, and each list is
//! kept sorted by descending rank. The best completion of any prefix is found
//! by a single descent, and the next `k - 1` by a best-first merge that never
//! looks past the first unconsumed entry of a list.
//!
//! Based on "Heap-like Dynamic Score-Decomposed Tries for Top-k Autocomplete"
//! (Validark).
//!
//! ## Example
//!
//! ```rust
//! use scored_trie::ScoredTrie;
//!
//! let mut trie: ScoredTrie<u32> = ScoredTrie::new();
//! trie.set("cat", 5).unwrap();
//! trie.set("car", 3).unwrap();
//! trie.set("cart", 9).unwrap();
//! trie.set("dog", 1).unwrap();
//!
//! assert_eq!(trie.top_completions("ca", 3), vec!["cart", "cat", "car"]);
//!
//! trie.set("car", 10).unwrap();
//! assert_eq!(trie.top_completions("ca", 1), vec!["car"]);
//! ```
//!
//! ## Ordering
//!
//! Higher scores rank first. Equal scores are ordered by key, bytewise
//! ascending, so results never depend on insertion order.
//!
//! ## Concurrency
//!
//! `ScoredTrie` has no internal synchronization. An update may restructure an
//! unbounded number of branch lists, so concurrent readers need an exclusive
//! lock around `set` (for example `RwLock<ScoredTrie<_>>`) or a snapshot.

mod arena;
mod config;
mod error;
mod query;
mod rank;
mod update;

pub use config::TrieConfig;
pub use error::{Error, Result};
pub use query::Completions;

use arena::{BranchPoint, NodeArena, NodeId};
use rank::extend_lcp;

/// Which branch list holds a slot: the synthetic root slot, or a node's list.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Owner {
    Root,
    Node(NodeId),
}

/// Trie answering "best `k` completions of a prefix" over scored terms.
///
/// `S` is any totally ordered score. Terms are non-empty strings compared
/// bytewise.
pub struct ScoredTrie<S> {
    arena: NodeArena<S>,
    /// Synthetic top-level list: empty, or one branch point at lcp 0.
    root: Vec<BranchPoint>,
    count: usize,
    config: TrieConfig,
}

impl<S> ScoredTrie<S> {
    /// Empty trie with the default [`TrieConfig`].
    pub fn new() -> Self {
        Self::with_config(TrieConfig::default())
    }

    /// Empty trie using `config`.
    pub fn with_config(config: TrieConfig) -> Self {
        Self {
            arena: NodeArena::with_capacity(config.capacity),
            root: Vec::with_capacity(1),
            count: 0,
            config,
        }
    }

    /// Settings the trie was created with.
    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    /// Number of distinct terms stored.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no term has been stored.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove every term, keeping the config.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root.clear();
        self.count = 0;
    }

    /// The highest-ranked term, which sits in the root slot.
    pub fn root(&self) -> Option<(&str, &S)> {
        self.root_node()
            .map(|node| (self.arena.key(node), self.arena.score(node)))
    }

    #[inline]
    pub(crate) fn root_node(&self) -> Option<NodeId> {
        self.root.first().map(|branch| branch.node)
    }

    pub(crate) fn set_root(&mut self, node: NodeId) {
        self.root.clear();
        self.root.push(BranchPoint::new(0, node));
    }

    /// Node held by `owner[index]`.
    pub(crate) fn slot(&self, owner: Owner, index: usize) -> Result<NodeId> {
        let list = match owner {
            Owner::Root => &self.root[..],
            Owner::Node(node) => self.arena.branches(node),
        };
        list.get(index)
            .map(|branch| branch.node)
            .ok_or_else(|| Error::corrupted(format!("branch slot {index} of {owner:?} is missing")))
    }

    pub(crate) fn list_mut(&mut self, owner: Owner) -> (rank::Ranks<'_, S>, &mut Vec<BranchPoint>) {
        match owner {
            Owner::Root => (self.arena.ranks(), &mut self.root),
            Owner::Node(node) => self.arena.split_list(node),
        }
    }
}

impl<S: Ord> ScoredTrie<S> {
    /// Walk the whole structure and verify its invariants:
    ///
    /// - every branch list is in strictly descending rank;
    /// - no list holds two branch points with the same lcp;
    /// - every node outranks all of its children;
    /// - a branch point's lcp is exactly the shared prefix length of the owner's
    ///   key and the child's key;
    /// - each live node is owned by exactly one slot and `len()` matches.
    ///
    /// Runs in `O(n)` for bounded branching; intended for tests and for hosts
    /// that want to audit a long-lived trie.
    pub fn check_invariants(&self) -> Result<()> {
        if self.root.len() > 1 {
            return Err(Error::corrupted(format!("root slot holds {} entries", self.root.len())));
        }

        let mut seen = vec![false; self.arena.slots()];
        for freed in self.arena.freed() {
            seen[freed.index()] = true;
        }

        let mut stack = Vec::new();
        if let Some(root) = self.root.first() {
            if root.lcp != 0 {
                return Err(Error::corrupted(format!("root slot has lcp {}", root.lcp)));
            }
            stack.push(root.node);
        }

        let ranks = self.arena.ranks();
        let mut reachable = 0usize;
        while let Some(owner) = stack.pop() {
            if std::mem::replace(&mut seen[owner.index()], true) {
                return Err(Error::corrupted(format!(
                    "node {:?} is freed or linked twice",
                    self.arena.key(owner)
                )));
            }
            reachable += 1;

            let key = self.arena.key(owner);
            let list = self.arena.branches(owner);
            for (i, branch) in list.iter().enumerate() {
                let child = self.arena.key(branch.node);
                if i > 0 && !ranks.outranks(list[i - 1].node, branch.node) {
                    return Err(Error::corrupted(format!(
                        "branch list of {key:?} out of rank order at {child:?}"
                    )));
                }
                if list[..i].iter().any(|other| other.lcp == branch.lcp) {
                    return Err(Error::corrupted(format!(
                        "branch list of {key:?} repeats lcp {}",
                        branch.lcp
                    )));
                }
                if !ranks.outranks(owner, branch.node) {
                    return Err(Error::corrupted(format!("{child:?} outranks its owner {key:?}")));
                }
                let shared = extend_lcp(key.as_bytes(), child.as_bytes(), 0);
                if shared != branch.lcp {
                    return Err(Error::corrupted(format!(
                        "{child:?} below {key:?} at lcp {} shares {shared} bytes",
                        branch.lcp
                    )));
                }
                stack.push(branch.node);
            }
        }

        if reachable != self.count || reachable != self.arena.live() {
            return Err(Error::corrupted(format!(
                "{reachable} reachable nodes, {} counted, {} live",
                self.count,
                self.arena.live()
            )));
        }
        Ok(())
    }
}

impl<S> Default for ScoredTrie<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> Clone for ScoredTrie<S> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root.clone(),
            count: self.count,
            config: self.config,
        }
    }
}

impl<S: Ord + std::fmt::Debug> std::fmt::Debug for ScoredTrie<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Inserts each pair with [`ScoredTrie::set`]. Terms rejected as usage errors
/// are skipped with a warning.
///
/// # Panics
///
/// Panics if an invariant violation is detected.
impl<K: AsRef<str>, S: Ord> Extend<(K, S)> for ScoredTrie<S> {
    fn extend<I: IntoIterator<Item = (K, S)>>(&mut self, iter: I) {
        for (term, score) in iter {
            let term = term.as_ref();
            match self.set(term, score) {
                Ok(()) => {}
                Err(err @ Error::Corrupted(_)) => panic!("{err}"),
                Err(err) => tracing::warn!(term, %err, "skipping rejected term"),
            }
        }
    }
}

impl<K: AsRef<str>, S: Ord> FromIterator<(K, S)> for ScoredTrie<S> {
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}


#[cfg(test)]
mod proptests;
