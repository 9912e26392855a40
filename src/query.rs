//! Query engine: exact lookup and ranked prefix completion.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::iter::FusedIterator;

use crate::arena::NodeId;
use crate::rank::{extend_lcp, find_lcp, rank_cmp};
use crate::ScoredTrie;

impl<S> ScoredTrie<S> {
    /// Node where the matched length first reaches the end of `prefix`. Its key
    /// is the best completion of `prefix`.
    pub(crate) fn locus(&self, prefix: &[u8]) -> Option<NodeId> {
        let mut node = self.root_node()?;
        let mut lcp = 0;
        loop {
            lcp = extend_lcp(prefix, self.arena.key(node).as_bytes(), lcp);
            if lcp == prefix.len() {
                return Some(node);
            }
            let at = find_lcp(self.arena.branches(node), lcp)?;
            node = self.arena.branches(node)[at].node;
        }
    }

    /// Node holding exactly `term`.
    pub(crate) fn find(&self, term: &[u8]) -> Option<NodeId> {
        let mut node = self.root_node()?;
        let mut lcp = 0;
        loop {
            let key = self.arena.key(node).as_bytes();
            lcp = extend_lcp(term, key, lcp);
            if lcp == term.len() && lcp == key.len() {
                return Some(node);
            }
            let at = find_lcp(self.arena.branches(node), lcp)?;
            node = self.arena.branches(node)[at].node;
        }
    }

    /// Score of `term`, if stored.
    pub fn get(&self, term: &str) -> Option<&S> {
        self.find(term.as_bytes()).map(|node| self.arena.score(node))
    }

    /// Whether `term` is stored exactly.
    pub fn contains(&self, term: &str) -> bool {
        self.find(term.as_bytes()).is_some()
    }
}

impl<S: Ord> ScoredTrie<S> {
    /// Lazily yield every stored term starting with `prefix`, best first.
    ///
    /// Each step pops one head from a frontier of partially consumed branch
    /// lists, so taking `k` items costs `O(k log k)` regardless of how many
    /// terms share the prefix.
    pub fn completions(&self, prefix: &str) -> Completions<'_, S> {
        Completions {
            trie: self,
            prefix_len: prefix.len(),
            locus: self.locus(prefix.as_bytes()),
            frontier: BinaryHeap::new(),
        }
    }

    /// Up to `k` terms starting with `prefix`, in strictly descending rank.
    ///
    /// ```rust
    /// use scored_trie::ScoredTrie;
    ///
    /// let trie: ScoredTrie<u32> = [("cat", 5), ("car", 3), ("cart", 9), ("dog", 1)]
    ///     .into_iter()
    ///     .collect();
    /// assert_eq!(trie.top_completions("ca", 3), vec!["cart", "cat", "car"]);
    /// assert_eq!(trie.top_completions("d", 5), vec!["dog"]);
    /// assert!(trie.top_completions("x", 5).is_empty());
    /// ```
    pub fn top_completions(&self, prefix: &str, k: usize) -> Vec<&str> {
        if k == 0 {
            return Vec::new();
        }
        self.completions(prefix).take(k).map(|(key, _)| key).collect()
    }

    /// Like [`top_completions`](Self::top_completions), with scores.
    pub fn top_completions_with_scores(&self, prefix: &str, k: usize) -> Vec<(&str, &S)> {
        if k == 0 {
            return Vec::new();
        }
        self.completions(prefix).take(k).collect()
    }

    /// All stored terms, best first.
    pub fn iter(&self) -> Completions<'_, S> {
        self.completions("")
    }
}

/// Iterator returned by [`ScoredTrie::completions`] and [`ScoredTrie::iter`].
pub struct Completions<'a, S> {
    trie: &'a ScoredTrie<S>,
    prefix_len: usize,
    /// Pending first result; cleared once emitted.
    locus: Option<NodeId>,
    frontier: BinaryHeap<Head<'a, S>>,
}

/// First unconsumed entry of one branch list, ordered by the rank of the node
/// it points to.
struct Head<'a, S> {
    key: &'a str,
    score: &'a S,
    owner: NodeId,
    index: usize,
}

impl<S: Ord> Ord for Head<'_, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_cmp(self.score, self.key, other.score, other.key)
    }
}

impl<S: Ord> PartialOrd for Head<'_, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Ord> PartialEq for Head<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: Ord> Eq for Head<'_, S> {}

impl<'a, S: Ord> Completions<'a, S> {
    /// Push the first entry of `owner`'s list at or after `index` that stays
    /// within the prefix.
    fn push_from(&mut self, owner: NodeId, mut index: usize) {
        let trie = self.trie;
        let arena = &trie.arena;
        let list = arena.branches(owner);
        while index < list.len() && list[index].lcp < self.prefix_len {
            index += 1;
        }
        if let Some(branch) = list.get(index) {
            self.frontier.push(Head {
                key: arena.key(branch.node),
                score: arena.score(branch.node),
                owner,
                index,
            });
        }
    }
}

impl<'a, S: Ord> Iterator for Completions<'a, S> {
    type Item = (&'a str, &'a S);

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        let arena = &trie.arena;

        if let Some(locus) = self.locus.take() {
            self.push_from(locus, 0);
            return Some((arena.key(locus), arena.score(locus)));
        }

        let head = self.frontier.pop()?;
        let node = arena.branches(head.owner)[head.index].node;
        self.push_from(head.owner, head.index + 1);
        self.push_from(node, 0);
        Some((head.key, head.score))
    }
}

impl<S: Ord> FusedIterator for Completions<'_, S> {}
