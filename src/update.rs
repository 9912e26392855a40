//! Update engine: insertion and score changes.
//!
//! `set` walks from the root slot tracking how many bytes of the term match the
//! path so far, and stops at the first node where one of these holds:
//!
//! 1. the trie is empty: the term becomes the root;
//! 2. the node holds the term: its score changes in place, and if one of its
//!    children now outranks it the child takes its slot and the node is sunk
//!    back into the subtree;
//! 3. the term outranks the node: the term takes the node's slot and the
//!    displaced chain is re-partitioned under it;
//! 4. otherwise the walk follows the branch point at the matched length, or
//!    attaches the term there as a new leaf.

use std::cmp::Ordering;

use crate::arena::{BranchPoint, NodeId};
use crate::error::{Error, Result};
use crate::rank::{extend_lcp, find_lcp, rank_cmp, split_below};
use crate::{Owner, ScoredTrie};

impl<S: Ord> ScoredTrie<S> {
    /// Insert `term` with `score`, or change the score of an existing term.
    ///
    /// Usage errors ([`Error::EmptyTerm`], [`Error::TermTooLong`]) are returned
    /// before the trie is modified.
    ///
    /// ```rust
    /// use scored_trie::ScoredTrie;
    ///
    /// let mut trie: ScoredTrie<u32> = ScoredTrie::new();
    /// trie.set("car", 3).unwrap();
    /// trie.set("cart", 9).unwrap();
    /// trie.set("car", 10).unwrap();
    /// assert_eq!(trie.top_completions("ca", 1), vec!["car"]);
    /// ```
    pub fn set(&mut self, term: &str, score: S) -> Result<()> {
        self.config.validate_term(term)?;

        let Some(root) = self.root_node() else {
            let node = self.arena.alloc(term, score);
            self.set_root(node);
            self.count += 1;
            tracing::trace!(term, "bootstrapped root");
            return Ok(());
        };

        let bytes = term.as_bytes();
        let mut owner = Owner::Root;
        let mut index = 0;
        let mut node = root;
        let mut lcp = 0;

        loop {
            let key = self.arena.key(node);
            lcp = extend_lcp(bytes, key.as_bytes(), lcp);

            if lcp == bytes.len() && lcp == key.len() {
                return self.update_in_place(owner, index, node, score);
            }

            if rank_cmp(&score, term, self.arena.score(node), key) == Ordering::Greater {
                return self.displace(owner, index, term, score, lcp);
            }

            match find_lcp(self.arena.branches(node), lcp) {
                Some(next) => {
                    owner = Owner::Node(node);
                    index = next;
                    node = self.slot(owner, index)?;
                    // A child hangs at exactly the length it shares with its owner.
                    if self.arena.key(node).len() < lcp {
                        return Err(Error::corrupted(format!(
                            "{:?} hangs at lcp {lcp} but is shorter",
                            self.arena.key(node)
                        )));
                    }
                }
                None => {
                    let leaf = self.arena.alloc(term, score);
                    let (ranks, list) = self.arena.split_list(node);
                    ranks.insert(list, BranchPoint::new(lcp, leaf));
                    self.count += 1;
                    tracing::trace!(term, lcp, "attached leaf");
                    return Ok(());
                }
            }
        }
    }

    /// Case 2: `node` (at `owner[index]`) already holds the term.
    fn update_in_place(&mut self, owner: Owner, index: usize, node: NodeId, score: S) -> Result<()> {
        self.arena.set_score(node, score);

        let mut children = self.arena.take_branches(node);
        let demoted = children
            .first()
            .is_some_and(|head| self.arena.ranks().outranks(head.node, node));
        if !demoted {
            self.arena.set_branches(node, children);
            let (ranks, list) = self.list_mut(owner);
            ranks.resift(list, index);
            tracing::trace!(key = self.arena.key(node), "updated score in place");
            return Ok(());
        }

        // The best child takes the node's slot. It ranked below the node's old
        // score, so it can only move towards the back of that list.
        let head = children[0];
        {
            let (ranks, list) = self.list_mut(owner);
            list[index].node = head.node;
            ranks.sift_down(list, index);
        }

        // The node re-enters its own former children as a childless entry at
        // its full key length; every entry is then re-homed in rank order.
        children[0] = BranchPoint::new(self.arena.key(node).len(), node);
        self.arena.ranks().sift_down(&mut children, 0);
        let last = children[children.len() - 1].node;

        // Anchors: nodes already placed, each taking over the entries whose lcp
        // against the demoted key is at least the anchor's own lcp. Their lcps
        // strictly increase.
        let mut anchors = vec![(head.node, head.lcp)];
        for &branch in &children {
            let Some(&(top, top_lcp)) = anchors.last() else {
                return Err(Error::corrupted("rotation lost its anchor chain"));
            };

            if branch.lcp >= top_lcp {
                self.sink(top, top_lcp, branch.node);
                if branch.lcp > top_lcp && branch.node != last {
                    anchors.push((branch.node, branch.lcp));
                }
            } else {
                let settled = &anchors[..anchors.len() - 1];
                let host = anchors[settled.partition_point(|&(_, lcp)| lcp <= branch.lcp)].0;
                let (ranks, list) = self.arena.split_list(host);
                ranks.insert(list, branch);
            }
        }

        tracing::trace!(
            key = self.arena.key(node),
            rehomed = children.len(),
            "rotated node below its best child"
        );
        Ok(())
    }

    /// Follow the chain of branch points at `lcp` starting below `start` and
    /// hang `node` at the first position where it outranks the occupant, or at
    /// the end of the chain. A displaced occupant becomes `node`'s child.
    fn sink(&mut self, start: NodeId, lcp: usize, node: NodeId) {
        let mut current = start;
        loop {
            let Some(at) = find_lcp(self.arena.branches(current), lcp) else {
                let (ranks, list) = self.arena.split_list(current);
                ranks.insert(list, BranchPoint::new(lcp, node));
                return;
            };

            let occupant = self.arena.branches(current)[at];
            if self.arena.ranks().outranks(node, occupant.node) {
                let (ranks, list) = self.arena.split_list(node);
                ranks.insert(list, occupant);

                let (ranks, list) = self.arena.split_list(current);
                list[at] = BranchPoint::new(lcp, node);
                ranks.sift_up(list, at);
                return;
            }
            current = occupant.node;
        }
    }

    /// Case 3: the new term outranks the node at `owner[index]`, with which it
    /// shares `lcp` bytes.
    ///
    /// The term takes the slot. Walking down the displaced node's chain, every
    /// node that shares more of the term is pulled up under the new node at its
    /// longer lcp, together with its branch points below that lcp. An older
    /// node holding the same term is spliced out and its children merged in.
    fn displace(&mut self, owner: Owner, index: usize, term: &str, score: S, mut lcp: usize) -> Result<()> {
        let bytes = term.as_bytes();
        let displaced = self.slot(owner, index)?;
        let fresh = self.arena.alloc(term, score);

        {
            let (ranks, list) = self.list_mut(owner);
            list[index].node = fresh;
            ranks.sift_up(list, index);
        }

        let mut gathered = vec![BranchPoint::new(lcp, displaced)];
        split_below(self.arena.branches_mut(displaced), lcp, &mut gathered);
        self.arena.set_branches(fresh, gathered);

        let mut cursor = displaced;
        let mut node = displaced;

        while lcp != bytes.len() {
            let (parent, at) = loop {
                let parent = cursor;
                let Some(at) = find_lcp(self.arena.branches(parent), lcp) else {
                    self.finish_displace(term);
                    return Ok(());
                };
                node = self.arena.branches(parent)[at].node;
                cursor = node;
                let key = self.arena.key(node).as_bytes();
                if lcp < key.len() && key[lcp] == bytes[lcp] {
                    break (parent, at);
                }
            };

            let key = self.arena.key(node).as_bytes();
            let key_len = key.len();
            let shared = extend_lcp(bytes, key, lcp + 1);
            self.supplant(parent, at, node, lcp);
            lcp = shared;

            if lcp != bytes.len() || lcp != key_len {
                let mut list = self.arena.take_branches(fresh);
                let start = list.len();
                list.push(BranchPoint::new(lcp, node));
                split_below(self.arena.branches_mut(node), lcp, &mut list);
                self.arena.ranks().merge_tail(&mut list, start);
                self.arena.set_branches(fresh, list);
            }
        }

        if lcp != self.arena.key(node).len() {
            let (parent, at) = loop {
                let parent = cursor;
                let Some(at) = find_lcp(self.arena.branches(parent), lcp) else {
                    self.finish_displace(term);
                    return Ok(());
                };
                node = self.arena.branches(parent)[at].node;
                cursor = node;
                if self.arena.key(node).len() == lcp {
                    break (parent, at);
                }
            };
            self.supplant(parent, at, node, lcp);
        }

        self.absorb_duplicate(fresh, node);
        Ok(())
    }

    fn finish_displace(&mut self, term: &str) {
        self.count += 1;
        tracing::trace!(term, "displaced lower-ranked chain");
    }

    /// Unlink `node` from `parent[at]`, promoting its own branch point at the
    /// same `lcp` into the vacated slot when it has one.
    fn supplant(&mut self, parent: NodeId, at: usize, node: NodeId, lcp: usize) {
        match find_lcp(self.arena.branches(node), lcp) {
            None => {
                self.arena.branches_mut(parent).remove(at);
            }
            Some(successor) => {
                let replacement = self.arena.branches_mut(node).remove(successor);
                let (ranks, list) = self.arena.split_list(parent);
                list[at] = replacement;
                ranks.sift_down(list, at);
            }
        }
    }

    /// `stale` held the same key as `fresh` under a lower rank and has been
    /// unlinked: merge its branch points into `fresh` and free it.
    fn absorb_duplicate(&mut self, fresh: NodeId, stale: NodeId) {
        let mut orphans = self.arena.take_branches(stale);
        let mut list = self.arena.take_branches(fresh);
        let start = list.len();
        list.append(&mut orphans);
        self.arena.ranks().merge_tail(&mut list, start);
        self.arena.set_branches(fresh, list);
        self.arena.free(stale);
        tracing::trace!(key = self.arena.key(fresh), "merged superseded node");
    }
}
