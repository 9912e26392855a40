//! Rank order and rank-preserving list maintenance.
//!
//! A node's rank is its score, with ties broken by key: among equal scores the
//! bytewise-smaller key ranks higher. Keys are unique, so rank is a strict total
//! order over stored nodes and no two branch points ever compare equal.
//!
//! Branch lists are kept sorted by localized insertion-sort moves instead of a
//! heap: every structural event changes the position of a single element, so
//! moving it to its sorted slot costs only the distance it travels.

use std::cmp::Ordering;

use crate::arena::{BranchPoint, NodeId, Term};

/// Compare two `(score, key)` pairs by rank. `Greater` means the first outranks
/// the second.
#[inline]
pub(crate) fn rank_cmp<S: Ord>(score_a: &S, key_a: &str, score_b: &S, key_b: &str) -> Ordering {
    score_a
        .cmp(score_b)
        .then_with(|| key_b.as_bytes().cmp(key_a.as_bytes()))
}

/// Read-only view of node ranks, borrowed independently of branch lists.
pub(crate) struct Ranks<'a, S> {
    terms: &'a [Term<S>],
}

impl<S> Clone for Ranks<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Ranks<'_, S> {}

impl<'a, S> Ranks<'a, S> {
    #[inline]
    pub(crate) fn new(terms: &'a [Term<S>]) -> Self {
        Self { terms }
    }
}

impl<S: Ord> Ranks<'_, S> {
    #[inline]
    pub(crate) fn outranks(self, a: NodeId, b: NodeId) -> bool {
        let (a, b) = (&self.terms[a.index()], &self.terms[b.index()]);
        rank_cmp(&a.score, &a.key, &b.score, &b.key) == Ordering::Greater
    }

    /// Move `list[index]` towards the front until its predecessor outranks it.
    /// Returns where it landed.
    pub(crate) fn sift_up(self, list: &mut [BranchPoint], mut index: usize) -> usize {
        let element = list[index];
        while index > 0 && self.outranks(element.node, list[index - 1].node) {
            list[index] = list[index - 1];
            index -= 1;
        }
        list[index] = element;
        index
    }

    /// Move `list[index]` towards the back until it outranks its successor.
    pub(crate) fn sift_down(self, list: &mut [BranchPoint], mut index: usize) {
        let element = list[index];
        while index + 1 < list.len() && self.outranks(list[index + 1].node, element.node) {
            list[index] = list[index + 1];
            index += 1;
        }
        list[index] = element;
    }

    /// Restore order after `list[index]` changed rank in either direction.
    pub(crate) fn resift(self, list: &mut [BranchPoint], index: usize) {
        if self.sift_up(list, index) == index {
            self.sift_down(list, index);
        }
    }

    /// Append `branch` and move it to its sorted position.
    pub(crate) fn insert(self, list: &mut Vec<BranchPoint>, branch: BranchPoint) {
        list.push(branch);
        let last = list.len() - 1;
        self.sift_up(list, last);
    }

    /// Merge the sorted run `list[start..]` into the sorted run `list[..start]`.
    ///
    /// Stops as soon as an element of the tail is already in place, since
    /// everything after it ranks lower still.
    pub(crate) fn merge_tail(self, list: &mut [BranchPoint], start: usize) {
        for index in start..list.len() {
            if index == 0 || !self.outranks(list[index].node, list[index - 1].node) {
                break;
            }
            self.sift_up(list, index);
        }
    }
}

/// Position of the branch point with exactly this `lcp`.
#[inline]
pub(crate) fn find_lcp(list: &[BranchPoint], lcp: usize) -> Option<usize> {
    list.iter().position(|branch| branch.lcp == lcp)
}

/// Move branch points with `lcp` below `threshold` from `source` to the end of
/// `dest`, keeping relative order on both sides.
pub(crate) fn split_below(source: &mut Vec<BranchPoint>, threshold: usize, dest: &mut Vec<BranchPoint>) {
    source.retain(|branch| {
        if branch.lcp < threshold {
            dest.push(*branch);
            false
        } else {
            true
        }
    });
}

/// Length of the shared prefix of `a` and `b`, starting the scan at `from`.
/// Bytes before `from` are assumed equal.
#[inline]
pub(crate) fn extend_lcp(a: &[u8], b: &[u8], from: usize) -> usize {
    let max = a.len().min(b.len());
    let mut lcp = from;
    while lcp < max && a[lcp] == b[lcp] {
        lcp += 1;
    }
    lcp
}
