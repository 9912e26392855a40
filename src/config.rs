//! Construction-time settings for [`ScoredTrie`](crate::ScoredTrie).

use crate::error::{Error, Result};

/// Settings applied when a trie is created.
///
/// ```rust
/// use scored_trie::{ScoredTrie, TrieConfig};
///
/// let config = TrieConfig::default().capacity(1024).max_term_len(64);
/// let trie: ScoredTrie<u32> = ScoredTrie::with_config(config);
/// assert_eq!(trie.config().max_term_len, Some(64));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TrieConfig {
    /// Nodes to preallocate in the arena.
    pub capacity: usize,
    /// Longest accepted term in bytes. `None` accepts any length.
    pub max_term_len: Option<usize>,
}

impl TrieConfig {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn max_term_len(mut self, max: usize) -> Self {
        self.max_term_len = Some(max);
        self
    }

    /// Usage checks run before `set` touches the structure.
    pub(crate) fn validate_term(&self, term: &str) -> Result<()> {
        if term.is_empty() {
            return Err(Error::EmptyTerm);
        }
        if let Some(max) = self.max_term_len {
            if term.len() > max {
                return Err(Error::TermTooLong {
                    len: term.len(),
                    max,
                });
            }
        }
        Ok(())
    }
}
