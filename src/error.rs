//! Error types for scored-trie

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`ScoredTrie`](crate::ScoredTrie).
///
/// `EmptyTerm` and `TermTooLong` are usage errors: they are checked before the
/// trie is touched, so the structure is unchanged and the caller may retry.
/// `Corrupted` means an internal invariant no longer holds; the trie must not be
/// used for further queries once it has been reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Terms must contain at least one byte
    #[error("term must not be empty")]
    EmptyTerm,

    /// Term exceeds the configured `max_term_len`
    #[error("term is {len} bytes, limit is {max}")]
    TermTooLong { len: usize, max: usize },

    /// Internal consistency failure
    #[error("trie invariant violated: {0}")]
    Corrupted(String),
}

impl Error {
    /// Create an invariant-violation error and report it.
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(%msg, "scored trie invariant violated");
        Error::Corrupted(msg)
    }
}
