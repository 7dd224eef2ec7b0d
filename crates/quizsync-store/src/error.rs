//! Error types for the store layer.

/// Errors that can occur during store operations.
///
/// Store failures are surfaced to the initiating client and never
/// retried by this layer; the one place a caller retries is session-code
/// creation, where [`StoreError::PathExists`] means "regenerate".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `create` was called on a path that already holds a value.
    #[error("path {0:?} already exists")]
    PathExists(String),

    /// A path was empty or contained an empty segment.
    #[error("invalid store path {0:?}")]
    InvalidPath(String),

    /// The store actor is gone — the command channel or reply channel
    /// closed. Every in-flight read and write fails this way.
    #[error("store is closed")]
    Closed,
}
