//! Unified error type for the QuizSync client.

use quizsync_game::GameError;
use quizsync_session::SessionError;
use quizsync_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizsync` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate; the
/// `#[from]` impls let `?` convert them automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A session-level error (identity, join, leave, presence).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A game-level error (start, answer, reset).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A store-level error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// This client already answered the active question.
    #[error("already answered the active question")]
    AlreadyAnswered,

    /// The background session task is gone (left, abandoned, or the
    /// session was closed under it).
    #[error("game session has shut down")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotHost;
        let quiz_err: QuizError = err.into();
        assert!(matches!(quiz_err, QuizError::Session(_)));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Closed;
        let quiz_err: QuizError = err.into();
        assert!(matches!(quiz_err, QuizError::Store(_)));
    }
}
