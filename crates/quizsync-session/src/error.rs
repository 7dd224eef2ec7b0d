//! Error types for the session layer.

use quizsync_protocol::{GameStatus, ProtocolError, SessionCode};
use quizsync_store::StoreError;

/// Errors raised while creating, joining or leaving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider could not issue an identity. No session
    /// operation is possible without one.
    #[error("identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// The code the player typed is not a valid session code.
    #[error(transparent)]
    InvalidCode(#[from] ProtocolError),

    /// No session record exists under this code.
    #[error("no session with code {0}")]
    SessionNotFound(SessionCode),

    /// The session exists but has already started or ended.
    #[error("session {code} is not accepting players (status: {status})")]
    SessionNotJoinable {
        code: SessionCode,
        status: GameStatus,
    },

    /// The operation is reserved for the session host.
    #[error("operation requires the session host")]
    NotHost,

    /// The stored record does not decode as a session record. Points
    /// at a writer outside this protocol, or a version mismatch.
    #[error("corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
