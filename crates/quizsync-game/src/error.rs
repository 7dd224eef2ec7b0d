//! Error types for the game layer.

use quizsync_protocol::{Difficulty, GameStatus};
use quizsync_session::SessionError;
use quizsync_store::StoreError;

/// Errors raised while driving a quiz.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The session is in the wrong phase for this operation (e.g.
    /// starting a game that is already playing).
    #[error("session is {actual}, operation requires {expected}")]
    WrongStatus {
        expected: GameStatus,
        actual: GameStatus,
    },

    /// Not enough connected players to start.
    #[error("need at least {required} connected players, have {connected}")]
    InsufficientPlayers { required: usize, connected: usize },

    /// The host's chosen question set / difficulty has no questions.
    #[error("no questions for set {set:?} at difficulty {difficulty}")]
    QuestionSetNotFound { set: String, difficulty: Difficulty },

    /// The record carries no active question to answer.
    #[error("no active question")]
    NoActiveQuestion,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value failed to encode for the store. Should not happen with
    /// well-formed questions.
    #[error("encoding failure: {0}")]
    Encode(#[from] serde_json::Error),
}
