//! Shared data model for QuizSync.
//!
//! This crate defines the shapes that live in the shared session store:
//! the session record, players, questions, the status state machine,
//! and the session-code format. It also owns the store path layout —
//! every other crate addresses the tree through [`paths`] instead of
//! hand-building strings.
//!
//! The serialized field names (camelCase) are the store tree's field
//! names; a snapshot read from the store deserializes directly into
//! these types.

mod code;
mod error;
pub mod paths;
mod types;

pub use code::{CODE_ALPHABET, CODE_LENGTH, SessionCode};
pub use error::ProtocolError;
pub use types::{
    ClientId, Difficulty, GameSettings, GameStatus, Player, Question,
    SessionRecord,
};
