//! Quiz gameplay for QuizSync.
//!
//! Everything between "lobby full" and "final scoreboard":
//!
//! 1. **Question bank** — the host's sets of questions ([`QuestionBank`])
//! 2. **Progression** — host-only start/advance/reset and the
//!    all-answered quorum ([`ProgressionController`])
//! 3. **Answers** — per-player answering, timeouts, character picks
//!    ([`collector`])
//! 4. **Ranking** — scoreboard rows from a record ([`scoreboard`])
//!
//! The split mirrors who acts: exactly one client runs the
//! progression controller (the host), every client runs the collector
//! for itself, and anyone can rank a snapshot they read.

pub mod collector;
pub mod scoreboard;

mod bank;
mod error;
mod progression;

pub use bank::QuestionBank;
pub use error::GameError;
pub use progression::{ProgressionConfig, ProgressionController};
pub use scoreboard::ScoreRow;
