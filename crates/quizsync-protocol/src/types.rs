//! Core session types: the shapes stored in the shared tree.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionCode;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An opaque, stable per-client identity token, issued by the identity
/// provider before any session operation. Also the key of the player's
/// entry in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// Lifecycle of a session. Transitions are forward-only —
/// Waiting → Playing → Ended — with one exception: the host can reset
/// an Ended session back to Waiting for a rematch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Lobby: accepting joins, host can start.
    Waiting,
    /// Quiz in progress. `questions` and `currentQuestionIndex` are set.
    Playing,
    /// Game over (last question answered, or host vanished). Results
    /// are visible; host may reset.
    Ended,
}

impl GameStatus {
    /// Returns `true` if new players may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing)
                | (Self::Playing, Self::Ended)
                | (Self::Ended, Self::Waiting)
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings & questions
// ---------------------------------------------------------------------------

/// Question difficulty, chosen by the host at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// Host-chosen game settings. Immutable once the session leaves
/// Waiting, except through a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Name of the question set (e.g. "general", "science").
    pub question_set: String,
    pub difficulty: Difficulty,
}

/// One quiz question. `answer` is the correct entry of `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One player's entry in the session record.
///
/// Write discipline: `score` and `correct_answers` only ever grow, via
/// server-side increments issued by that player's own client;
/// `connected` is flipped by the presence hook; the host resets
/// `has_answered` and `character_id` between questions and games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    /// Empty until the player picks a character after game start.
    #[serde(default)]
    pub character_id: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub correct_answers: u32,
    pub is_host: bool,
    pub connected: bool,
    #[serde(default)]
    pub has_answered: bool,
    /// Server-assigned join timestamp (ms). Strictly monotonic per
    /// store, so it doubles as arrival order.
    #[serde(default)]
    pub joined_at: i64,
}

// ---------------------------------------------------------------------------
// Session record
// ---------------------------------------------------------------------------

/// The full session record, as stored at `games/{CODE}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub code: SessionCode,
    /// Identity of the creating client. Immutable after creation; the
    /// one player with `is_host` set is this client.
    pub host_id: ClientId,
    pub status: GameStatus,
    pub settings: GameSettings,
    /// Shuffled question order, present only while playing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<u32>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub players: HashMap<ClientId, Player>,
}

impl SessionRecord {
    /// Iterates over connected players only. Disconnected players keep
    /// their record (and score) but never count toward any quorum.
    pub fn connected_players(&self) -> impl Iterator<Item = (&ClientId, &Player)> {
        self.players.iter().filter(|(_, p)| p.connected)
    }

    /// Number of connected players.
    pub fn connected_count(&self) -> usize {
        self.connected_players().count()
    }

    /// The all-answered quorum: every connected player has answered the
    /// active question. False when nobody is connected.
    pub fn all_answered(&self) -> bool {
        let mut any = false;
        for (_, p) in self.connected_players() {
            if !p.has_answered {
                return false;
            }
            any = true;
        }
        any
    }

    /// Number of questions in the shuffled order (0 while waiting).
    pub fn question_count(&self) -> usize {
        self.questions.as_ref().map_or(0, Vec::len)
    }
}

// =========================================================================
// Tests
// =========================================================================
