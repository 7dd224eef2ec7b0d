//! # QuizSync
//!
//! Turn-synchronized multiplayer quiz sessions over a shared
//! watchable store.
//!
//! Clients coordinate exclusively through the store: the host
//! publishes game state, every client watches it, and presence hooks
//! keep the record honest when a client vanishes. There is no
//! game server — any number of clients in one process (or anything
//! that can share a [`StoreHandle`]) can play.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quizsync::prelude::*;
//!
//! # async fn demo() -> Result<(), QuizError> {
//! let store = SharedStore::spawn();
//!
//! let host = QuizClient::new(store.clone());
//! let mut game = host
//!     .create_game("Alice", GameSettings {
//!         question_set: "general".into(),
//!         difficulty: Difficulty::Medium,
//!     })
//!     .await?;
//! println!("join with code {}", game.code());
//!
//! // elsewhere: QuizClient::new(store).join_game("Bob", code).await?
//!
//! game.start().await?;
//! while let Some(event) = game.next_event().await {
//!     // react to GameEvent::QuestionPresented, TimerTick, ...
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod runtime;

pub use client::{GameEvent, GameSession, QuizClient, QuizConfig};
pub use error::QuizError;

// Re-export the pieces callers need from the sub-crates.
pub use quizsync_game::{
    GameError, ProgressionConfig, QuestionBank, ScoreRow, scoreboard,
};
pub use quizsync_protocol::{
    ClientId, Difficulty, GameSettings, GameStatus, Player, Question,
    SessionCode, SessionRecord,
};
pub use quizsync_session::{
    AnonymousIdentity, IdentityProvider, SessionError,
};
pub use quizsync_store::{ServerValue, SharedStore, StoreHandle};
pub use quizsync_timer::CountdownConfig;

/// The commonly needed imports in one place.
pub mod prelude {
    pub use crate::{
        AnonymousIdentity, CountdownConfig, Difficulty, GameError, GameEvent,
        GameSession, GameSettings, GameStatus, IdentityProvider,
        ProgressionConfig, Question, QuestionBank, QuizClient, QuizConfig,
        QuizError, ScoreRow, SessionCode, SharedStore, StoreHandle,
    };
}

/// Installs a `tracing` subscriber reading `RUST_LOG`, for demos and
/// ad-hoc debugging. A no-op if a subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
