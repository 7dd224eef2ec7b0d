//! The client surface: one [`QuizClient`] per process or player, one
//! [`GameSession`] per game they are in.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use quizsync_game::{ProgressionConfig, QuestionBank, ScoreRow};
use quizsync_protocol::{ClientId, GameSettings, Question, SessionCode};
use quizsync_session::{
    AnonymousIdentity, IdentityProvider, SessionManager,
};
use quizsync_store::StoreHandle;
use quizsync_timer::CountdownConfig;

use crate::QuizError;
use crate::runtime::{self, Command};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for a client's game sessions. Defaults give the standard
/// pacing: 2 players to start, 10-second questions, 2-second reveal
/// between questions.
#[derive(Debug, Clone, Default)]
pub struct QuizConfig {
    pub progression: ProgressionConfig,
    pub countdown: CountdownConfig,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a session reports back to its owner, in the order it happens.
///
/// Every event is derived from a store watch firing, so two clients
/// in the same game see the same sequence of state changes (their
/// local-only events, like [`GameEvent::TimerTick`], aside).
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The player list changed: someone joined, left, disconnected,
    /// scored, or picked a character. Carries the current standings.
    PlayersChanged { scoreboard: Vec<ScoreRow> },
    /// The host started the game; pick a character.
    CharacterSelectStarted,
    /// Everyone has a character; questions begin.
    QuizStarted,
    /// A new question is on. The countdown restarts.
    QuestionPresented {
        index: u32,
        total: usize,
        question: Question,
    },
    /// One second elapsed on the question clock.
    TimerTick { remaining: u32 },
    /// The clock ran out before this client answered.
    TimedOut,
    /// Game over. Final standings, best first.
    GameEnded { ranking: Vec<ScoreRow> },
    /// The host reset the session; back to the lobby.
    ReturnedToLobby,
    /// The session record is gone (the host cancelled it). Terminal.
    SessionClosed,
    /// A background operation failed. The session keeps running.
    Error(String),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Entry point for a player: resolves an identity, then creates or
/// joins games in a shared store.
pub struct QuizClient<I: IdentityProvider = AnonymousIdentity> {
    store: StoreHandle,
    identity: I,
    bank: QuestionBank,
    config: QuizConfig,
}

impl QuizClient<AnonymousIdentity> {
    /// A client with anonymous identities and the built-in sample
    /// question bank.
    pub fn new(store: StoreHandle) -> Self {
        Self::with_identity(store, AnonymousIdentity)
    }
}

impl<I: IdentityProvider> QuizClient<I> {
    pub fn with_identity(store: StoreHandle, identity: I) -> Self {
        Self {
            store,
            identity,
            bank: QuestionBank::sample(),
            config: QuizConfig::default(),
        }
    }

    /// Replaces the question bank (host side only: joined players
    /// never consult a bank).
    pub fn with_bank(mut self, bank: QuestionBank) -> Self {
        self.bank = bank;
        self
    }

    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates a game and returns the host's running session.
    pub async fn create_game(
        &self,
        name: &str,
        settings: GameSettings,
    ) -> Result<GameSession, QuizError> {
        let client_id = self.identity.sign_in().await?;
        let manager = SessionManager::new(self.store.clone());
        let handle = manager.create_session(client_id, name, settings).await?;
        Ok(GameSession::spawn(
            manager,
            handle,
            self.bank.clone(),
            self.config.clone(),
        ))
    }

    /// Joins the game behind `code` and returns the player's running
    /// session.
    pub async fn join_game(
        &self,
        name: &str,
        code: &str,
    ) -> Result<GameSession, QuizError> {
        let client_id = self.identity.sign_in().await?;
        let manager = SessionManager::new(self.store.clone());
        let handle = manager.join_session(client_id, name, code).await?;
        Ok(GameSession::spawn(
            manager,
            handle,
            self.bank.clone(),
            self.config.clone(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Game session
// ---------------------------------------------------------------------------

/// A live membership in one game.
///
/// The real work happens in a background task that owns the session
/// handle and its store watches; this struct is the channel-backed
/// front for it. Dropping it without calling [`GameSession::leave`]
/// is an abrupt disconnect: the presence hooks fire and the other
/// players see this one go dark.
pub struct GameSession {
    code: SessionCode,
    client_id: ClientId,
    host: bool,
    commands: UnboundedSender<Command>,
    events: UnboundedReceiver<GameEvent>,
    _task: JoinHandle<()>,
}

impl GameSession {
    fn spawn(
        manager: SessionManager,
        handle: quizsync_session::SessionHandle,
        bank: QuestionBank,
        config: QuizConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let code = handle.code().clone();
        let client_id = handle.client_id().clone();
        let host = handle.is_host();
        info!(%code, %client_id, host, "game session task starting");
        let task = tokio::spawn(runtime::run(
            manager, handle, bank, config, cmd_rx, event_tx,
        ));
        Self {
            code,
            client_id,
            host,
            commands: cmd_tx,
            events: event_rx,
            _task: task,
        }
    }

    /// The code other players type to join this game.
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn is_host(&self) -> bool {
        self.host
    }

    /// The next event, in order. `None` once the session task has
    /// shut down.
    pub async fn next_event(&mut self) -> Option<GameEvent> {
        self.events.recv().await
    }

    /// Starts the game (host only, lobby only, 2+ connected players).
    pub async fn start(&self) -> Result<(), QuizError> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Picks this player's character for the game that just started.
    pub async fn choose_character(&self, character_id: &str) -> Result<(), QuizError> {
        let character_id = character_id.to_string();
        self.request(|reply| Command::ChooseCharacter { character_id, reply })
            .await
    }

    /// Answers the active question with whatever time the local clock
    /// shows. Returns whether the answer was correct.
    pub async fn answer(&self, selected: &str) -> Result<bool, QuizError> {
        let selected = selected.to_string();
        self.request(|reply| Command::Answer { selected, reply }).await
    }

    /// Resets an ended game back to the lobby (host only).
    pub async fn reset(&self) -> Result<(), QuizError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Leaves gracefully: presence hooks are disarmed first, then the
    /// player's entry (or, for the host, the whole session) is
    /// removed.
    pub async fn leave(self) -> Result<(), QuizError> {
        self.request(|reply| Command::Leave { reply }).await
    }

    /// Drops the session without any cleanup, as a crash or network
    /// loss would. The presence hooks fire.
    pub fn abandon(self) {
        let _ = self.commands.send(Command::Abandon);
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, QuizError>>) -> Command,
    ) -> Result<T, QuizError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .map_err(|_| QuizError::Disconnected)?;
        reply_rx.await.map_err(|_| QuizError::Disconnected)?
    }
}
