//! The per-session background task.
//!
//! Owns the session handle, its store watches and the question
//! countdown, and multiplexes them with the owner's commands in one
//! `tokio::select!` loop. All game state lives in the store; the task
//! keeps only what it needs to act exactly once per transition (the
//! current phase, the last seen question index, whether this client
//! has answered).

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use quizsync_game::{
    GameError, ProgressionController, QuestionBank, collector, scoreboard,
};
use quizsync_protocol::{ClientId, GameStatus, Player, SessionCode, paths};
use quizsync_session::{SessionError, SessionHandle, SessionManager};
use quizsync_store::{StoreError, StoreHandle, Watch};
use quizsync_timer::{Countdown, CountdownEvent};

use crate::{GameEvent, QuizConfig, QuizError};

/// Commands from the owning [`GameSession`](crate::GameSession).
pub(crate) enum Command {
    Start {
        reply: oneshot::Sender<Result<(), QuizError>>,
    },
    ChooseCharacter {
        character_id: String,
        reply: oneshot::Sender<Result<(), QuizError>>,
    },
    Answer {
        selected: String,
        reply: oneshot::Sender<Result<bool, QuizError>>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), QuizError>>,
    },
    Leave {
        reply: oneshot::Sender<Result<(), QuizError>>,
    },
    Abandon,
}

/// Where this client is in the game flow. Derived from the store's
/// status plus the character gate, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Lobby,
    CharacterSelect,
    Quiz,
    Results,
}

/// How the select loop ended.
enum Exit {
    Leave(oneshot::Sender<Result<(), QuizError>>),
    Abandon,
    Closed,
}

struct Runtime {
    manager: SessionManager,
    handle: SessionHandle,
    bank: QuestionBank,
    config: QuizConfig,
    controller: ProgressionController,
    phase: Phase,
    /// This client answered the active question (or timed out).
    answered: bool,
    /// Seconds left on the local clock, fed into scoring on answer.
    remaining: u32,
    last_index: Option<u32>,
    events: UnboundedSender<GameEvent>,
    advance_tx: UnboundedSender<()>,
}

pub(crate) async fn run(
    manager: SessionManager,
    handle: SessionHandle,
    bank: QuestionBank,
    config: QuizConfig,
    mut commands: UnboundedReceiver<Command>,
    events: UnboundedSender<GameEvent>,
) {
    let store = handle.store().clone();
    let code = handle.code().clone();
    let (mut status_watch, mut players_watch, mut index_watch) =
        match watch_session(&store, &code).await {
            Ok(watches) => watches,
            Err(e) => {
                let _ = events.send(GameEvent::Error(e.to_string()));
                return;
            }
        };

    let (advance_tx, mut advance_rx) = mpsc::unbounded_channel();
    let mut rt = Runtime {
        manager,
        handle,
        bank,
        controller: ProgressionController::new(config.progression.clone()),
        remaining: config.countdown.total_secs,
        config,
        phase: Phase::Lobby,
        answered: false,
        last_index: None,
        events,
        advance_tx,
    };
    let mut countdown: Option<Countdown> = None;

    let exit = loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Leave { reply }) => break Exit::Leave(reply),
                // A dropped GameSession is an abrupt disconnect.
                Some(Command::Abandon) | None => break Exit::Abandon,
                Some(cmd) => rt.on_command(cmd, &mut countdown).await,
            },
            Some(v) = status_watch.recv() => {
                if v.is_null() {
                    // The record is gone: the host cancelled the
                    // session out from under us.
                    rt.emit(GameEvent::SessionClosed);
                    break Exit::Closed;
                }
                if let Err(e) = rt.on_status(v, &mut countdown).await {
                    rt.emit_error(e);
                }
            }
            Some(v) = players_watch.recv() => {
                if let Err(e) = rt.on_players(v, &mut countdown).await {
                    rt.emit_error(e);
                }
            }
            Some(v) = index_watch.recv() => {
                if let Err(e) = rt.on_index(v, &mut countdown).await {
                    rt.emit_error(e);
                }
            }
            ev = next_countdown_event(&mut countdown) => {
                if let Err(e) = rt.on_countdown(ev, &mut countdown).await {
                    rt.emit_error(e);
                }
            }
            Some(()) = advance_rx.recv() => {
                if rt.handle.is_host() {
                    if let Err(e) = rt.controller.advance(&rt.handle).await {
                        rt.emit_error(e.into());
                    }
                }
            }
            else => break Exit::Closed,
        }
    };

    match exit {
        Exit::Leave(reply) => {
            let result = rt
                .manager
                .leave_session(rt.handle)
                .await
                .map_err(QuizError::from);
            let _ = reply.send(result);
        }
        // Dropping the handle without disarming the hooks is the
        // disconnect path; the store flips this player to
        // disconnected (and ends the game if this was the host).
        Exit::Abandon | Exit::Closed => {}
    }
}

impl Runtime {
    async fn on_command(&mut self, cmd: Command, countdown: &mut Option<Countdown>) {
        match cmd {
            Command::Start { reply } => {
                let result = self
                    .controller
                    .start(&self.handle, &self.bank)
                    .await
                    .map_err(QuizError::from);
                let _ = reply.send(result);
            }
            Command::ChooseCharacter { character_id, reply } => {
                let result = collector::choose_character(&self.handle, &character_id)
                    .await
                    .map_err(QuizError::from);
                let _ = reply.send(result);
            }
            Command::Answer { selected, reply } => {
                let result = self.answer(&selected).await;
                if result.is_ok() {
                    // The question is settled for this client; the
                    // clock stops instead of ticking to expiry.
                    *countdown = None;
                }
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                let result = self
                    .controller
                    .reset(&self.handle)
                    .await
                    .map_err(QuizError::from);
                let _ = reply.send(result);
            }
            Command::Leave { .. } | Command::Abandon => {
                unreachable!("terminal commands are handled by the select loop")
            }
        }
    }

    async fn answer(&mut self, selected: &str) -> Result<bool, QuizError> {
        if self.phase != Phase::Quiz {
            return Err(GameError::NoActiveQuestion.into());
        }
        if self.answered {
            return Err(QuizError::AlreadyAnswered);
        }
        let correct =
            collector::submit_answer(&self.handle, selected, self.remaining).await?;
        self.answered = true;
        Ok(correct)
    }

    async fn on_status(
        &mut self,
        value: Value,
        countdown: &mut Option<Countdown>,
    ) -> Result<(), QuizError> {
        let status: GameStatus =
            serde_json::from_value(value).map_err(SessionError::Corrupt)?;
        debug!(?status, phase = ?self.phase, "status changed");
        match status {
            GameStatus::Playing if self.phase == Phase::Lobby => {
                self.phase = Phase::CharacterSelect;
                self.answered = false;
                self.emit(GameEvent::CharacterSelectStarted);
            }
            GameStatus::Ended if self.phase != Phase::Results => {
                self.phase = Phase::Results;
                *countdown = None;
                self.controller.cancel_pending();
                let record = self.handle.read_record().await?;
                self.emit(GameEvent::GameEnded {
                    ranking: scoreboard::rank(&record),
                });
            }
            GameStatus::Waiting if self.phase != Phase::Lobby => {
                self.phase = Phase::Lobby;
                *countdown = None;
                self.last_index = None;
                self.answered = false;
                self.emit(GameEvent::ReturnedToLobby);
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_players(
        &mut self,
        value: Value,
        countdown: &mut Option<Countdown>,
    ) -> Result<(), QuizError> {
        if value.is_null() {
            // Record teardown in flight; the status watch decides.
            return Ok(());
        }
        let players: HashMap<ClientId, Player> =
            serde_json::from_value(value).map_err(SessionError::Corrupt)?;
        self.emit(GameEvent::PlayersChanged {
            scoreboard: scoreboard::rank_players(&players),
        });

        // The character gate: the quiz proper begins once every
        // connected player has picked.
        if self.phase == Phase::CharacterSelect && characters_ready(&players) {
            self.phase = Phase::Quiz;
            self.emit(GameEvent::QuizStarted);
            if let Some(index) = self.last_index {
                self.present_question(index, countdown).await?;
            }
        }

        // The host re-evaluates the all-answered quorum on every
        // player change, so it triggers no matter whose answer (or
        // disconnect) completed it.
        if self.handle.is_host() && self.phase == Phase::Quiz {
            self.controller
                .check_quorum(&self.handle, &self.advance_tx)
                .await?;
        }
        Ok(())
    }

    async fn on_index(
        &mut self,
        value: Value,
        countdown: &mut Option<Countdown>,
    ) -> Result<(), QuizError> {
        let Some(index) = value.as_u64() else {
            // Null while waiting or after a reset.
            return Ok(());
        };
        let index = index as u32;
        let changed = self.last_index != Some(index);
        self.last_index = Some(index);
        // During character select the index is already 0; the
        // question is presented when the gate opens, not here.
        if changed && self.phase == Phase::Quiz {
            self.present_question(index, countdown).await?;
        }
        Ok(())
    }

    async fn on_countdown(
        &mut self,
        event: CountdownEvent,
        countdown: &mut Option<Countdown>,
    ) -> Result<(), QuizError> {
        match event {
            CountdownEvent::Tick { remaining } => {
                self.remaining = remaining;
                self.emit(GameEvent::TimerTick { remaining });
            }
            CountdownEvent::Expired => {
                *countdown = None;
                self.remaining = 0;
                if !self.answered {
                    self.answered = true;
                    self.emit(GameEvent::TimedOut);
                    collector::mark_timed_out(&self.handle).await?;
                }
            }
        }
        Ok(())
    }

    /// Publishes a question to the owner and restarts the clock.
    async fn present_question(
        &mut self,
        index: u32,
        countdown: &mut Option<Countdown>,
    ) -> Result<(), QuizError> {
        let record = self.handle.read_record().await?;
        let total = record.question_count();
        let Some(question) = record
            .questions
            .as_ref()
            .and_then(|qs| qs.get(index as usize))
        else {
            return Err(GameError::NoActiveQuestion.into());
        };
        self.answered = false;
        self.remaining = self.config.countdown.total_secs;
        *countdown = Some(Countdown::start(self.config.countdown.clone()));
        self.emit(GameEvent::QuestionPresented {
            index,
            total,
            question: question.clone(),
        });
        Ok(())
    }

    fn emit(&self, event: GameEvent) {
        // The owner may have stopped listening; that's their call.
        let _ = self.events.send(event);
    }

    fn emit_error(&self, err: QuizError) {
        warn!(code = %self.handle.code(), error = %err, "session task error");
        self.emit(GameEvent::Error(err.to_string()));
    }
}

async fn watch_session(
    store: &StoreHandle,
    code: &SessionCode,
) -> Result<(Watch, Watch, Watch), StoreError> {
    Ok((
        store.watch(&paths::status(code)).await?,
        store.watch(&paths::players(code)).await?,
        store.watch(&paths::current_question_index(code)).await?,
    ))
}

/// True once every connected player picked a character (and there is
/// at least one connected player).
fn characters_ready(players: &HashMap<ClientId, Player>) -> bool {
    let mut any = false;
    for p in players.values().filter(|p| p.connected) {
        if p.character_id.is_empty() {
            return false;
        }
        any = true;
    }
    any
}

/// Resolves to the next countdown event, or pends forever when no
/// countdown is running (so the select loop's other branches win).
async fn next_countdown_event(countdown: &mut Option<Countdown>) -> CountdownEvent {
    match countdown {
        Some(c) => match c.recv().await {
            Some(ev) => ev,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}
