//! Host-side game progression: start, advance, quorum, reset.
//!
//! Exactly one client (the host) runs a [`ProgressionController`].
//! Everything it decides lands in the store, where the other clients
//! observe it through watches; the controller itself holds only the
//! bookkeeping needed to act exactly once per question.

use std::time::Duration;

use rand::seq::SliceRandom;
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use quizsync_protocol::{GameStatus, Question, paths};
use quizsync_session::SessionHandle;
use quizsync_store::ServerValue;
use quizsync_timer::AdvanceDelay;

use crate::{GameError, QuestionBank};

/// Progression settings.
#[derive(Debug, Clone)]
pub struct ProgressionConfig {
    /// Connected players required to start.
    pub min_players: usize,
    /// Pause between the last answer landing and the next question,
    /// so players see the reveal.
    pub advance_delay: Duration,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            advance_delay: Duration::from_secs(2),
        }
    }
}

/// Drives the question loop for one session. Host-side only; every
/// method checks the handle's role.
pub struct ProgressionController {
    config: ProgressionConfig,
    /// Question index an advance is already scheduled for. Guards
    /// against scheduling twice when several snapshots of the same
    /// all-answered state arrive.
    advance_scheduled_for: Option<u32>,
    pending: Option<AdvanceDelay>,
}

impl ProgressionController {
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            advance_scheduled_for: None,
            pending: None,
        }
    }

    /// Starts the game: shuffles the question set and publishes the
    /// playing state in one atomic batch.
    ///
    /// Joined players see `status` flip to `playing` with the full
    /// question order and index 0 already present — there is no
    /// intermediate state where the game is playing but has no
    /// questions.
    pub async fn start(
        &mut self,
        handle: &SessionHandle,
        bank: &QuestionBank,
    ) -> Result<(), GameError> {
        handle.require_host()?;
        let record = handle.read_record().await?;
        if record.status != GameStatus::Waiting {
            return Err(GameError::WrongStatus {
                expected: GameStatus::Waiting,
                actual: record.status,
            });
        }
        let connected = record.connected_count();
        if connected < self.config.min_players {
            return Err(GameError::InsufficientPlayers {
                required: self.config.min_players,
                connected,
            });
        }

        let mut order: Vec<Question> = bank
            .questions(&record.settings.question_set, record.settings.difficulty)?
            .to_vec();
        order.shuffle(&mut rand::rng());

        let code = handle.code();
        let mut changes = vec![
            (paths::questions(code), serde_json::to_value(&order)?),
            (paths::current_question_index(code), json!(0)),
            (paths::status(code), json!("playing")),
            (paths::started_at(code), ServerValue::timestamp()),
        ];
        // Carry-over hygiene: nobody enters the first question already
        // marked as answered or wearing last game's character.
        for id in record.players.keys() {
            changes.push((paths::player_has_answered(code, id), json!(false)));
            changes.push((paths::player_character(code, id), json!("")));
        }
        handle.store().update(changes).await?;

        self.advance_scheduled_for = None;
        self.pending = None;
        info!(%code, questions = order.len(), connected, "game started");
        Ok(())
    }

    /// Moves to the next question, or ends the game after the last
    /// one.
    pub async fn advance(&mut self, handle: &SessionHandle) -> Result<(), GameError> {
        handle.require_host()?;
        let record = handle.read_record().await?;
        if record.status != GameStatus::Playing {
            return Err(GameError::WrongStatus {
                expected: GameStatus::Playing,
                actual: record.status,
            });
        }
        let index = record
            .current_question_index
            .ok_or(GameError::NoActiveQuestion)?;

        let code = handle.code();
        if (index as usize) + 1 >= record.question_count() {
            handle.store().write(&paths::status(code), json!("ended")).await?;
            info!(%code, "last question done, game ended");
        } else {
            handle
                .store()
                .write(&paths::current_question_index(code), json!(index + 1))
                .await?;
            debug!(%code, index = index + 1, "advanced to next question");
        }
        self.pending = None;
        Ok(())
    }

    /// Reacts to a fresh players snapshot: when every connected player
    /// has answered the active question, resets their answered flags
    /// (one batch, so no one observes a partial reset) and schedules
    /// the delayed advance. Returns `true` if an advance was just
    /// scheduled.
    ///
    /// Idempotent per question: repeated snapshots of the same
    /// all-answered state schedule nothing further.
    pub async fn check_quorum(
        &mut self,
        handle: &SessionHandle,
        advance_tx: &UnboundedSender<()>,
    ) -> Result<bool, GameError> {
        handle.require_host()?;
        let record = handle.read_record().await?;
        if record.status != GameStatus::Playing {
            return Ok(false);
        }
        let Some(index) = record.current_question_index else {
            return Ok(false);
        };
        if self.advance_scheduled_for == Some(index) || !record.all_answered() {
            return Ok(false);
        }

        let code = handle.code();
        let changes = record
            .players
            .keys()
            .map(|id| (paths::player_has_answered(code, id), json!(false)))
            .collect();
        handle.store().update(changes).await?;

        self.advance_scheduled_for = Some(index);
        self.pending = Some(AdvanceDelay::schedule(
            self.config.advance_delay,
            advance_tx.clone(),
        ));
        debug!(%code, index, "quorum reached, advance scheduled");
        Ok(true)
    }

    /// Resets an ended game back to the lobby for a rematch: scores,
    /// counters, flags and characters zeroed, questions cleared,
    /// status back to `waiting`. Names, roles and presence survive.
    pub async fn reset(&mut self, handle: &SessionHandle) -> Result<(), GameError> {
        handle.require_host()?;
        let record = handle.read_record().await?;
        if record.status != GameStatus::Ended {
            return Err(GameError::WrongStatus {
                expected: GameStatus::Ended,
                actual: record.status,
            });
        }

        let code = handle.code();
        let mut changes = vec![
            (paths::status(code), json!("waiting")),
            (paths::questions(code), json!(null)),
            (paths::current_question_index(code), json!(null)),
            (paths::started_at(code), json!(null)),
        ];
        for id in record.players.keys() {
            changes.push((paths::player_score(code, id), json!(0)));
            changes.push((paths::player_correct_answers(code, id), json!(0)));
            changes.push((paths::player_has_answered(code, id), json!(false)));
            changes.push((paths::player_character(code, id), json!("")));
        }
        handle.store().update(changes).await?;

        self.advance_scheduled_for = None;
        self.pending = None;
        info!(%code, "session reset to lobby");
        Ok(())
    }

    /// Drops any scheduled advance without firing it. Called when the
    /// game ends out from under the controller (host hook, cancel).
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }
}
