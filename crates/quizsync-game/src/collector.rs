//! Per-player actions during a question: answering, timing out,
//! picking a character.
//!
//! Every client calls these for itself only; each function writes a
//! single batch keyed by the calling handle's identity, so no client
//! ever touches another player's fields.

use serde_json::json;
use tracing::debug;

use quizsync_protocol::{GameStatus, paths};
use quizsync_session::SessionHandle;
use quizsync_store::ServerValue;

use crate::GameError;

/// Base points for a correct answer.
pub const BASE_POINTS: u32 = 100;
/// Extra points per second left on the clock.
pub const SPEED_BONUS_PER_SEC: u32 = 10;

/// Submits this client's answer for the active question. Returns
/// whether it was correct.
///
/// Scoring is `100 + 10 × seconds_remaining` for a correct answer,
/// nothing otherwise. The answered flag, score and correct-answer
/// count land in one atomic batch; the host's quorum check never sees
/// the flag without the score.
///
/// Score changes go through server-side increments, so two clients
/// scoring in the same instant both count.
pub async fn submit_answer(
    handle: &SessionHandle,
    selected: &str,
    seconds_remaining: u32,
) -> Result<bool, GameError> {
    let record = handle.read_record().await?;
    if record.status != GameStatus::Playing {
        return Err(GameError::WrongStatus {
            expected: GameStatus::Playing,
            actual: record.status,
        });
    }
    let question = record
        .current_question_index
        .and_then(|i| record.questions.as_ref()?.get(i as usize))
        .ok_or(GameError::NoActiveQuestion)?;

    let correct = question.answer == selected;
    let code = handle.code();
    let id = handle.client_id();
    let mut changes = vec![(paths::player_has_answered(code, id), json!(true))];
    if correct {
        let points = BASE_POINTS + SPEED_BONUS_PER_SEC * seconds_remaining;
        changes.push((
            paths::player_score(code, id),
            ServerValue::increment(points as i64),
        ));
        changes.push((
            paths::player_correct_answers(code, id),
            ServerValue::increment(1),
        ));
    }
    handle.store().update(changes).await?;

    debug!(%code, %id, correct, seconds_remaining, "answer submitted");
    Ok(correct)
}

/// Marks this client as answered without scoring — the countdown ran
/// out. A no-op if the game is no longer playing (the clock can
/// expire right as the game ends).
pub async fn mark_timed_out(handle: &SessionHandle) -> Result<(), GameError> {
    let record = handle.read_record().await?;
    if record.status != GameStatus::Playing {
        return Ok(());
    }
    let code = handle.code();
    let id = handle.client_id();
    handle
        .store()
        .write(&paths::player_has_answered(code, id), json!(true))
        .await?;
    debug!(%code, %id, "question timed out without an answer");
    Ok(())
}

/// Records this client's character pick for the game that just
/// started. The quiz proper begins once every connected player has
/// picked.
pub async fn choose_character(
    handle: &SessionHandle,
    character_id: &str,
) -> Result<(), GameError> {
    let record = handle.read_record().await?;
    if record.status != GameStatus::Playing {
        return Err(GameError::WrongStatus {
            expected: GameStatus::Playing,
            actual: record.status,
        });
    }
    let code = handle.code();
    let id = handle.client_id();
    handle
        .store()
        .write(&paths::player_character(code, id), json!(character_id))
        .await?;
    debug!(%code, %id, character_id, "character chosen");
    Ok(())
}
