//! Store path layout for session records.
//!
//! Every path the protocol addresses has a helper here; the path
//! strings appear nowhere else. Layout:
//!
//! ```text
//! games/{CODE}
//!   status, settings, questions, currentQuestionIndex, startedAt
//!   players/{identity}
//!     connected, characterId, score, correctAnswers, hasAnswered
//! ```

use crate::{ClientId, SessionCode};

/// Root of one session record.
pub fn game(code: &SessionCode) -> String {
    format!("games/{code}")
}

pub fn status(code: &SessionCode) -> String {
    format!("games/{code}/status")
}

pub fn questions(code: &SessionCode) -> String {
    format!("games/{code}/questions")
}

pub fn current_question_index(code: &SessionCode) -> String {
    format!("games/{code}/currentQuestionIndex")
}

pub fn started_at(code: &SessionCode) -> String {
    format!("games/{code}/startedAt")
}

/// The whole player map.
pub fn players(code: &SessionCode) -> String {
    format!("games/{code}/players")
}

pub fn player(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}")
}

pub fn player_connected(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}/connected")
}

pub fn player_character(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}/characterId")
}

pub fn player_score(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}/score")
}

pub fn player_correct_answers(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}/correctAnswers")
}

pub fn player_has_answered(code: &SessionCode, id: &ClientId) -> String {
    format!("games/{code}/players/{id}/hasAnswered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_tree_layout() {
        let code = SessionCode::parse("ABC234").unwrap();
        let id = ClientId("u1".into());
        assert_eq!(game(&code), "games/ABC234");
        assert_eq!(status(&code), "games/ABC234/status");
        assert_eq!(player(&code, &id), "games/ABC234/players/u1");
        assert_eq!(
            player_has_answered(&code, &id),
            "games/ABC234/players/u1/hasAnswered"
        );
    }
}
