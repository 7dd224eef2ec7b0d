//! Ranking: turning a session record into a scoreboard.

use std::collections::HashMap;

use quizsync_protocol::{ClientId, Player, SessionRecord};

/// One scoreboard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub client_id: ClientId,
    pub name: String,
    pub character_id: String,
    pub score: u32,
    pub correct_answers: u32,
}

/// Ranks the connected players, best first.
///
/// Ties break by join order: `joined_at` comes from the store's
/// strictly monotonic clock, so two equal scores rank the earlier
/// joiner higher. Disconnected players keep their stored score but
/// are left off the board.
pub fn rank(record: &SessionRecord) -> Vec<ScoreRow> {
    rank_players(&record.players)
}

/// Same ranking from a bare player map, as delivered by a watch on
/// the `players` subtree.
pub fn rank_players(players: &HashMap<ClientId, Player>) -> Vec<ScoreRow> {
    let mut players: Vec<_> = players.iter().filter(|(_, p)| p.connected).collect();
    players.sort_by_key(|(_, p)| p.joined_at);
    // Stable sort preserves the join order among equal scores.
    players.sort_by(|(_, a), (_, b)| b.score.cmp(&a.score));
    players
        .into_iter()
        .map(|(id, p)| ScoreRow {
            client_id: id.clone(),
            name: p.name.clone(),
            character_id: p.character_id.clone(),
            score: p.score,
            correct_answers: p.correct_answers,
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use quizsync_protocol::{
        Difficulty, GameSettings, GameStatus, Player, SessionCode,
    };

    fn player(score: u32, joined_at: i64, connected: bool) -> Player {
        Player {
            name: format!("p{joined_at}"),
            character_id: String::new(),
            score,
            correct_answers: 0,
            is_host: false,
            connected,
            has_answered: false,
            joined_at,
        }
    }

    fn record(players: Vec<(&str, Player)>) -> SessionRecord {
        SessionRecord {
            code: SessionCode::parse("ABC234").unwrap(),
            host_id: ClientId("host".into()),
            status: GameStatus::Ended,
            settings: GameSettings {
                question_set: "general".into(),
                difficulty: Difficulty::Easy,
            },
            questions: None,
            current_question_index: None,
            created_at: 0,
            started_at: None,
            players: players
                .into_iter()
                .map(|(id, p)| (ClientId(id.into()), p))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let r = record(vec![
            ("a", player(100, 1, true)),
            ("b", player(300, 2, true)),
            ("c", player(200, 3, true)),
        ]);
        let rows = rank(&r);
        let scores: Vec<u32> = rows.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
    }

    #[test]
    fn test_rank_breaks_ties_by_join_order() {
        let r = record(vec![
            ("late", player(200, 50, true)),
            ("early", player(200, 10, true)),
        ]);
        let rows = rank(&r);
        assert_eq!(rows[0].client_id, ClientId("early".into()));
        assert_eq!(rows[1].client_id, ClientId("late".into()));
    }

    #[test]
    fn test_rank_excludes_disconnected_players() {
        let r = record(vec![
            ("a", player(500, 1, false)),
            ("b", player(100, 2, true)),
        ]);
        let rows = rank(&r);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_id, ClientId("b".into()));
    }

    #[test]
    fn test_rank_empty_for_no_connected_players() {
        let r = record(vec![("a", player(500, 1, false))]);
        assert!(rank(&r).is_empty());
    }
}
