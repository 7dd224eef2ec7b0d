//! End-to-end games: multiple clients in one process sharing a store,
//! playing full games through the public client API only.
//!
//! Timers are shrunk so the suite runs in real time without waiting:
//! the question clock ticks normally (tests answer before the first
//! tick), and the between-question reveal is 50 ms.

use std::time::Duration;

use quizsync::SessionError;
use quizsync::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

/// Two questions sharing one answer, so assertions hold regardless of
/// the shuffle.
fn bank() -> QuestionBank {
    let mut bank = QuestionBank::new();
    bank.insert(
        "e2e",
        Difficulty::Easy,
        vec![
            Question {
                question: "first".into(),
                options: vec!["right".into(), "wrong".into()],
                answer: "right".into(),
            },
            Question {
                question: "second".into(),
                options: vec!["right".into(), "wrong".into()],
                answer: "right".into(),
            },
        ],
    );
    bank
}

fn settings() -> GameSettings {
    GameSettings {
        question_set: "e2e".into(),
        difficulty: Difficulty::Easy,
    }
}

fn config() -> QuizConfig {
    QuizConfig {
        progression: ProgressionConfig {
            min_players: 2,
            advance_delay: Duration::from_millis(50),
        },
        countdown: CountdownConfig::default(),
    }
}

fn client(store: &StoreHandle) -> QuizClient {
    QuizClient::new(store.clone())
        .with_bank(bank())
        .with_config(config())
}

/// Waits (bounded) for the first event matching `pred`, discarding
/// everything before it.
async fn wait_for(
    session: &mut GameSession,
    what: &str,
    pred: impl Fn(&GameEvent) -> bool,
) -> GameEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match session.next_event().await {
                Some(ev) if pred(&ev) => return ev,
                Some(_) => {}
                None => panic!("session closed while waiting for {what}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

async fn wait_for_question(session: &mut GameSession, expect_index: u32) {
    let ev = wait_for(session, "question", |ev| {
        matches!(ev, GameEvent::QuestionPresented { .. })
    })
    .await;
    match ev {
        GameEvent::QuestionPresented { index, total, .. } => {
            assert_eq!(index, expect_index);
            assert_eq!(total, 2);
        }
        _ => unreachable!(),
    }
}

// =========================================================================
// The full happy path
// =========================================================================

#[tokio::test]
async fn test_full_game_two_clients() {
    let store = SharedStore::spawn();
    let mut host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    assert!(host.is_host());

    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();
    assert!(!joiner.is_host());

    // The host sees the lobby fill up.
    wait_for(&mut host, "two players", |ev| {
        matches!(ev, GameEvent::PlayersChanged { scoreboard } if scoreboard.len() == 2)
    })
    .await;

    // Start: both clients enter character select.
    host.start().await.unwrap();
    wait_for(&mut host, "character select", |ev| {
        matches!(ev, GameEvent::CharacterSelectStarted)
    })
    .await;
    wait_for(&mut joiner, "character select", |ev| {
        matches!(ev, GameEvent::CharacterSelectStarted)
    })
    .await;

    // Both pick; the quiz begins for both with question 0.
    host.choose_character("wizard").await.unwrap();
    joiner.choose_character("robot").await.unwrap();
    wait_for(&mut host, "quiz start", |ev| {
        matches!(ev, GameEvent::QuizStarted)
    })
    .await;
    wait_for(&mut joiner, "quiz start", |ev| {
        matches!(ev, GameEvent::QuizStarted)
    })
    .await;
    wait_for_question(&mut host, 0).await;
    wait_for_question(&mut joiner, 0).await;

    // Question 1: both answer correctly with a full clock.
    assert!(host.answer("right").await.unwrap());
    assert!(joiner.answer("right").await.unwrap());

    // Quorum reached: after the reveal pause, question 2 appears.
    wait_for_question(&mut host, 1).await;
    wait_for_question(&mut joiner, 1).await;

    // Question 2: the joiner misses, the host scores.
    assert!(host.answer("right").await.unwrap());
    assert!(!joiner.answer("wrong").await.unwrap());

    // Game over, standings on both sides.
    let host_end = wait_for(&mut host, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
    let GameEvent::GameEnded { ranking } = host_end else {
        unreachable!()
    };
    assert_eq!(ranking.len(), 2);
    // Full clock both times: 100 + 10×10 per correct answer.
    assert_eq!(ranking[0].client_id, *host.client_id());
    assert_eq!(ranking[0].score, 400);
    assert_eq!(ranking[0].character_id, "wizard");
    assert_eq!(ranking[1].score, 200);

    let joiner_end = wait_for(&mut joiner, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
    let GameEvent::GameEnded { ranking } = joiner_end else {
        unreachable!()
    };
    assert_eq!(ranking[0].score, 400, "both clients see the same standings");

    // Rematch: scores zeroed, back to the lobby on both sides. The
    // lobby and player events land in either order, so each client
    // waits for just one of them.
    host.reset().await.unwrap();
    wait_for(&mut host, "zeroed scores", |ev| {
        matches!(ev, GameEvent::PlayersChanged { scoreboard }
            if scoreboard.len() == 2 && scoreboard.iter().all(|r| r.score == 0))
    })
    .await;
    wait_for(&mut joiner, "lobby", |ev| {
        matches!(ev, GameEvent::ReturnedToLobby)
    })
    .await;

    // The joiner bows out; the host sees them go.
    joiner.leave().await.unwrap();
    wait_for(&mut host, "one player", |ev| {
        matches!(ev, GameEvent::PlayersChanged { scoreboard } if scoreboard.len() == 1)
    })
    .await;
}

// =========================================================================
// Ties
// =========================================================================

#[tokio::test]
async fn test_tied_scores_rank_by_join_order() {
    let store = SharedStore::spawn();
    let mut host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.start().await.unwrap();
    host.choose_character("a").await.unwrap();
    joiner.choose_character("b").await.unwrap();
    wait_for_question(&mut host, 0).await;
    wait_for_question(&mut joiner, 0).await;

    for expect in [1u32, 2] {
        host.answer("right").await.unwrap();
        joiner.answer("right").await.unwrap();
        if expect < 2 {
            wait_for_question(&mut host, expect).await;
            wait_for_question(&mut joiner, expect).await;
        }
    }

    let end = wait_for(&mut joiner, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
    let GameEvent::GameEnded { ranking } = end else {
        unreachable!()
    };
    assert_eq!(ranking[0].score, ranking[1].score);
    // Equal scores: the earlier joiner (the host) ranks first.
    assert_eq!(ranking[0].client_id, *host.client_id());
}

// =========================================================================
// Timeouts
// =========================================================================

#[tokio::test]
async fn test_unanswered_question_times_out_and_advances() {
    let store = SharedStore::spawn();
    let fast = QuizConfig {
        progression: ProgressionConfig {
            min_players: 2,
            advance_delay: Duration::from_millis(50),
        },
        countdown: CountdownConfig {
            total_secs: 1,
            tick_interval: Duration::from_millis(20),
        },
    };
    let make = |store: &StoreHandle| {
        QuizClient::new(store.clone())
            .with_bank(bank())
            .with_config(fast.clone())
    };
    let mut host = make(&store).create_game("Alice", settings()).await.unwrap();
    let mut joiner = make(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.start().await.unwrap();
    host.choose_character("a").await.unwrap();
    joiner.choose_character("b").await.unwrap();
    wait_for_question(&mut host, 0).await;
    wait_for_question(&mut joiner, 0).await;

    // Nobody answers. Both time out, which satisfies the quorum and
    // moves the game along without any scores.
    wait_for(&mut host, "timeout", |ev| matches!(ev, GameEvent::TimedOut)).await;
    wait_for(&mut joiner, "timeout", |ev| matches!(ev, GameEvent::TimedOut)).await;
    wait_for_question(&mut host, 1).await;
    wait_for_question(&mut joiner, 1).await;
    wait_for(&mut host, "second timeout", |ev| {
        matches!(ev, GameEvent::TimedOut)
    })
    .await;

    let end = wait_for(&mut host, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
    let GameEvent::GameEnded { ranking } = end else {
        unreachable!()
    };
    assert!(ranking.iter().all(|r| r.score == 0));
}

#[tokio::test]
async fn test_answer_stops_the_question_clock() {
    let store = SharedStore::spawn();
    let fast = QuizConfig {
        progression: ProgressionConfig {
            min_players: 2,
            advance_delay: Duration::from_millis(50),
        },
        countdown: CountdownConfig {
            total_secs: 5,
            tick_interval: Duration::from_millis(20),
        },
    };
    let make = |store: &StoreHandle| {
        QuizClient::new(store.clone())
            .with_bank(bank())
            .with_config(fast.clone())
    };
    let mut host = make(&store).create_game("Alice", settings()).await.unwrap();
    let mut joiner = make(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.start().await.unwrap();
    host.choose_character("a").await.unwrap();
    joiner.choose_character("b").await.unwrap();
    wait_for_question(&mut host, 0).await;
    wait_for_question(&mut joiner, 0).await;

    assert!(host.answer("right").await.unwrap());

    // The joiner never answers; its timeout satisfies the quorum.
    // Between the answer and the next question the host's clock must
    // stay silent: no tick below the full window, no timeout. A live
    // countdown would tick every 20 ms, far inside the joiner's
    // 100 ms window plus the 50 ms reveal.
    let next = wait_for(&mut host, "next question", |ev| {
        matches!(
            ev,
            GameEvent::QuestionPresented { .. } | GameEvent::TimedOut
        ) || matches!(ev, GameEvent::TimerTick { remaining } if *remaining < 5)
    })
    .await;
    assert!(
        matches!(next, GameEvent::QuestionPresented { index: 1, .. }),
        "clock kept running after the answer: {next:?}"
    );
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_player_abandoning_mid_question_unblocks_quorum() {
    let store = SharedStore::spawn();
    let mut host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.start().await.unwrap();
    host.choose_character("a").await.unwrap();
    joiner.choose_character("b").await.unwrap();
    wait_for_question(&mut host, 0).await;
    wait_for_question(&mut joiner, 0).await;

    // The host answers; the joiner's network dies instead of
    // answering. The quorum shrinks to the connected players, so the
    // game advances anyway.
    host.answer("right").await.unwrap();
    joiner.abandon();

    wait_for_question(&mut host, 1).await;
    host.answer("right").await.unwrap();

    let end = wait_for(&mut host, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
    let GameEvent::GameEnded { ranking } = end else {
        unreachable!()
    };
    // The disconnected player keeps their entry but leaves the board.
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].client_id, *host.client_id());
}

#[tokio::test]
async fn test_host_abandoning_ends_game_for_players() {
    let store = SharedStore::spawn();
    let host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.abandon();

    // The host's presence hook flips status to ended; the joiner sees
    // the game end rather than hanging in the lobby.
    wait_for(&mut joiner, "game end", |ev| {
        matches!(ev, GameEvent::GameEnded { .. })
    })
    .await;
}

#[tokio::test]
async fn test_host_leaving_closes_session_for_players() {
    let store = SharedStore::spawn();
    let host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    // A graceful host departure removes the record outright.
    host.leave().await.unwrap();

    wait_for(&mut joiner, "session closed", |ev| {
        matches!(ev, GameEvent::SessionClosed)
    })
    .await;
    // The session task is gone; commands fail cleanly.
    assert!(matches!(
        joiner.answer("right").await,
        Err(QuizError::Disconnected)
    ));
}

// =========================================================================
// Join errors through the facade
// =========================================================================

#[tokio::test]
async fn test_join_after_start_is_refused() {
    let store = SharedStore::spawn();
    let mut host = client(&store)
        .create_game("Alice", settings())
        .await
        .unwrap();
    let mut joiner = client(&store)
        .join_game("Bob", host.code().as_str())
        .await
        .unwrap();

    host.start().await.unwrap();
    wait_for(&mut joiner, "character select", |ev| {
        matches!(ev, GameEvent::CharacterSelectStarted)
    })
    .await;

    let late = client(&store)
        .join_game("Carol", host.code().as_str())
        .await;
    assert!(matches!(
        late,
        Err(QuizError::Session(SessionError::SessionNotJoinable { .. }))
    ));
}
