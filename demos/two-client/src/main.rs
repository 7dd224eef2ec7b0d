//! Two clients playing a full game against each other in one process.
//!
//! Alice hosts and always answers correctly; Bob joins and guesses at
//! random. Run with `RUST_LOG=debug` to watch the store traffic.

use rand::Rng;

use quizsync::prelude::*;

#[tokio::main]
async fn main() -> Result<(), QuizError> {
    quizsync::init_tracing();

    let store = SharedStore::spawn();

    let alice = QuizClient::new(store.clone());
    let hosted = alice
        .create_game(
            "Alice",
            GameSettings {
                question_set: "general".into(),
                difficulty: Difficulty::Medium,
            },
        )
        .await?;
    println!("Alice opened session {}", hosted.code());

    let bob = QuizClient::new(store.clone());
    let joined = bob.join_game("Bob", hosted.code().as_str()).await?;
    println!("Bob joined {}", joined.code());

    let host_task = tokio::spawn(play(hosted, "wizard", true));
    let joiner_task = tokio::spawn(play(joined, "robot", false));
    host_task.await.expect("host task panicked")?;
    joiner_task.await.expect("joiner task panicked")?;
    Ok(())
}

/// Plays one full game, reacting to session events until it ends.
/// The driver (the host) starts the game once the lobby holds two
/// players and always picks the right answer; everyone else guesses.
async fn play(
    mut session: GameSession,
    character: &'static str,
    driver: bool,
) -> Result<(), QuizError> {
    let me = session.client_id().clone();
    let mut started = false;

    while let Some(event) = session.next_event().await {
        match event {
            GameEvent::PlayersChanged { scoreboard } => {
                if driver && !started && scoreboard.len() >= 2 {
                    session.start().await?;
                    started = true;
                    println!("[{me}] started the game");
                }
            }
            GameEvent::CharacterSelectStarted => {
                session.choose_character(character).await?;
                println!("[{me}] picked the {character}");
            }
            GameEvent::QuestionPresented {
                index,
                total,
                question,
            } => {
                println!("[{me}] Q{}/{}: {}", index + 1, total, question.question);
                let pick = if driver {
                    question.answer.clone()
                } else {
                    let i = rand::rng().random_range(0..question.options.len());
                    question.options[i].clone()
                };
                match session.answer(&pick).await {
                    Ok(correct) => println!(
                        "[{me}] answered {pick:?} — {}",
                        if correct { "correct!" } else { "wrong" }
                    ),
                    Err(e) => eprintln!("[{me}] answer failed: {e}"),
                }
            }
            GameEvent::TimedOut => println!("[{me}] out of time"),
            GameEvent::GameEnded { ranking } => {
                println!("[{me}] final standings:");
                for (place, row) in ranking.iter().enumerate() {
                    println!(
                        "[{me}]   {}. {} ({}) — {} pts, {} correct",
                        place + 1,
                        row.name,
                        row.character_id,
                        row.score,
                        row.correct_answers
                    );
                }
                break;
            }
            GameEvent::SessionClosed => {
                println!("[{me}] session closed");
                return Ok(());
            }
            GameEvent::Error(e) => eprintln!("[{me}] error: {e}"),
            _ => {}
        }
    }

    // Results are in; bow out. The joiner may find the session
    // already gone if the host tore it down first.
    let _ = session.leave().await;
    Ok(())
}
