//! The question bank: where the host's chosen set and difficulty
//! resolve to actual questions.

use std::collections::HashMap;

use quizsync_protocol::{Difficulty, Question};

use crate::GameError;

/// Questions grouped by set name and difficulty.
///
/// The bank lives on the host's side only; the shuffled selection is
/// published to the store at game start, so joined players never need
/// a bank of their own.
#[derive(Debug, Default, Clone)]
pub struct QuestionBank {
    sets: HashMap<String, HashMap<Difficulty, Vec<Question>>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds questions to a set at one difficulty, appending to any
    /// already present.
    pub fn insert(
        &mut self,
        set: impl Into<String>,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) {
        self.sets
            .entry(set.into())
            .or_default()
            .entry(difficulty)
            .or_default()
            .extend(questions);
    }

    /// Looks up the questions for a set and difficulty.
    ///
    /// # Errors
    /// [`GameError::QuestionSetNotFound`] if the set is unknown or
    /// empty at this difficulty — a game cannot start with zero
    /// questions.
    pub fn questions(
        &self,
        set: &str,
        difficulty: Difficulty,
    ) -> Result<&[Question], GameError> {
        match self.sets.get(set).and_then(|by_diff| by_diff.get(&difficulty)) {
            Some(qs) if !qs.is_empty() => Ok(qs),
            _ => Err(GameError::QuestionSetNotFound {
                set: set.to_string(),
                difficulty,
            }),
        }
    }

    /// A small built-in general-knowledge set, enough to run a demo
    /// game at any difficulty.
    pub fn sample() -> Self {
        fn q(question: &str, options: [&str; 4], answer: &str) -> Question {
            Question {
                question: question.to_string(),
                options: options.iter().map(|s| s.to_string()).collect(),
                answer: answer.to_string(),
            }
        }

        let mut bank = Self::new();
        bank.insert(
            "general",
            Difficulty::Easy,
            vec![
                q(
                    "Which planet is known as the Red Planet?",
                    ["Venus", "Mars", "Jupiter", "Mercury"],
                    "Mars",
                ),
                q(
                    "How many continents are there?",
                    ["five", "six", "seven", "eight"],
                    "seven",
                ),
                q(
                    "What is the largest ocean on Earth?",
                    ["Atlantic", "Indian", "Arctic", "Pacific"],
                    "Pacific",
                ),
            ],
        );
        bank.insert(
            "general",
            Difficulty::Medium,
            vec![
                q(
                    "Which element has the chemical symbol Fe?",
                    ["Fluorine", "Iron", "Lead", "Tin"],
                    "Iron",
                ),
                q(
                    "In which year did the Berlin Wall fall?",
                    ["1987", "1989", "1991", "1993"],
                    "1989",
                ),
                q(
                    "What is the longest river in the world?",
                    ["Amazon", "Nile", "Yangtze", "Mississippi"],
                    "Nile",
                ),
            ],
        );
        bank.insert(
            "general",
            Difficulty::Hard,
            vec![
                q(
                    "Which mathematician proved Fermat's Last Theorem?",
                    ["Euler", "Wiles", "Gauss", "Ramanujan"],
                    "Wiles",
                ),
                q(
                    "What is the capital of Kazakhstan?",
                    ["Almaty", "Tashkent", "Astana", "Bishkek"],
                    "Astana",
                ),
                q(
                    "Which particle carries the strong force?",
                    ["Photon", "Gluon", "W boson", "Graviton"],
                    "Gluon",
                ),
            ],
        );
        bank
    }
}

// =========================================================================
// Tests
// =========================================================================
