//! Score submitted quiz answers

use super::QuizQuestion;
use serde::Serialize;

/// Outcome for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// 1-based, as shown to students ("Q1")
    pub number: usize,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
}

/// Graded quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizReport {
    pub correct: usize,
    pub total: usize,
    /// Percentage, 0 for an empty quiz
    pub score: f64,
    pub results: Vec<QuestionResult>,
}

/// Grade selected option indices against the quiz.
///
/// Missing or out-of-range selections count as wrong. Questions whose answer
/// could not be resolved to an option are compared by text.
pub fn grade(quiz: &[QuizQuestion], selections: &[Option<usize>]) -> QuizReport {
    let results: Vec<QuestionResult> = quiz
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let selected = selections
                .get(i)
                .copied()
                .flatten()
                .filter(|&s| s < question.options.len());
            let your_answer = selected.and_then(|s| question.options.get(s)).cloned();

            let correct = match (question.answer_index, selected) {
                (Some(expected), Some(chosen)) => expected == chosen,
                (None, _) => your_answer
                    .as_deref()
                    .is_some_and(|a| a.trim() == question.correct_answer.trim()),
                (Some(_), None) => false,
            };

            QuestionResult {
                number: i + 1,
                your_answer,
                correct_answer: question.correct_answer.clone(),
                correct,
            }
        })
        .collect();

    let total = results.len();
    let correct = results.iter().filter(|r| r.correct).count();
    let score = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    QuizReport {
        correct,
        total,
        score,
        results,
    }
}
