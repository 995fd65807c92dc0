//! Quiz generation, grading and assignment review

mod grading;
mod parser;

pub use grading::{grade, QuizReport};
pub use parser::parse_quiz;

use crate::llm::{LlmError, LlmRequest, LlmService};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const QUESTIONS_PER_QUIZ: usize = 10;
const REVIEW_PREFIX: &str = "Check the following answers and provide feedback: ";

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Please enter {0}.")]
    MissingInput(&'static str),
    #[error("The model's reply did not contain any questions in the expected format.")]
    NoQuestions,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// School grade, "Grade 1" through "Grade 12"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Grade(u8);

impl Grade {
    pub fn new(level: u8) -> Option<Self> {
        (1..=12).contains(&level).then_some(Self(level))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade {}", self.0)
    }
}

impl TryFrom<String> for Grade {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let number = trimmed
            .strip_prefix("Grade")
            .or_else(|| trimmed.strip_prefix("grade"))
            .unwrap_or(trimmed)
            .trim();
        number
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("Unknown grade level: {value}"))
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Answer as the model wrote it
    pub correct_answer: String,
    /// Position of the answer among `options`, when it could be located
    #[serde(default)]
    pub answer_index: Option<usize>,
}

/// Ask the model for a quiz and parse its reply.
pub async fn generate_quiz(
    llm: &dyn LlmService,
    topic: &str,
    grade: Grade,
) -> Result<Vec<QuizQuestion>, QuizError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(QuizError::MissingInput("a topic"));
    }

    let prompt = format!(
        "Generate {QUESTIONS_PER_QUIZ} quiz questions for {grade} students on the topic {topic} with 4 options and correct answer"
    );
    let response = llm.complete(&LlmRequest::prompt(prompt)).await?;

    let quiz = parse_quiz(&response.text);
    tracing::info!(%grade, questions = quiz.len(), "Quiz generated");
    if quiz.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    Ok(quiz)
}

/// A question with the student's written answer
#[derive(Debug, Clone, Deserialize)]
pub struct WrittenAnswer {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Ask the model for feedback on written answers.
pub async fn review_answers(
    llm: &dyn LlmService,
    answers: &[WrittenAnswer],
) -> Result<String, QuizError> {
    if answers.iter().all(|a| a.answer.trim().is_empty()) {
        return Err(QuizError::MissingInput("at least one answer"));
    }

    let sheet = answers
        .iter()
        .enumerate()
        .map(|(i, a)| format!("Q{}: {}\nAnswer: {}", i + 1, a.question.trim(), a.answer.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");

    let response = llm
        .complete(&LlmRequest::prompt(format!("{REVIEW_PREFIX}{sheet}")))
        .await?;
    Ok(response.text)
}
