//! API request and response types

use crate::db::Turn;
use crate::llm::LlmMessage;
use crate::quiz::{Grade, QuizQuestion, WrittenAnswer};
use serde::{Deserialize, Serialize};

/// Request carrying one utterance or question
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

/// Response for a captured question
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    /// Absent when the text was blank
    pub turn: Option<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for processing the pending question
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// Absent when nothing was waiting for a reply
    pub turn: Option<Turn>,
}

/// Response for an ask (capture + reply)
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
    pub turn: Option<Turn>,
}

/// Response for the free chat panel
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub history: Vec<LlmMessage>,
}

/// Request to generate a quiz
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub topic: String,
    pub grade: Grade,
}

/// Generated quiz
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

/// Quiz plus the selected option index for each question
#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub answers: Vec<Option<usize>>,
}

/// Written answers to review
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub answers: Vec<WrittenAnswer>,
}

/// Model feedback on written answers
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub feedback: String,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
