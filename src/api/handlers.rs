//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    AskResponse, CaptureResponse, ChatResponse, ErrorResponse, GradeRequest, ProcessResponse,
    QuizRequest, QuizResponse, ReviewRequest, ReviewResponse, SuccessResponse, TextRequest,
};
use super::AppState;
use crate::conversation::{ConversationError, ConversationSnapshot, Reply};
use crate::quiz::{self, QuizError, QuizReport};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the UI
        .route("/", get(serve_ui))
        .route("/assets/*path", get(serve_static))
        // Voice assistant conversation
        .route("/api/conversation", get(get_conversation))
        .route("/api/conversation/turns", post(capture_question))
        .route("/api/conversation/process", post(process_pending))
        .route("/api/conversation/ask", post(ask_question))
        .route("/api/conversation/reset", post(reset_conversation))
        // Free chat
        .route("/api/chat", post(send_chat))
        // Quizzes and assignments
        .route("/api/quiz", post(generate_quiz))
        .route("/api/quiz/grade", post(grade_quiz))
        .route("/api/assignments/review", post(review_assignment))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn serve_ui() -> Response {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Voice Assistant Conversation
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    Ok(Json(state.conversation.snapshot().await?))
}

async fn capture_question(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<CaptureResponse>, AppError> {
    let turn = state.conversation.capture(&req.text).await?;
    let message = turn
        .is_none()
        .then(|| Reply::Prompt.text().to_string());
    Ok(Json(CaptureResponse { turn, message }))
}

async fn process_pending(
    State(state): State<AppState>,
) -> Result<Json<ProcessResponse>, AppError> {
    let turn = state.conversation.process_pending().await?;
    Ok(Json(ProcessResponse { turn }))
}

async fn ask_question(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let reply = state.conversation.ask(&req.text).await?;
    let text = reply.text().to_string();
    let turn = match reply {
        Reply::Answered(turn) => Some(turn),
        Reply::Prompt => None,
    };
    Ok(Json(AskResponse { reply: text, turn }))
}

async fn reset_conversation(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.conversation.reset().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Free Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Please enter a question.".to_string()));
    }

    let mut chat = state.bot_chat.lock().await;
    let reply = chat
        .send(state.llm.as_ref(), text)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(ChatResponse {
        reply,
        history: chat.history().to_vec(),
    }))
}

// ============================================================
// Quizzes and Assignments
// ============================================================

async fn generate_quiz(
    State(state): State<AppState>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let questions = quiz::generate_quiz(state.llm.as_ref(), &req.topic, req.grade).await?;
    Ok(Json(QuizResponse { questions }))
}

async fn grade_quiz(Json(req): Json<GradeRequest>) -> Json<QuizReport> {
    Json(quiz::grade(&req.questions, &req.answers))
}

async fn review_assignment(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let feedback = quiz::review_answers(state.llm.as_ref(), &req.answers).await?;
    Ok(Json(ReviewResponse { feedback }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("adaptive-learning ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    /// The model or another collaborator failed; shown inline
    Upstream(String),
    Internal(String),
}

impl From<ConversationError> for AppError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::SessionEnded => AppError::Conflict(err.to_string()),
            ConversationError::Llm(e) => AppError::Upstream(e.to_string()),
            ConversationError::Db(e) => {
                tracing::error!(error = %e, "Conversation storage failed");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::MissingInput(_) => AppError::BadRequest(err.to_string()),
            QuizError::NoQuestions => AppError::Upstream(err.to_string()),
            QuizError::Llm(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
