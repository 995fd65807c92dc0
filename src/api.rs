//! HTTP API and embedded UI

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::conversation::{ChatSession, TurnProcessor};
use crate::llm::LlmService;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<TurnProcessor>,
    pub llm: Arc<dyn LlmService>,
    /// Free chat context, separate from the voice assistant and never persisted
    pub bot_chat: Arc<Mutex<ChatSession>>,
}

impl AppState {
    pub fn new(conversation: TurnProcessor, llm: Arc<dyn LlmService>) -> Self {
        Self {
            conversation: Arc::new(conversation),
            llm,
            bot_chat: Arc::new(Mutex::new(ChatSession::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::llm::testing::MockLlmService;
    use crate::llm::LlmError;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(llm: &Arc<MockLlmService>) -> (Database, Router) {
        let db = Database::open_in_memory().unwrap();
        let llm: Arc<dyn LlmService> = llm.clone();
        let processor = TurnProcessor::new(db.clone(), llm.clone()).unwrap();
        (db, create_router(AppState::new(processor, llm)))
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_conversation_scenario() {
        let llm = Arc::new(MockLlmService::new());
        llm.queue_text("Hi! I'm happy to help.");
        let (db, app) = app(&llm);

        let (status, body) = post(&app, "/api/conversation/turns", json!({"text": "hi"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turn"]["speaker"], "User");

        let (_, body) = get(&app, "/api/conversation").await;
        assert_eq!(body["turns"].as_array().unwrap().len(), 1);
        assert_eq!(body["reply"]["type"], "awaiting_reply");
        assert_eq!(body["status"], "active");

        let (status, body) = post(&app, "/api/conversation/process", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turn"]["text"], "Hi! I'm happy to help.");
        assert_eq!(db.load_turns().unwrap().len(), 2);

        let (status, _) = post(&app, "/api/conversation/reset", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(db.load_turns().unwrap().is_empty());

        let (status, body) = post(&app, "/api/conversation/ask", json!({"text": "again"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Conversation has ended"));
    }

    #[tokio::test]
    async fn test_blank_question_returns_prompt() {
        let llm = Arc::new(MockLlmService::new());
        let (db, app) = app(&llm);

        let (status, body) = post(&app, "/api/conversation/ask", json!({"text": ""})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Please ask something.");
        assert!(body["turn"].is_null());

        let (_, body) = post(&app, "/api/conversation/turns", json!({"text": "  "})).await;
        assert_eq!(body["message"], "Please ask something.");

        assert!(db.load_turns().unwrap().is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_bad_gateway() {
        let llm = Arc::new(MockLlmService::new());
        llm.queue_error(LlmError::auth("GOOGLE_API_KEY is not set"));
        let (_db, app) = app(&llm);

        let (status, body) = post(&app, "/api/conversation/ask", json!({"text": "hello"})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "GOOGLE_API_KEY is not set");
    }

    #[tokio::test]
    async fn test_free_chat_keeps_history() {
        let llm = Arc::new(MockLlmService::new());
        llm.queue_text("Photosynthesis makes food from light.");
        let (db, app) = app(&llm);

        let (status, body) = post(&app, "/api/chat", json!({"text": "What is photosynthesis?"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Photosynthesis makes food from light.");
        assert_eq!(body["history"].as_array().unwrap().len(), 2);
        // Free chat never touches the conversation log
        assert!(db.load_turns().unwrap().is_empty());

        let (status, _) = post(&app, "/api/chat", json!({"text": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_quiz_generate_and_grade() {
        let llm = Arc::new(MockLlmService::new());
        llm.queue_text(
            "1. 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\nCorrect answer: B) 4\n\n\
             2. 3*3?\nA) 6\nB) 8\nC) 9\nD) 12\nCorrect answer: C",
        );
        let (_db, app) = app(&llm);

        let (status, body) = post(&app, "/api/quiz", json!({"topic": "arithmetic", "grade": "Grade 3"})).await;
        assert_eq!(status, StatusCode::OK);
        let questions = body["questions"].clone();
        assert_eq!(questions.as_array().unwrap().len(), 2);

        let (status, report) = post(
            &app,
            "/api/quiz/grade",
            json!({"questions": questions, "answers": [1, 0]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["correct"], 1);
        assert_eq!(report["total"], 2);
        assert_eq!(report["score"], 50.0);
    }

    #[tokio::test]
    async fn test_quiz_rejects_bad_input() {
        let llm = Arc::new(MockLlmService::new());
        let (_db, app) = app(&llm);

        let (status, _) = post(&app, "/api/quiz", json!({"topic": "", "grade": "Grade 3"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app, "/api/quiz", json!({"topic": "maps", "grade": "Grade 15"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_assignment_review() {
        let llm = Arc::new(MockLlmService::new());
        llm.queue_text("Nice answers.");
        let (_db, app) = app(&llm);

        let (status, body) = post(
            &app,
            "/api/assignments/review",
            json!({"answers": [{"question": "Why is the sky blue?", "answer": "Light scatters."}]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"], "Nice answers.");
    }

    #[tokio::test]
    async fn test_assets_refuse_absolute_paths() {
        let llm = Arc::new(MockLlmService::new());
        let (_db, app) = app(&llm);

        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("secret.txt");
        std::fs::write(&secret, "TOPSECRET").unwrap();

        let uri = format!("/assets/{}", secret.display());
        assert!(uri.starts_with("/assets//"));
        let response = app
            .clone()
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains("TOPSECRET"));

        let response = app
            .oneshot(Request::get("/assets/../Cargo.toml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_and_version() {
        let llm = Arc::new(MockLlmService::new());
        let (_db, app) = app(&llm);

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("adaptive-learning "));
    }
}
