//! HTTP endpoints next to the WebSocket: liveness and poll history.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::ws;

/// Build the full application router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/previous-polls", get(previous_polls))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
pub async fn root() -> &'static str {
    "Server is running"
}

/// List every finished poll with its final results.
///
/// GET /previous-polls
pub async fn previous_polls(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_all().await {
        Ok(polls) => Json(polls).into_response(),
        Err(e) => {
            tracing::error!("Failed to load previous polls: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load previous polls" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::store::{PollStore, StoreError};
    use crate::types::{PercentageResult, PollRecord, Question};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct BrokenStore;

    #[async_trait]
    impl PollStore for BrokenStore {
        async fn save(&self, _record: PollRecord) -> Result<(), StoreError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn list_all(&self) -> Result<Vec<PollRecord>, StoreError> {
            Err(std::io::Error::other("disk gone").into())
        }
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_is_alive() {
        let (status, body) = fetch(app(Arc::new(AppState::default())), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Server is running");
    }

    #[tokio::test]
    async fn test_previous_polls_lists_saved() {
        let state = Arc::new(AppState::default());
        let question = Question {
            text: "Color?".to_string(),
            options: vec!["Red".to_string(), "Blue".to_string()],
            duration: Some(1000),
        };
        let results = PercentageResult::new(vec![
            ("Red".to_string(), 100.0),
            ("Blue".to_string(), 0.0),
        ]);
        state
            .store
            .save(PollRecord::from_closed(
                &question,
                std::time::Duration::from_millis(1000),
                chrono::Utc::now(),
                results,
            ))
            .await
            .unwrap();

        let (status, body) = fetch(app(state), "/previous-polls").await;
        assert_eq!(status, StatusCode::OK);

        let polls: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0]["question"], "Color?");
        assert_eq!(polls[0]["durationMs"], 1000);
        assert_eq!(polls[0]["results"]["Red"], 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_previous_polls_shows_results_after_close() {
        let state = Arc::new(AppState::default());
        let question = Question {
            text: "Color?".to_string(),
            options: vec!["Red".to_string(), "Blue".to_string()],
            duration: Some(1000),
        };
        state.ask_question(question).await;
        state.submit_answer("s1", "Red").await;
        state.submit_answer("s2", "Blue").await;

        let (_, body) = fetch(app(Arc::clone(&state)), "/previous-polls").await;
        assert_eq!(body, "[]");

        tokio::time::sleep(std::time::Duration::from_millis(1001)).await;
        let mut polls: Vec<serde_json::Value> = Vec::new();
        for _ in 0..50 {
            let (status, body) = fetch(app(Arc::clone(&state)), "/previous-polls").await;
            assert_eq!(status, StatusCode::OK);
            polls = serde_json::from_str(&body).unwrap();
            if !polls.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0]["options"], serde_json::json!(["Red", "Blue"]));
        assert_eq!(polls[0]["results"]["Red"], 50.0);
        assert_eq!(polls[0]["results"]["Blue"], 50.0);
    }

    #[tokio::test]
    async fn test_previous_polls_store_failure() {
        let state = Arc::new(AppState::new(ServerConfig::default(), Arc::new(BrokenStore)));

        let (status, body) = fetch(app(state), "/previous-polls").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(error["error"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_does_not_block_session() {
        let state = Arc::new(AppState::new(ServerConfig::default(), Arc::new(BrokenStore)));
        let (_id, mut rx) = state.router.connect().await;

        let question = Question {
            text: "Still live?".to_string(),
            options: vec!["Yes".to_string()],
            duration: Some(1000),
        };
        state.ask_question(question.clone()).await;
        assert_eq!(
            rx.recv().await,
            Some(crate::protocol::ServerMessage::NewQuestion(question.clone()))
        );

        tokio::time::sleep(std::time::Duration::from_millis(1001)).await;
        assert!(matches!(
            rx.recv().await,
            Some(crate::protocol::ServerMessage::UpdateResults(_))
        ));
        assert!(!state.session.read().await.is_open());

        // The failed save leaves the session ready for the next question
        assert!(matches!(
            state.ask_question(question).await,
            crate::state::OpenOutcome::Accepted { generation: 2 }
        ));
    }
}
