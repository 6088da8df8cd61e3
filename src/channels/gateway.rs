//! HTTP Gateway
//!
//! Lets an external messenger bridge (a WhatsApp Web client, a webhook relay,
//! a test harness) drive the dispatcher over HTTP.
//!
//! Endpoints:
//! - POST /v1/messages            - Handle one inbound message, return replies
//! - GET  /v1/sessions/{chat_id}  - Inspect a chat session
//! - GET  /health                 - Liveness probe

use crate::bot::{Dispatcher, InboundMessage};
use crate::session::ChatSession;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared state for gateway handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Gateway error mapped to a status code and a JSON `{error}` body.
#[derive(Debug)]
pub enum GatewayError {
    /// Malformed or incomplete request.
    Validation(String),
    /// Unknown chat.
    NotFound(String),
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::Validation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            GatewayError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            GatewayError::NotFound(chat_id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("No session for chat '{chat_id}'"),
            ),
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub request_id: String,
    pub chat_id: String,
    pub replies: Vec<String>,
}

/// Build the gateway router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(post_message))
        .route("/v1/sessions/{chat_id}", get(get_session))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /v1/messages - Handle one inbound message.
async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<MessageResponse>, GatewayError> {
    let Json(msg) = payload?;
    if msg.chat_id.trim().is_empty() {
        return Err(GatewayError::Validation("chat_id must not be empty".to_string()));
    }

    let request_id = Uuid::new_v4().to_string();
    tracing::debug!(request_id, chat_id = %msg.chat_id, "Gateway message");

    let chat_id = msg.chat_id.clone();
    let replies = state.dispatcher.handle(msg).await;

    Ok(Json(MessageResponse {
        request_id,
        chat_id,
        replies,
    }))
}

/// GET /v1/sessions/{chat_id} - Session snapshot.
async fn get_session(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatSession>, GatewayError> {
    state
        .dispatcher
        .sessions()
        .snapshot(&chat_id)
        .map(Json)
        .ok_or(GatewayError::NotFound(chat_id))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "sessions": state.dispatcher.sessions().len(),
    }))
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(AppState { dispatcher }))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MessagesConfig, SecretString};
    use crate::provider::{GenerationResponse, MockGenerator};
    use serde_json::Value;

    async fn spawn_gateway(generator: MockGenerator) -> String {
        let mut config = Config::default();
        config.provider.endpoint = "https://g.test".to_string();
        config.provider.api_key = SecretString::new("k");
        let dispatcher = Arc::new(Dispatcher::from_config(&config, Arc::new(generator)).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(AppState { dispatcher }))
                .await
                .unwrap();
        });
        format!("http://{addr}")
    }

    fn echo_generator() -> MockGenerator {
        let mut generator = MockGenerator::new();
        generator.expect_has_credentials().return_const(true);
        generator
            .expect_generate()
            .returning(|_| Ok(GenerationResponse::text("respuesta generada")));
        generator
    }

    #[tokio::test]
    async fn test_post_message_returns_replies() {
        let base = spawn_gateway(echo_generator()).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/v1/messages"))
            .json(&json!({ "chat_id": "5491100000000", "body": "cuéntame algo", "sender_name": "Ana" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["chat_id"], "5491100000000");
        let replies = body["replies"].as_array().unwrap();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].as_str().unwrap().contains("Ana"));
        assert_eq!(replies[1], "respuesta generada");
        assert!(!body["request_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_snapshot_after_message() {
        let base = spawn_gateway(echo_generator()).await;
        let client = reqwest::Client::new();

        let missing = client
            .get(format!("{base}/v1/sessions/nobody"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
        let err: Value = missing.json().await.unwrap();
        assert_eq!(err["error"]["code"], "SESSION_NOT_FOUND");

        client
            .post(format!("{base}/v1/messages"))
            .json(&json!({ "chat_id": "c1", "body": "me llamo Carlos" }))
            .send()
            .await
            .unwrap();

        let session: Value = client
            .get(format!("{base}/v1/sessions/c1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session["display_name"], "Carlos");
        assert_eq!(session["greeted"], true);
        assert_eq!(session["request_in_flight"], false);
        assert_eq!(session["history"].as_array().unwrap().len(), 2);
        assert_eq!(session["history"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_bad_requests_are_rejected() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().times(0);
        let base = spawn_gateway(generator).await;
        let client = reqwest::Client::new();

        let blank = client
            .post(format!("{base}/v1/messages"))
            .json(&json!({ "chat_id": "  ", "body": "hola" }))
            .send()
            .await
            .unwrap();
        assert_eq!(blank.status(), 400);

        let malformed = client
            .post(format!("{base}/v1/messages"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), 400);
        let err: Value = malformed.json().await.unwrap();
        assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_empty_body_gets_not_understood() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().times(0);
        let base = spawn_gateway(generator).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{base}/v1/messages"))
            .json(&json!({ "chat_id": "c1", "body": "" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["replies"][0], MessagesConfig::default().not_understood);
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_gateway(MockGenerator::new()).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
    }
}
