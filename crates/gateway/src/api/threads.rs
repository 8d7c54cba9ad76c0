//! Thread API: create, inspect and talk to intake threads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use sg_domain::error::Error;

use crate::runtime;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/threads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn create_thread(State(state): State<AppState>) -> impl IntoResponse {
    let session = runtime::create_thread(&state);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "thread_id": session.thread_id,
            "created_at": session.created_at.to_rfc3339(),
        })),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/threads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_threads(State(state): State<AppState>) -> impl IntoResponse {
    let threads = state.sessions.list_ids();
    Json(serde_json::json!({
        "count": threads.len(),
        "threads": threads,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/threads/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_thread(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.sessions.get(&id) {
        Some(session) => Json(serde_json::json!({
            "thread_id": session.thread_id,
            "record": session.record,
            "pending_confirmation": session.pending_confirmation(),
            "pending_date": session.pending_date,
            "messages": session.messages,
            "created_at": session.created_at.to_rfc3339(),
            "updated_at": session.updated_at.to_rfc3339(),
        }))
        .into_response(),
        None => not_found(&id),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/threads/:id/turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct TurnBody {
    pub message: String,
}

pub async fn post_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TurnBody>,
) -> Response {
    let message = body.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "message must not be empty" })),
        )
            .into_response();
    }

    match runtime::run_turn(&state, &id, message).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(Error::SessionNotFound(_)) => not_found(&id),
        Err(e) => {
            tracing::error!(thread_id = %id, error = %e, "turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "thread not found", "thread_id": id })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use sg_domain::capability::LlmCapabilities;
    use sg_domain::config::{Config, RoleConfig};
    use sg_domain::error::Result;
    use sg_providers::{ChatRequest, ChatResponse, LlmProvider, LlmRouter, ProviderRegistry};
    use sg_sessions::SessionStore;
    use tower::ServiceExt;

    use super::*;

    /// Always extracts the same address.
    struct FixedExtractor {
        caps: LlmCapabilities,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedExtractor {
        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse {
                content: r#"{"address": "大阪市北区中之島1-1-1"}"#.into(),
                usage: None,
                model: "fixed".into(),
                finish_reason: Some("stop".into()),
            })
        }

        fn capabilities(&self) -> &LlmCapabilities {
            &self.caps
        }

        fn provider_id(&self) -> &str {
            "fixed"
        }
    }

    fn app(token: Option<&str>) -> (axum::Router, AppState) {
        let mut registry = ProviderRegistry::default();
        registry.insert(Arc::new(FixedExtractor {
            caps: LlmCapabilities {
                supports_json_mode: true,
                ..Default::default()
            },
        }));
        let mut roles = HashMap::new();
        roles.insert(
            "extractor".to_string(),
            RoleConfig {
                model: "fixed/m".into(),
                require_json: true,
                fallbacks: Vec::new(),
            },
        );
        let router = Arc::new(LlmRouter::new(registry, roles, 1_000, 0));
        let mut state =
            crate::bootstrap::build_with(Arc::new(Config::default()), router, SessionStore::in_memory())
                .unwrap();
        state.api_token = token.map(crate::api::auth::ApiToken::new);
        let app = crate::api::router(state.clone()).with_state(state.clone());
        (app, state)
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app(Some("secret"));
        let resp = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn threads_require_token_when_configured() {
        let (app, _) = app(Some("secret"));

        let denied = app
            .clone()
            .oneshot(Request::get("/v1/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(denied.headers()["www-authenticate"], "Bearer");

        let allowed = app
            .oneshot(
                Request::get("/v1/threads")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_then_turn() {
        let (app, state) = app(None);

        let created = app
            .clone()
            .oneshot(Request::post("/v1/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = json_body(created).await["thread_id"].as_str().unwrap().to_string();
        assert!(state.sessions.contains(&id));

        let turn = app
            .clone()
            .oneshot(post(
                &format!("/v1/threads/{id}/turns"),
                serde_json::json!({"message": "大阪市北区中之島1-1-1です"}),
            ))
            .await
            .unwrap();
        assert_eq!(turn.status(), StatusCode::OK);
        let body = json_body(turn).await;
        assert_eq!(body["response"]["kind"], "ask");
        assert_eq!(body["response"]["next_field"], "name");
        assert_eq!(body["record"]["address"], "大阪市北区中之島1-1-1");
        assert_eq!(body["pending_confirmation"], false);

        let detail = app
            .oneshot(Request::get(format!("/v1/threads/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let detail = json_body(detail).await;
        assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_thread_is_404() {
        let (app, _) = app(None);
        let resp = app
            .clone()
            .oneshot(post("/v1/threads/nope/turns", serde_json::json!({"message": "こんにちは"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(Request::get("/v1/threads/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let (app, state) = app(None);
        let id = runtime::create_thread(&state).thread_id;
        let resp = app
            .oneshot(post(&format!("/v1/threads/{id}/turns"), serde_json::json!({"message": "  "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
