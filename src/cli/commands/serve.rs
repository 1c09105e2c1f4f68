//! HTTP API server for chat front-ends.
//!
//! Each conversation lives in a server-side session addressed by id. A
//! session is locked for the duration of a turn, so concurrent requests to
//! the same session run one after another.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{Assistant, AssistantConfiguration, Message, SessionStore};
use crate::grading::{Evaluation, Grader, OpenAIGrader};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    assistant: Arc<Assistant>,
    sessions: Arc<SessionStore>,
    grader: Option<Arc<dyn Grader>>,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings.planner) {
        Output::error(&format!("{}", e));
        Output::info("Run 'modplan doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let assistant = Arc::new(Assistant::from_settings(&settings)?);
    let grader: Option<Arc<dyn Grader>> = match OpenAIGrader::new(&settings.grader_endpoint()) {
        Ok(grader) => Some(Arc::new(grader)),
        Err(e) => {
            warn!("Grading endpoint disabled: {}", e);
            None
        }
    };
    let app = router(assistant, Arc::new(SessionStore::new()), grader);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Modplan API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /api/chat");
    Output::kv("Reset", "POST /api/reset");
    Output::kv("Session", "GET  /api/sessions/:id");
    Output::kv("Delete", "DELETE /api/sessions/:id");
    Output::kv("Grade", "POST /api/grade");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around an assistant and a session store.
///
/// `/api/grade` answers 503 when no grader is given.
pub fn router(
    assistant: Arc<Assistant>,
    sessions: Arc<SessionStore>,
    grader: Option<Arc<dyn Grader>>,
) -> Router {
    let state = Arc::new(AppState {
        assistant,
        sessions,
        grader,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/reset", post(reset))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/grade", post(grade))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    prompt: String,
    /// Continue this session; a new one is created when absent.
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    developer_view: bool,
    /// Replaces the configured system prompt for this turn only.
    #[serde(default)]
    system_prompt: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    answer: String,
    history: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    developer_view: Option<DeveloperView>,
}

#[derive(Serialize)]
struct DeveloperView {
    model_input: Vec<Message>,
    trace: Vec<Message>,
    stored_state: Vec<Message>,
    configuration: AssistantConfiguration,
}

#[derive(Deserialize)]
struct ResetRequest {
    session_id: Uuid,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    history: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GradeRequest {
    question: String,
    #[serde(default)]
    ground_truth: Option<String>,
    #[serde(default)]
    answer: String,
}

#[derive(Serialize)]
struct GradeResponse {
    model: String,
    #[serde(flatten)]
    evaluation: Evaluation,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    /// Set when a failed turn leaves a session the client can retry against.
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<Uuid>,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            session_id: None,
        }),
    )
        .into_response()
}

fn session_not_found(id: &Uuid) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    if req.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "prompt must not be empty");
    }

    let system_prompt = req
        .system_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let (session_id, handle) = match req.session_id {
        Some(id) => match state.sessions.get(&id) {
            Some(handle) => (id, handle),
            None => return session_not_found(&id),
        },
        None => state.sessions.create(),
    };

    let mut session = handle.lock().await;
    let result = state
        .assistant
        .run_turn_with_prompt(&mut session, &req.prompt, system_prompt)
        .await;

    match result {
        Ok(outcome) => {
            let history = session.history().to_vec();
            let developer_view = req.developer_view.then(|| DeveloperView {
                model_input: outcome.model_input.clone(),
                trace: outcome.trace.clone(),
                stored_state: history.clone(),
                configuration: state.assistant.configuration_with_prompt(system_prompt),
            });

            Json(ChatResponse {
                session_id,
                answer: outcome.answer,
                history,
                developer_view,
            })
            .into_response()
        }
        Err(e) => {
            warn!("Turn failed for session {}: {}", session_id, e);

            // Sessions created by a failed request are discarded
            if req.session_id.is_none() {
                state.sessions.remove(&session_id);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    session_id: Some(session_id),
                }),
            )
                .into_response()
        }
    }
}

async fn reset(State(state): State<Arc<AppState>>, Json(req): Json<ResetRequest>) -> Response {
    match state.sessions.get(&req.session_id) {
        Some(handle) => {
            handle.lock().await.reset();
            info!("Session {} reset", req.session_id);
            Json(serde_json::json!({ "status": "ok" })).into_response()
        }
        None => session_not_found(&req.session_id),
    }
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.get(&id) {
        Some(handle) => {
            let session = handle.lock().await;
            Json(SessionResponse {
                session_id: id,
                history: session.history().to_vec(),
                created_at: session.created_at(),
                updated_at: session.updated_at(),
            })
            .into_response()
        }
        None => session_not_found(&id),
    }
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id) {
        info!("Session {} deleted", id);
        Json(serde_json::json!({ "status": "ok" })).into_response()
    } else {
        session_not_found(&id)
    }
}

async fn grade(State(state): State<Arc<AppState>>, Json(req): Json<GradeRequest>) -> Response {
    let Some(grader) = &state.grader else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "No grader configured");
    };
    if req.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "question must not be empty");
    }

    let evaluation = grader
        .grade(&req.question, req.ground_truth.as_deref(), &req.answer)
        .await;

    Json(GradeResponse {
        model: grader.model().to_string(),
        evaluation,
    })
    .into_response()
}
