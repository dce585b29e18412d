//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for submitting transcripts and reading results.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::RecastError;
use crate::orchestrator::Orchestrator;
use crate::store::RecordSummary;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Recast API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Submit", "POST /transcripts");
    Output::kv("History", "GET  /transcripts");
    Output::kv("Get Result", "GET  /transcripts/:id");
    Output::kv("Stats", "GET  /stats");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/transcripts", get(list_transcripts).post(submit_transcript))
        .route("/transcripts/{id}", get(get_transcript))
        .route("/stats", get(stats))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SubmitRequest {
    transcript: String,
    #[serde(rename = "fileName", default = "default_file_name")]
    file_name: String,
}

fn default_file_name() -> String {
    "transcript.txt".to_string()
}

#[derive(Serialize)]
struct HistoryResponse {
    transcripts: Vec<RecordSummary>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error rendered as `{ "error": "..." }` with a status derived from its kind.
struct ApiError(RecastError);

impl From<RecastError> for ApiError {
    fn from(e: RecastError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn status_for(error: &RecastError) -> StatusCode {
    match error {
        RecastError::EmptyInput | RecastError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RecastError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn submit_transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    // Dropping the handler future (client gone) cancels the run.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let submission = state
        .orchestrator
        .submit_with_cancel(&req.transcript, &req.file_name, &cancel)
        .await?;

    Ok((StatusCode::CREATED, Json(submission)).into_response())
}

async fn list_transcripts(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let records = state.orchestrator.history().await?;
    let transcripts: Vec<RecordSummary> = records.iter().map(RecordSummary::from).collect();

    Ok(Json(HistoryResponse {
        total: transcripts.len(),
        transcripts,
    })
    .into_response())
}

async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.orchestrator.get(&id).await?;
    Ok(Json(record).into_response())
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let stats = state.orchestrator.stats().await?;
    Ok(Json(stats).into_response())
}
