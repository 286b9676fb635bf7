use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::{ApiError, SummarizeError};
use crate::summarize::{GenerationParams, Summarizer};

fn default_top_k() -> i64 {
    3
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    /// Upper bound on how many summaries come back.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub summaries: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<dyn Summarizer>,
    pub params: Arc<GenerationParams>,
    pub model: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process-text", post(process_text))
        .route("/health", get(health))
        .with_state(state)
}

impl TextRequest {
    fn validate(self) -> Result<(String, usize), ApiError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ApiError::EmptyInput);
        }
        let top_k = usize::try_from(self.top_k)
            .ok()
            .filter(|k| *k >= 1)
            .ok_or(ApiError::InvalidTopK(self.top_k))?;
        Ok((text.to_string(), top_k))
    }
}

async fn process_text(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let mut resp = match summarize_request(state, payload, request_id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::warn!(%request_id, error=%e, "process-text failed");
            e.into_response()
        }
    };
    if let Ok(v) = HeaderValue::from_str(&request_id.to_string()) {
        resp.headers_mut().insert("x-request-id", v);
    }
    resp
}

async fn summarize_request(
    state: AppState,
    payload: Result<Json<TextRequest>, JsonRejection>,
    request_id: Uuid,
) -> Result<TextResponse, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (text, top_k) = req.validate()?;

    let chars = text.chars().count();
    let summarizer = state.summarizer.clone();
    let params = state.params.clone();
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || summarizer.summarize(&text, &params))
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {e}")))??;

    let summaries: Vec<String> = result.summaries.into_iter().take(top_k).collect();
    if summaries.is_empty() {
        return Err(SummarizeError::EmptyOutput.into());
    }
    tracing::info!(
        %request_id,
        chars,
        backend = result.backend,
        returned = summaries.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "summarized"
    );
    Ok(TextResponse { summaries })
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "backend": state.summarizer.backend(),
            "model": &*state.model,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
