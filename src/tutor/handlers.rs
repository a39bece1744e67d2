use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub const PROMPT_MAX_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub text: String,
}

pub fn tutor_routes() -> Router<AppState> {
    Router::new().route("/tutor/ask", post(ask))
}

#[instrument(skip(state, payload))]
pub async fn ask(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Some(generator) = state.tutor.clone() else {
        return Err(ApiError::NotImplemented("Tutor is not configured".into()));
    };
    let Json(payload) = payload?;
    let prompt = payload
        .prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Prompt is required"))?;
    if prompt.chars().count() > PROMPT_MAX_CHARS {
        return Err(ApiError::validation(format!(
            "Prompt must be at most {PROMPT_MAX_CHARS} characters"
        )));
    }

    let text = generator
        .generate(&prompt)
        .await
        .context("tutor generation")?;
    info!(%user_id, chars = text.chars().count(), "tutor answered");
    Ok(Json(AskResponse { text }))
}
