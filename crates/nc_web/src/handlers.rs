use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nc_inference::briefing::{MAX_MINUTES, MIN_MINUTES};
use nc_inference::{BriefingMode, StoryArticle};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;

pub const DEFAULT_MINUTES: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] nc_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub minutes: Option<u32>,
    pub topic: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub mode: BriefingMode,
    pub ingested: usize,
    pub clusters: Vec<Vec<StoryArticle>>,
    pub script: Option<String>,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the News-to-Podcast API" }))
}

/// Ingest for the requested user, then brief on what the store holds.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GenerateParams>, QueryRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let minutes = params.minutes.unwrap_or(DEFAULT_MINUTES);
    if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        return Err(ApiError::BadRequest(format!(
            "minutes must be between {} and {}",
            MIN_MINUTES, MAX_MINUTES
        )));
    }
    let user = params.user.as_deref().filter(|u| !u.trim().is_empty());

    let report = state.manager.ingest(user).await?;
    let mode = if report.has_new_content() {
        BriefingMode::Daily
    } else {
        BriefingMode::Recap
    };
    info!("🎙️ Generating {:?} briefing of {} minutes", mode, minutes);

    let briefing = state.briefer.brief(mode, minutes, params.topic.as_deref()).await?;
    Ok(Json(GenerateResponse {
        mode: briefing.mode,
        ingested: report.accepted().len(),
        clusters: briefing.stories,
        script: briefing.script,
    }))
}
