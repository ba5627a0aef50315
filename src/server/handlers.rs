use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{RenderError, Result, RoastError};
use crate::model::{PromptVariant, ResultRecord, ShareCardSpec, ShareFormat, UNKNOWN};
use crate::roaster::RoastOutcome;
use crate::server::{error_response, AppState};
use crate::share_card::share_card_file_name;

pub const FONT_NOT_CONFIGURED: &str = "Share card font not configured";
pub const ROAST_TEXT_REQUIRED: &str = "Roast text is required";

#[derive(Debug, Default, Deserialize)]
struct RoastRequest {
    url: Option<String>,
}

/// Success envelope of `POST /api/roast`. Title and hashtags are only
/// present for the structured prompt.
#[derive(Debug, Serialize)]
struct RoastResponse {
    success: bool,
    data: ResultRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    roast: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashtags: Option<String>,
    prompt: String,
}

impl From<RoastOutcome> for RoastResponse {
    fn from(outcome: RoastOutcome) -> Self {
        let (title, hashtags) = match outcome.variant {
            PromptVariant::Structured => (Some(outcome.roast.title), Some(outcome.roast.hashtags)),
            PromptVariant::Plain => (None, None),
        };
        Self {
            success: true,
            data: outcome.data,
            title,
            roast: outcome.roast.roast,
            hashtags,
            prompt: outcome.prompt,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ShareCardRequest {
    title: String,
    roast: String,
    total_time: String,
    athlete_name: Option<String>,
    format: ShareFormat,
}

pub(super) async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/roast`. A body that is missing or not JSON counts as a
/// request without a URL.
#[instrument(skip_all)]
pub(super) async fn roast(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: RoastRequest = serde_json::from_slice(&body).unwrap_or_default();
    let outcome = state.roaster.roast(request.url.as_deref()).await?;
    Ok(Json(RoastResponse::from(outcome)).into_response())
}

/// `POST /api/share-card`: render a PNG on the blocking pool.
#[instrument(skip_all)]
pub(super) async fn share_card(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: ShareCardRequest = if body.is_empty() {
        ShareCardRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| RoastError::Validation(format!("Invalid share card request: {e}")))?
    };
    if request.roast.trim().is_empty() {
        return Err(RoastError::Validation(ROAST_TEXT_REQUIRED.to_string()));
    }
    let renderer = state
        .share_cards
        .clone()
        .ok_or_else(|| RoastError::Config(FONT_NOT_CONFIGURED.to_string()))?;

    let file_name = share_card_file_name(
        request.athlete_name.as_deref().unwrap_or(UNKNOWN),
        Some(request.format),
    );
    let spec = ShareCardSpec {
        format: request.format,
        title: request.title,
        total_time: request.total_time,
        roast_text: request.roast,
    };
    let png = tokio::task::spawn_blocking(move || renderer.render_png(&spec))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;
    debug!(file_name, bytes = png.len(), "rendered share card");

    Ok((
        [
            (CONTENT_TYPE, "image/png".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        png,
    )
        .into_response())
}

pub(super) async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub(super) async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
