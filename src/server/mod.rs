//! HTTP surface: `/api/health`, `/api/roast` and `/api/share-card`.

mod handlers;

pub use handlers::{FONT_NOT_CONFIGURED, ROAST_TEXT_REQUIRED};

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, warn};

use crate::error::RoastError;
use crate::roaster::Roaster;
use crate::share_card::ShareCardRenderer;

const ALLOWED_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOWED_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Shared, read-only state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub roaster: Roaster,
    /// `None` when no share card font is configured.
    pub share_cards: Option<Arc<ShareCardRenderer>>,
}

impl AppState {
    pub fn new(roaster: Roaster, share_cards: Option<ShareCardRenderer>) -> Self {
        Self {
            roaster,
            share_cards: share_cards.map(Arc::new),
        }
    }
}

/// Build the application router. Called once per process.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/roast",
            post(handlers::roast).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/share-card",
            post(handlers::share_card).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Answer preflight requests and stamp CORS headers on every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
    response
}

/// JSON `{"error": message}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for RoastError {
    fn into_response(self) -> Response {
        let status = match self {
            RoastError::Validation(_) => StatusCode::BAD_REQUEST,
            RoastError::Config(_)
            | RoastError::Scrape(_)
            | RoastError::Generation(_)
            | RoastError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(error = %self, "rejected request");
        }
        error_response(status, self.to_string())
    }
}
