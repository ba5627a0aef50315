//! Full roast pipeline against a local stand-in for the results site and
//! the Gemini API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use hyrox_roast::model::{PromptVariant, Split};
use hyrox_roast::server::{router, AppState};
use hyrox_roast::{GeminiClient, ResultsClient, Roaster, ScrapeError};

const RESULT_PAGE: &str = include_str!("fixtures/result_page.html");
const API_KEY: &str = "test-key";

struct Upstream {
    answer: String,
}

async fn result_page(
    Path(_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.get("tab").map(String::as_str) != Some("splits") {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(RESULT_PAGE).into_response()
}

async fn generate_content(
    State(upstream): State<Arc<Upstream>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    if !call.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        let error = json!({
            "error": {
                "code": 403,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "PERMISSION_DENIED"
            }
        });
        return (StatusCode::FORBIDDEN, Json(error)).into_response();
    }
    let prompt = request["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    assert!(prompt.contains("- Name: Jane Doe"));

    Json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": upstream.answer }], "role": "model" },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

/// Serve the fake results site under `/hyresult.com/...` and the fake
/// Gemini API under `/v1beta/...`.
async fn spawn_upstream(answer: &str) -> SocketAddr {
    let upstream = Arc::new(Upstream {
        answer: answer.to_string(),
    });
    let app = Router::new()
        .route("/hyresult.com/result/{id}", get(result_page))
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn app(addr: SocketAddr, api_key: &str, variant: PromptVariant) -> Router {
    let generator = GeminiClient::new(api_key).with_base_url(format!("http://{addr}/v1beta/"));
    router(AppState::new(
        Roaster::new(ResultsClient::new(), Some(generator), variant),
        None,
    ))
}

async fn roast(app: Router, url: &str) -> (StatusCode, Value) {
    let request = Request::post("/api/roast")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "url": url }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

const STRUCTURED_ANSWER: &str = "```json\n{\n  \"title\": \"SLED DOG MODE\",\n  \"roast\": \"Seven minutes of wall balls? The wall filed a complaint. \u{1F3CB}\",\n  \"hashtags\": \"#hyrox #roast #wallballs\"\n}\n```";

#[tokio::test]
async fn structured_roast_end_to_end() {
    let addr = spawn_upstream(STRUCTURED_ANSWER).await;
    let url = format!("http://{addr}/hyresult.com/result/LR3MS4JI2BA7B6?tab=overview");

    let (status, body) = roast(app(addr, API_KEY, PromptVariant::Structured), &url).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["athleteName"], "Jane Doe");
    assert_eq!(body["data"]["overallPosition"], "1032");
    assert_eq!(body["data"]["categoryPosition"], "81");
    assert_eq!(body["data"]["totalTime"], "1:27:43");
    assert_eq!(body["data"]["splits"].as_array().unwrap().len(), 8);
    assert_eq!(
        body["data"]["splits"][0],
        json!({ "workout": "SkiErg", "time": "4:35" })
    );
    assert_eq!(body["title"], "SLED DOG MODE");
    assert_eq!(body["hashtags"], "#hyrox #roast #wallballs");
    assert!(body["roast"].as_str().unwrap().starts_with("Seven minutes"));

    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("- Overall Position: #1032"));
    assert!(prompt.contains("Their slowest split was Wall Balls at 6:59."));
}

#[tokio::test]
async fn plain_roast_omits_title_and_hashtags() {
    let addr = spawn_upstream("You rowed like the boat was on fire.\n\nRespect.").await;
    let url = format!("http://{addr}/hyresult.com/result/LR3MS4JI2BA7B6");

    let (status, body) = roast(app(addr, API_KEY, PromptVariant::Plain), &url).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["roast"], "You rowed like the boat was on fire.\n\nRespect.");
    let fields = body.as_object().unwrap();
    assert!(!fields.contains_key("title"));
    assert!(!fields.contains_key("hashtags"));
    assert!(body["prompt"].as_str().unwrap().ends_with("Generate the roast now:"));
}

#[tokio::test]
async fn missing_results_page_is_reported() {
    let addr = spawn_upstream(STRUCTURED_ANSWER).await;
    let url = format!("http://{addr}/hyresult.com/nowhere");

    let (status, body) = roast(app(addr, API_KEY, PromptVariant::Structured), &url).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch results page: 404 Not Found");
}

#[tokio::test]
async fn rejected_api_key_is_a_generation_error() {
    let addr = spawn_upstream(STRUCTURED_ANSWER).await;
    let url = format!("http://{addr}/hyresult.com/result/LR3MS4JI2BA7B6");

    let (status, body) = roast(app(addr, "wrong-key", PromptVariant::Structured), &url).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Failed to generate roast: [403 Forbidden] API key not valid. Please pass a valid API key."
    );
}

#[tokio::test]
async fn results_client_fetches_splits_tab() {
    let addr = spawn_upstream(STRUCTURED_ANSWER).await;
    let client = ResultsClient::new();

    let result = client
        .get_result(&format!("http://{addr}/hyresult.com/result/LR3MS4JI2BA7B6"))
        .await
        .unwrap();

    assert_eq!(result.athlete_name, "Jane Doe");
    assert_eq!(result.splits.last(), Some(&Split::new("Wall Balls", "6:59")));
}

#[tokio::test]
async fn unreachable_results_site_is_a_connect_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ResultsClient::new()
        .get_result(&format!("http://{addr}/hyresult.com/result/X"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Connect { .. }));
    assert_eq!(
        err.to_string(),
        "Failed to connect to results page. Please check the URL."
    );
}
