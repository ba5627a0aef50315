use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::GenerationError;
use crate::model::{
    PromptVariant, RoastResult, DEFAULT_HASHTAGS, DEFAULT_TITLE, SHORT_DEFAULT_HASHTAGS,
};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` API.
///
/// Cheap to clone; the underlying [`reqwest::Client`] is shared. No request
/// timeout is set, a slow model answer holds the request open.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    /// Create a client for the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    /// Create a client using the provided [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http: client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another API root, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send `prompt` and return the model's raw text answer.
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(prompt_len = prompt.len(), "calling Gemini");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(&request)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(GenerationError::new(format!("[{status}] {message}")));
        }

        let text = answer_text(serde_json::from_str(&body)?);
        if text.trim().is_empty() {
            return Err(GenerationError::new("model returned no text"));
        }

        debug!(len = text.len(), "received Gemini answer");
        Ok(text)
    }

    /// Generate a roast and shape the answer into a [`RoastResult`].
    pub async fn generate_roast(
        &self,
        prompt: &str,
        variant: PromptVariant,
    ) -> Result<RoastResult, GenerationError> {
        let text = self.generate_text(prompt).await?;
        Ok(match variant {
            PromptVariant::Structured => parse_roast_response(&text),
            PromptVariant::Plain => plain_roast(text),
        })
    }
}

/// Read a `{title, roast, hashtags}` object out of a model answer.
///
/// The object may be wrapped in prose or a markdown fence: everything from
/// the first `{` to the last `}` is parsed. Missing keys fall back one by
/// one; an answer without parseable JSON becomes the roast itself.
pub fn parse_roast_response(text: &str) -> RoastResult {
    let parsed = json_span(text).and_then(|span| {
        serde_json::from_str::<serde_json::Value>(span)
            .inspect_err(|e| warn!(error = %e, "model answer is not valid JSON, using raw text"))
            .ok()
    });

    let Some(value) = parsed else {
        return plain_roast(text.to_string());
    };

    let field = |key: &str| {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    RoastResult {
        title: field("title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        roast: field("roast").unwrap_or_else(|| text.to_string()),
        hashtags: field("hashtags").unwrap_or_else(|| SHORT_DEFAULT_HASHTAGS.to_string()),
    }
}

/// Text parts of the first candidate, joined.
fn answer_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default()
}

fn plain_roast(text: String) -> RoastResult {
    RoastResult {
        title: DEFAULT_TITLE.to_string(),
        roast: text,
        hashtags: DEFAULT_HASHTAGS.to_string(),
    }
}

fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
