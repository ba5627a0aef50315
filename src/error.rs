use ::scraper::error::SelectorErrorKind;

/// Failures while fetching or reading a results page.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    /// The results site answered with a non-success status code.
    #[error("Failed to fetch results page: {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// No response at all (DNS, refused connection, TLS, timeout).
    #[error("Failed to connect to results page. Please check the URL.")]
    Connect {
        url: String,
        source: reqwest::Error,
    },

    /// Anything else: malformed URL, unreadable body, bad selector.
    #[error("Failed to scrape results: {0}")]
    Other(String),
}

impl<'a> From<SelectorErrorKind<'a>> for ScrapeError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        ScrapeError::Other(format!("invalid CSS selector: {err}"))
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::Other(err.to_string())
    }
}

/// Failure talking to the text generation API.
#[derive(thiserror::Error, Debug)]
#[error("Failed to generate roast: {message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::new(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::new(format!("unreadable response: {err}"))
    }
}

/// Failures while drawing or encoding a share card.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid font data in {path}")]
    InvalidFont { path: String },

    #[error("failed to encode share card: {0}")]
    Image(#[from] image::ImageError),

    #[error("render task failed: {0}")]
    Task(String),
}

/// Every error a roast request can end in.
///
/// The HTTP layer maps [`RoastError::Validation`] to `400` and everything
/// else to `500`; the message is what the client sees.
#[derive(thiserror::Error, Debug)]
pub enum RoastError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// Missing credentials or other server setup.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to render share card: {0}")]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, RoastError>;
