use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracing::warn;

use crate::client::ResultsClient;
use crate::error::RenderError;
use crate::gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::model::PromptVariant;
use crate::roaster::Roaster;
use crate::share_card::ShareCardRenderer;

/// Loads a `.env` file into the process environment, from `path` or from the
/// current directory and its parents. Variables that are already set keep
/// their value. A missing file is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Process configuration, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Gemini API key. Roast requests fail with a configuration error
    /// without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_BASE_URL, global = true)]
    pub gemini_api_base: String,

    /// Timeout for fetching a results page, in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub fetch_timeout_secs: u64,

    #[arg(long, env = "PROMPT_VARIANT", value_enum, default_value_t, global = true)]
    pub prompt_variant: PromptVariant,

    /// TTF/OTF font for share cards. Share cards are disabled without it.
    #[arg(long, env = "SHARE_CARD_FONT", global = true)]
    pub share_card_font: Option<PathBuf>,

    /// Bold face for the title and banner; the regular font is used if unset.
    #[arg(long, env = "SHARE_CARD_BOLD_FONT", global = true)]
    pub share_card_bold_font: Option<PathBuf>,

    /// PNG drawn behind share cards instead of the gradient.
    #[arg(long, env = "SHARE_CARD_BACKGROUND", global = true)]
    pub share_card_background: Option<PathBuf>,

    #[arg(long, env = "PORT", default_value_t = 3000, global = true)]
    pub port: u16,

    /// Set to `1` by the serverless platform; no socket is bound then.
    #[arg(long, env = "VERCEL", global = true)]
    pub vercel: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,
}

impl Config {
    pub fn is_vercel(&self) -> bool {
        self.vercel.as_deref() == Some("1")
    }

    pub fn results_client(&self) -> ResultsClient {
        ResultsClient::with_timeout(Duration::from_secs(self.fetch_timeout_secs))
    }

    /// `None` when the API key is missing or blank.
    pub fn gemini_client(&self) -> Option<GeminiClient> {
        let key = self.gemini_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let Some(key) = key else {
            warn!("GEMINI_API_KEY is not set, roast requests will fail");
            return None;
        };
        Some(
            GeminiClient::new(key)
                .with_model(&self.gemini_model)
                .with_base_url(&self.gemini_api_base),
        )
    }

    pub fn roaster(&self) -> Roaster {
        Roaster::new(self.results_client(), self.gemini_client(), self.prompt_variant)
    }

    /// Load the share card fonts, or `None` if no font is configured.
    pub fn share_card_renderer(&self) -> Result<Option<ShareCardRenderer>, RenderError> {
        let Some(font) = &self.share_card_font else {
            warn!("SHARE_CARD_FONT is not set, share cards are disabled");
            return Ok(None);
        };
        ShareCardRenderer::from_paths(
            font,
            self.share_card_bold_font.as_deref(),
            self.share_card_background.as_deref(),
        )
        .map(Some)
    }
}
