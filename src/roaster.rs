use serde::Serialize;
use tracing::{info, instrument};

use crate::client::ResultsClient;
use crate::error::{Result, RoastError};
use crate::gemini::GeminiClient;
use crate::hyresult_scraper::RESULTS_DOMAIN;
use crate::model::{PromptVariant, ResultRecord, RoastResult};
use crate::prompt::build_prompt;

pub const URL_REQUIRED: &str = "URL is required";
pub const INVALID_URL: &str = "Invalid Hyrox results URL";
pub const MISSING_API_KEY: &str = "Gemini API key not configured";

/// Everything one roast request produced.
#[derive(Debug, Clone, Serialize)]
pub struct RoastOutcome {
    pub data: ResultRecord,
    pub roast: RoastResult,
    pub prompt: String,
    pub variant: PromptVariant,
}

/// Runs the scrape → prompt → generate pipeline for one URL.
///
/// Holds no per-request state; clone it freely across handlers.
#[derive(Clone)]
pub struct Roaster {
    results: ResultsClient,
    generator: Option<GeminiClient>,
    variant: PromptVariant,
}

impl Roaster {
    /// `generator` is `None` when no API key is configured; every roast then
    /// fails with a configuration error after input validation.
    pub fn new(
        results: ResultsClient,
        generator: Option<GeminiClient>,
        variant: PromptVariant,
    ) -> Self {
        Self {
            results,
            generator,
            variant,
        }
    }

    #[instrument(skip(self))]
    pub async fn roast(&self, url: Option<&str>) -> Result<RoastOutcome> {
        let url = validate_results_url(url)?;
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| RoastError::Config(MISSING_API_KEY.to_string()))?;

        let data = self.results.get_result(url).await?;
        let prompt = build_prompt(&data, self.variant);
        let roast = generator.generate_roast(&prompt, self.variant).await?;

        info!(
            athlete = %data.athlete_name,
            total_time = %data.total_time,
            splits = data.splits.len(),
            "roast generated"
        );
        Ok(RoastOutcome {
            data,
            roast,
            prompt,
            variant: self.variant,
        })
    }
}

/// Accept only non-empty URLs pointing at the results site.
pub fn validate_results_url(url: Option<&str>) -> Result<&str> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| RoastError::Validation(URL_REQUIRED.to_string()))?;
    if !url.contains(RESULTS_DOMAIN) {
        return Err(RoastError::Validation(INVALID_URL.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_results_url() {
        assert_eq!(
            validate_results_url(Some(" https://www.hyresult.com/result/X ")).unwrap(),
            "https://www.hyresult.com/result/X"
        );

        let err = validate_results_url(None).unwrap_err();
        assert!(matches!(err, RoastError::Validation(ref m) if m == URL_REQUIRED));

        let err = validate_results_url(Some("   ")).unwrap_err();
        assert!(matches!(err, RoastError::Validation(ref m) if m == URL_REQUIRED));

        let err = validate_results_url(Some("https://example.com")).unwrap_err();
        assert!(matches!(err, RoastError::Validation(ref m) if m == INVALID_URL));
    }

    #[tokio::test]
    async fn test_missing_generator_is_config_error() {
        let roaster = Roaster::new(ResultsClient::new(), None, PromptVariant::Structured);
        let err = roaster
            .roast(Some("https://www.hyresult.com/result/X"))
            .await
            .unwrap_err();
        assert!(matches!(err, RoastError::Config(_)));
        assert_eq!(err.to_string(), MISSING_API_KEY);
    }

    #[tokio::test]
    async fn test_validation_runs_before_config_check() {
        let roaster = Roaster::new(ResultsClient::new(), None, PromptVariant::Plain);
        let err = roaster.roast(Some("https://example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_URL);
    }
}
