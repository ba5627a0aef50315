use serde::{Deserialize, Serialize};

/// Where shared roasts point people to.
pub const SITE_URL: &str = "https://hyrox-roast-generator.vercel.app";

pub const DEFAULT_TITLE: &str = "HYROX ROAST";

/// Hashtags used when the model answered with JSON but left them out.
pub const SHORT_DEFAULT_HASHTAGS: &str = "#hyrox #hyroxrace #fitness #roast";

/// Hashtags used when the model answer was not JSON at all.
pub const DEFAULT_HASHTAGS: &str = "#hyrox #hyroxrace #functionalfitness #fitness #roast #roastme #motivation #fitspo #workout #training";

/// Generated text ready to show or draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastResult {
    pub title: String,
    pub roast: String,
    pub hashtags: String,
}

impl RoastResult {
    /// Text for the "copy" button and social share intents.
    pub fn share_text(&self, athlete_name: &str, link: &str) -> String {
        format!(
            "{athlete_name}'s Hyrox Roast:\n\n{}\n\n{}\n\n\u{1F525} Get your own roast at: {link}",
            self.roast, self.hashtags
        )
    }
}

/// Which prompt template to send and which response envelope to return.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptVariant {
    /// Short roast plus title and hashtags, answered as JSON.
    #[default]
    Structured,
    /// Longer free-text roast only.
    Plain,
}
