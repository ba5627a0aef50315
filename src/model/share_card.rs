use serde::{Deserialize, Serialize};

/// Canvas shape of a share card.
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
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShareFormat {
    /// 1080x1920, Instagram stories.
    #[default]
    Stories,
    /// 1080x1080 feed post.
    Square,
}

/// Input of a single share card render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCardSpec {
    #[serde(default)]
    pub format: ShareFormat,
    pub title: String,
    pub total_time: String,
    pub roast_text: String,
}
