use serde::{Deserialize, Serialize};

/// Placeholder for any field the page did not reveal.
pub const UNKNOWN: &str = "Unknown";

/// Everything pulled from a single athlete result page.
///
/// Positions and times are kept as the page shows them; a field that could
/// not be found holds [`UNKNOWN`] rather than being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub athlete_name: String,
    pub overall_position: String,
    pub category_position: String,
    pub total_time: String,
    pub splits: Vec<Split>,
}

/// Elapsed time for one station of the race.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    pub workout: String,
    pub time: String,
}

impl Split {
    pub fn new(workout: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            workout: workout.into(),
            time: time.into(),
        }
    }
}

impl Default for ResultRecord {
    fn default() -> Self {
        Self {
            athlete_name: UNKNOWN.to_string(),
            overall_position: UNKNOWN.to_string(),
            category_position: UNKNOWN.to_string(),
            total_time: UNKNOWN.to_string(),
            splits: Vec::new(),
        }
    }
}
