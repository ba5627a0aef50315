use scraper::Html;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// One way of finding a field on the page.
///
/// A strategy answers `Ok(None)` when the page simply does not have what it
/// looks for; an `Err` means the strategy itself is broken and is logged.
pub(crate) struct Strategy {
    pub name: &'static str,
    pub run: fn(&Html) -> Result<Option<String>, ScrapeError>,
}

impl Strategy {
    pub const fn new(
        name: &'static str,
        run: fn(&Html) -> Result<Option<String>, ScrapeError>,
    ) -> Self {
        Self { name, run }
    }
}

/// Run `strategies` in order and return the first non-empty answer.
pub(crate) fn first_match(field: &str, document: &Html, strategies: &[Strategy]) -> Option<String> {
    for strategy in strategies {
        match (strategy.run)(document) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                debug!(field, strategy = strategy.name, %value, "field found");
                return Some(value.trim().to_string());
            }
            Ok(_) => {}
            Err(e) => warn!(field, strategy = strategy.name, error = %e, "strategy failed"),
        }
    }
    debug!(field, "no strategy matched");
    None
}
