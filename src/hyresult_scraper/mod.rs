pub(crate) mod result;
pub(crate) mod splits;
pub(crate) mod strategy;

use std::sync::LazyLock;

pub(crate) use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::ScrapeError;

/// Substring every accepted results URL must contain.
pub const RESULTS_DOMAIN: &str = "hyresult.com";

/// `H:MM:SS` or `M:SS`, longest form first.
pub(crate) static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}|\d{1,2}:\d{2})").expect("duration pattern is valid")
});

/// Point the URL at the splits tab, which is the only one carrying the table.
pub(crate) fn splits_tab_url(url: &str) -> Result<String, ScrapeError> {
    let mut parsed = Url::parse(url)?;
    let already_splits = parsed
        .query_pairs()
        .any(|(key, value)| key == "tab" && value == "splits");
    if already_splits {
        return Ok(parsed.into());
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "tab")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("tab", "splits");
    Ok(parsed.into())
}

/// Fetch a URL and parse the response body as an HTML document.
pub(crate) async fn get_document(client: &reqwest::Client, url: &str) -> Result<Html, ScrapeError> {
    debug!(url, "fetching page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::Connect {
            url: url.to_owned(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ScrapeError::Other(format!("failed to read response body: {e}")))?;

    Ok(Html::parse_document(&body))
}

/// Trimmed text of the first element matching `selector` inside `element`
/// that has any text at all. Empty if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// All text below `element`, joined and trimmed.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Elements whose text contains `needle` while none of their child
/// elements does, in document order. Script and style content is skipped.
pub(crate) fn innermost_containing<'a>(
    document: &'a Html,
    needle: &str,
    ignore_case: bool,
) -> Vec<ElementRef<'a>> {
    let contains = |element: &ElementRef| {
        let text = element.text().collect::<String>();
        if ignore_case {
            text.to_lowercase().contains(needle)
        } else {
            text.contains(needle)
        }
    };

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| !is_non_visible(e))
        .filter(|e| contains(e))
        .filter(|e| !e.children().filter_map(ElementRef::wrap).any(|c| contains(&c)))
        .collect()
}

fn is_non_visible(element: &ElementRef) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|e| matches!(e.value().name(), "script" | "style" | "noscript"))
}

/// Text of the parent element, or empty for the root.
pub(crate) fn parent_text(element: &ElementRef) -> String {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|p| element_text(&p))
        .unwrap_or_default()
}

/// First duration token inside `text`.
pub(crate) fn find_duration(text: &str) -> Option<String> {
    DURATION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_tab_is_added() {
        let url = splits_tab_url("https://www.hyresult.com/result/LR3MS4JI2BA7B6").unwrap();
        assert_eq!(url, "https://www.hyresult.com/result/LR3MS4JI2BA7B6?tab=splits");
    }

    #[test]
    fn test_other_tab_is_replaced() {
        let url =
            splits_tab_url("https://www.hyresult.com/result/LR3MS4JI2BA7B6?tab=overview&lang=en")
                .unwrap();
        assert_eq!(
            url,
            "https://www.hyresult.com/result/LR3MS4JI2BA7B6?lang=en&tab=splits"
        );
    }

    #[test]
    fn test_splits_tab_is_kept() {
        let original = "https://www.hyresult.com/result/X?tab=splits";
        assert_eq!(splits_tab_url(original).unwrap(), original);
    }

    #[test]
    fn test_relative_url_is_a_scrape_error() {
        let err = splits_tab_url("hyresult.com/result/X").unwrap_err();
        assert!(matches!(err, ScrapeError::Other(_)));
        assert!(err.to_string().starts_with("Failed to scrape results:"));
    }

    #[test]
    fn test_innermost_containing_skips_wrappers_and_scripts() {
        let document = Html::parse_document(
            r#"<html><body>
                <script>var label = "Finish";</script>
                <div class="card"><span>Finish</span><span>1:02:03</span></div>
            </body></html>"#,
        );
        let found = innermost_containing(&document, "Finish", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().name(), "span");
        assert_eq!(parent_text(&found[0]), "Finish1:02:03");
    }

    #[test]
    fn test_find_duration_prefers_hours() {
        assert_eq!(find_duration("Finish 1:23:45").as_deref(), Some("1:23:45"));
        assert_eq!(find_duration("Run 1 4:05 Ski").as_deref(), Some("4:05"));
        assert_eq!(find_duration("no time here"), None);
    }
}
