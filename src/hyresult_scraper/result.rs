use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::error::ScrapeError;
use crate::hyresult_scraper::splits::parse_splits;
use crate::hyresult_scraper::strategy::{first_match, Strategy};
use crate::hyresult_scraper::{
    self, element_text, find_duration, innermost_containing, parent_text, select_text,
};
use crate::model::{ResultRecord, UNKNOWN};

type Found = Result<Option<String>, ScrapeError>;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("extraction pattern is valid")
}

static OVERALL_OF: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)#(\d+)\s+of\s+\d+"));
static HASH_AT_LINE_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?m)#(\d+)\s*$"));
static POSITION_LABEL: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)position[:\s]*#?(\d+)"));
static HASH: LazyLock<Regex> = LazyLock::new(|| pattern(r"#(\d+)"));
static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| pattern(r"#?\s*(\d+)"));
static IN_AG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)#(\d+)\s+in\s+AG"));
static IN_DIVISION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)#(\d+)\s+in\s+[A-Z]{2}\s+\d+"));
static AGE_GROUP_LABEL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)age\s+group[:\s]*#?(\d+)"));
static HASH_IN: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)#(\d+)\s+in"));

const NAME_STRATEGIES: &[Strategy] = &[
    Strategy::new("h1", name_from_heading),
    Strategy::new("name selectors", name_from_selectors),
    Strategy::new("page title", name_from_title),
];

const OVERALL_STRATEGIES: &[Strategy] = &[
    Strategy::new("'#N of M' in page text", overall_of_in_text),
    Strategy::new("'#N' at line end", hash_at_line_end),
    Strategy::new("'position: N' in page text", position_label_in_text),
    Strategy::new("position headings", overall_from_headings),
    Strategy::new("position keywords", overall_from_keywords),
    Strategy::new("position attributes", overall_from_attributes),
];

const CATEGORY_STRATEGIES: &[Strategy] = &[
    Strategy::new("'#N in AG' in page text", in_age_group_in_text),
    Strategy::new("'#N in XX NN' in page text", in_division_in_text),
    Strategy::new("'age group: N' in page text", age_group_label_in_text),
    Strategy::new("category headings", category_from_headings),
    Strategy::new("category keyword", category_from_keyword),
    Strategy::new("category attributes", category_from_attributes),
];

const TOTAL_TIME_STRATEGIES: &[Strategy] = &[
    Strategy::new("'Time' label", time_label),
    Strategy::new("'Finish' label", finish_label),
    Strategy::new("time selectors", total_time_from_selectors),
];

#[instrument(skip(client))]
pub(crate) async fn get_result(
    client: &reqwest::Client,
    url: &str,
) -> Result<ResultRecord, ScrapeError> {
    let url = hyresult_scraper::splits_tab_url(url)?;
    let document = hyresult_scraper::get_document(client, &url).await?;
    let result = parse_result(&document);
    debug!(
        athlete = %result.athlete_name,
        splits = result.splits.len(),
        "parsed result page"
    );
    Ok(result)
}

/// Build a record from a result page. Never fails: missing fields stay
/// [`UNKNOWN`].
pub(crate) fn parse_result(document: &Html) -> ResultRecord {
    let field = |name: &str, strategies: &[Strategy]| {
        first_match(name, document, strategies).unwrap_or_else(|| UNKNOWN.to_string())
    };

    ResultRecord {
        athlete_name: field("athlete_name", NAME_STRATEGIES),
        overall_position: field("overall_position", OVERALL_STRATEGIES),
        category_position: field("category_position", CATEGORY_STRATEGIES),
        total_time: field("total_time", TOTAL_TIME_STRATEGIES),
        splits: parse_splits(document),
    }
}

fn page_text(document: &Html) -> String {
    Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element())
        .text()
        .collect()
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn overall_of_in_text(document: &Html) -> Found {
    Ok(capture(&OVERALL_OF, &page_text(document)))
}

fn hash_at_line_end(document: &Html) -> Found {
    Ok(capture(&HASH_AT_LINE_END, &page_text(document)))
}

fn position_label_in_text(document: &Html) -> Found {
    Ok(capture(&POSITION_LABEL, &page_text(document)))
}

fn in_age_group_in_text(document: &Html) -> Found {
    Ok(capture(&IN_AG, &page_text(document)))
}

fn in_division_in_text(document: &Html) -> Found {
    Ok(capture(&IN_DIVISION, &page_text(document)))
}

fn age_group_label_in_text(document: &Html) -> Found {
    Ok(capture(&AGE_GROUP_LABEL, &page_text(document)))
}

fn name_from_heading(document: &Html) -> Found {
    let selector = Selector::parse("h1")?;
    Ok(document.select(&selector).next().map(|h1| element_text(&h1)))
}

fn name_from_selectors(document: &Html) -> Found {
    let selector = Selector::parse(".athlete-name, [data-athlete-name], .name")?;
    Ok(Some(select_text(&document.root_element(), &selector)))
}

/// Text before the first `-` of the page title, or before the first `|`
/// when nothing precedes the dash.
fn name_from_title(document: &Html) -> Found {
    let selector = Selector::parse("title")?;
    let title = select_text(&document.root_element(), &selector);
    let first_segment = |separator: char| {
        title
            .split(separator)
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    };
    Ok(first_segment('-').or_else(|| first_segment('|')))
}

fn overall_from_headings(document: &Html) -> Found {
    let selector = Selector::parse("h2, h3, .position, [class*=\"position\"], [class*=\"rank\"]")?;
    Ok(document.select(&selector).find_map(|e| {
        let text = element_text(&e);
        capture(&OVERALL_OF, &text).or_else(|| capture(&HASH, &text))
    }))
}

fn overall_from_keywords(document: &Html) -> Found {
    Ok(["Position", "Overall", "Rank"]
        .into_iter()
        .find_map(|keyword| number_near_keyword(document, keyword)))
}

fn category_from_headings(document: &Html) -> Found {
    let selector = Selector::parse("h2, h3, .category, [class*=\"category\"], [class*=\"age\"]")?;
    Ok(document.select(&selector).find_map(|e| {
        let text = element_text(&e);
        capture(&IN_AG, &text).or_else(|| capture(&HASH_IN, &text))
    }))
}

fn category_from_keyword(document: &Html) -> Found {
    Ok(number_near_keyword(document, "Category"))
}

fn overall_from_attributes(document: &Html) -> Found {
    digits_of_first(document, "[data-position], [data-rank], .position, .rank")
}

fn category_from_attributes(document: &Html) -> Found {
    digits_of_first(document, "[data-category-position], .category-position")
}

fn time_label(document: &Html) -> Found {
    Ok(duration_near_keyword(document, "Time"))
}

fn finish_label(document: &Html) -> Found {
    Ok(duration_near_keyword(document, "Finish"))
}

/// First number inside, or right next to, an element labelled `keyword`.
fn number_near_keyword(document: &Html, keyword: &str) -> Option<String> {
    innermost_containing(document, keyword, false)
        .iter()
        .find_map(|e| {
            capture(&FIRST_NUMBER, &element_text(e))
                .or_else(|| capture(&FIRST_NUMBER, &parent_text(e)))
        })
}

fn duration_near_keyword(document: &Html, keyword: &str) -> Option<String> {
    innermost_containing(document, keyword, false)
        .iter()
        .find_map(|e| find_duration(&element_text(e)).or_else(|| find_duration(&parent_text(e))))
}

fn total_time_from_selectors(document: &Html) -> Found {
    let selector = Selector::parse(".total-time, .finish-time, [data-total-time], .time")?;
    Ok(document.select(&selector).find_map(|e| {
        e.value()
            .attr("data-total-time")
            .and_then(find_duration)
            .or_else(|| find_duration(&element_text(&e)))
    }))
}

fn digits_of_first(document: &Html, css: &str) -> Found {
    let selector = Selector::parse(css)?;
    Ok(document.select(&selector).next().map(|e| {
        element_text(&e)
            .chars()
            .filter(char::is_ascii_digit)
            .collect()
    }))
}
