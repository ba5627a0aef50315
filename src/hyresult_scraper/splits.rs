use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::hyresult_scraper::{element_text, find_duration, innermost_containing, parent_text};
use crate::model::Split;

/// Words that make a table worth scanning.
const TABLE_KEYWORDS: &[&str] = &["ski", "sled", "row", "burpee", "farmers", "wall"];

/// Words that make a row's first cell a station.
const STATION_KEYWORDS: &[&str] = &[
    "ski", "sled", "row", "burpee", "farmers", "sandbag", "wall", "lunges",
];

/// The eight stations of a race and how they are spelled on pages.
const STATIONS: &[(&str, &[&str])] = &[
    ("SkiErg", &["ski", "skierg"]),
    ("Sled Push", &["sled push", "push"]),
    ("Sled Pull", &["sled pull", "pull"]),
    ("Burpee Broad Jump", &["burpee", "broad jump"]),
    ("Rowing", &["row", "rowing"]),
    ("Farmers Carry", &["farmers", "farmer"]),
    ("Sandbag Lunges", &["sandbag", "lunges"]),
    ("Wall Balls", &["wall ball", "wallball"]),
];

/// Station split times, from a splits table if there is one, otherwise from
/// loose text near station names.
pub(crate) fn parse_splits(document: &Html) -> Vec<Split> {
    let splits = match parse_table_splits(document) {
        Ok(splits) => splits,
        Err(e) => {
            warn!(error = %e, "splits table scan failed");
            Vec::new()
        }
    };
    if !splits.is_empty() {
        debug!(count = splits.len(), "parsed splits table");
        return splits;
    }

    let splits = parse_text_splits(document);
    debug!(count = splits.len(), "parsed splits from page text");
    splits
}

fn parse_table_splits(document: &Html) -> Result<Vec<Split>, ScrapeError> {
    let table_selector = Selector::parse("table")?;
    let row_selector = Selector::parse("tr")?;
    let cell_selector = Selector::parse("td, th")?;

    let splits = document
        .select(&table_selector)
        .filter(|table| {
            let text = table.text().collect::<String>().to_lowercase();
            TABLE_KEYWORDS.iter().any(|k| text.contains(k))
        })
        .flat_map(|table| {
            // rows of nested tables are visited when their own table is
            table
                .select(&row_selector)
                .filter(move |row| closest(row, "table").is_some_and(|t| t.id() == table.id()))
        })
        .filter_map(|row| {
            let cells = row
                .select(&cell_selector)
                .filter(|cell| closest(cell, "tr").is_some_and(|r| r.id() == row.id()))
                .collect_vec();
            parse_split_row(&cells)
        })
        .unique()
        .collect();
    Ok(splits)
}

fn parse_split_row(cells: &[ElementRef]) -> Option<Split> {
    let [workout, time, ..] = cells else {
        return None;
    };
    let workout = element_text(workout);
    let time = element_text(time);

    let lowered = workout.to_lowercase();
    let is_station = STATION_KEYWORDS.iter().any(|k| lowered.contains(k));
    let has_digit = time.chars().any(|c| c.is_ascii_digit());
    (is_station && has_digit).then(|| Split { workout, time })
}

fn parse_text_splits(document: &Html) -> Vec<Split> {
    let mut splits: Vec<Split> = Vec::new();
    for (name, patterns) in STATIONS {
        for pattern in *patterns {
            let time = innermost_containing(document, pattern, true)
                .first()
                .and_then(|e| find_duration(&parent_text(e)));
            if let Some(time) = time {
                if !splits.iter().any(|s| s.workout == *name) {
                    splits.push(Split::new(*name, time));
                }
            }
        }
    }
    splits
}

/// Nearest ancestor named `tag`.
fn closest<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == tag)
}
