use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{ShareCardSpec, ShareFormat, DEFAULT_TITLE};

/// Smallest roast font size the fit loop will go down to.
pub const MIN_FONT_SIZE: f32 = 22.0;

/// Number of times the roast font may shrink.
pub const MAX_SHRINK_ATTEMPTS: u32 = 8;

const SHRINK_STEP: f32 = 2.0;
const LINE_HEIGHT_FACTOR: f32 = 1.4;
const CONTENT_HEIGHT_RATIO: f32 = 0.75;
const HORIZONTAL_PADDING: f32 = 160.0;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Measures rendered text so layout can be computed without a rasterizer.
pub trait TextMeasure {
    /// Advance width of `text` at `size` px.
    fn text_width(&self, text: &str, size: f32, bold: bool) -> f32;

    /// Height of one line of glyphs at `size` px, ascent to descent.
    fn text_height(&self, size: f32, bold: bool) -> f32;
}

/// Fixed geometry of a card format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatMetrics {
    pub width: u32,
    pub height: u32,
    pub title_size: f32,
    pub banner_height: f32,
    pub banner_font_size: f32,
    pub spacing_after_title: f32,
    pub spacing_after_banner: f32,
    pub roast_start_size: f32,
}

impl FormatMetrics {
    pub const fn for_format(format: ShareFormat) -> Self {
        match format {
            ShareFormat::Stories => Self {
                width: 1080,
                height: 1920,
                title_size: 72.0,
                banner_height: 140.0,
                banner_font_size: 72.0,
                spacing_after_title: 30.0,
                spacing_after_banner: 40.0,
                roast_start_size: 42.0,
            },
            ShareFormat::Square => Self {
                width: 1080,
                height: 1080,
                title_size: 60.0,
                banner_height: 120.0,
                banner_font_size: 60.0,
                spacing_after_title: 25.0,
                spacing_after_banner: 35.0,
                roast_start_size: 32.0,
            },
        }
    }

    /// Widest a roast line may be.
    pub fn max_text_width(&self) -> f32 {
        self.width as f32 - HORIZONTAL_PADDING
    }
}

/// One row of wrapped roast text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    ParagraphBreak,
}

pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_FACTOR
}

pub fn paragraph_gap(size: f32) -> f32 {
    (size * 0.8).max(20.0)
}

/// Vertical space taken by `lines` at `size`.
pub fn lines_height(lines: &[Line], size: f32) -> f32 {
    lines
        .iter()
        .map(|line| match line {
            Line::Text(_) => line_height(size),
            Line::ParagraphBreak => paragraph_gap(size),
        })
        .sum()
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Paragraphs are separated by blank lines and joined by a
/// [`Line::ParagraphBreak`]. Words are packed greedily; a word that is wider
/// than a line on its own is broken between characters. Only a single
/// character wider than `max_width` can produce an overlong line.
pub fn wrap_text(
    measure: &impl TextMeasure,
    text: &str,
    size: f32,
    max_width: f32,
) -> Vec<Line> {
    let mut paragraphs: Vec<&str> = PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs.push(text);
    }

    let fits = |line: &str| measure.text_width(line, size, false) <= max_width;
    let mut lines = Vec::new();

    for (index, paragraph) in paragraphs.iter().enumerate() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(Line::Text(std::mem::take(&mut current)));
            }
            current = word.to_string();
            if !fits(&current) {
                current = break_word(&current, &fits, &mut lines);
            }
        }
        if !current.is_empty() {
            lines.push(Line::Text(current));
        }

        if index + 1 < paragraphs.len() {
            lines.push(Line::ParagraphBreak);
        }
    }
    lines
}

/// Push full-width pieces of `word` and return the unfinished tail.
fn break_word(word: &str, fits: &impl Fn(&str) -> bool, lines: &mut Vec<Line>) -> String {
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if !fits(&piece) && piece.chars().count() > 1 {
            piece.pop();
            lines.push(Line::Text(std::mem::take(&mut piece)));
            piece.push(ch);
        }
    }
    piece
}

/// Positions of everything drawn on a card, in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub metrics: FormatMetrics,
    pub title: String,
    pub banner_text: String,
    pub title_height: f32,
    pub font_size: f32,
    pub lines: Vec<Line>,
    /// Number of times the roast font was shrunk.
    pub shrinks: u32,
    pub title_top: f32,
    pub banner_top: f32,
    pub text_top: f32,
}

impl CardLayout {
    pub fn line_height(&self) -> f32 {
        line_height(self.font_size)
    }

    pub fn paragraph_gap(&self) -> f32 {
        paragraph_gap(self.font_size)
    }

    pub fn content_height(&self) -> f32 {
        self.title_height
            + self.metrics.spacing_after_title
            + self.metrics.banner_height
            + self.metrics.spacing_after_banner
            + lines_height(&self.lines, self.font_size)
    }
}

/// Lay out a card, shrinking the roast font until the content block fits
/// in three quarters of the canvas height.
///
/// The font shrinks by 2 px at a time, at most [`MAX_SHRINK_ATTEMPTS`]
/// times and never below [`MIN_FONT_SIZE`]. Lines are always wrapped at the
/// final size.
pub fn layout_card(measure: &impl TextMeasure, spec: &ShareCardSpec) -> CardLayout {
    let metrics = FormatMetrics::for_format(spec.format);
    let title = match spec.title.trim() {
        "" => DEFAULT_TITLE.to_string(),
        title => title.to_string(),
    };
    let total_time = match spec.total_time.trim() {
        "" => "N/A",
        time => time,
    };
    let title_height = measure.text_height(metrics.title_size, true);
    let fixed_height = title_height
        + metrics.spacing_after_title
        + metrics.banner_height
        + metrics.spacing_after_banner;
    let budget = metrics.height as f32 * CONTENT_HEIGHT_RATIO;

    let mut font_size = metrics.roast_start_size;
    let mut shrinks = 0;
    let mut lines = wrap_text(measure, &spec.roast_text, font_size, metrics.max_text_width());
    while fixed_height + lines_height(&lines, font_size) > budget
        && shrinks < MAX_SHRINK_ATTEMPTS
        && font_size > MIN_FONT_SIZE
    {
        font_size = (font_size - SHRINK_STEP).max(MIN_FONT_SIZE);
        shrinks += 1;
        lines = wrap_text(measure, &spec.roast_text, font_size, metrics.max_text_width());
    }

    let content_height = fixed_height + lines_height(&lines, font_size);
    let title_top = (metrics.height as f32 - content_height) / 2.0;
    let banner_top = title_top + title_height + metrics.spacing_after_title;
    let text_top = banner_top + metrics.banner_height + metrics.spacing_after_banner;
    debug!(
        format = %spec.format,
        font_size,
        shrinks,
        lines = lines.len(),
        "laid out share card"
    );

    CardLayout {
        metrics,
        title,
        banner_text: format!("FINISH TIME: {total_time}"),
        title_height,
        font_size,
        lines,
        shrinks,
        title_top,
        banner_top,
        text_top,
    }
}

/// Download name of a card, e.g. `hyrox-roast-Jane-Doe-stories.png`.
///
/// Quotes, backslashes and control characters are dropped so the name can
/// sit inside a quoted `Content-Disposition` parameter.
pub fn share_card_file_name(athlete_name: &str, format: Option<ShareFormat>) -> String {
    let name: String = WHITESPACE
        .replace_all(athlete_name, "-")
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\'))
        .collect();
    match format {
        Some(format) => format!("hyrox-roast-{name}-{format}.png"),
        None => format!("hyrox-roast-{name}.png"),
    }
}
