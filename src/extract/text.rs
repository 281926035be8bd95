//! Shared text and selector helpers for the extractors

use percent_encoding::percent_decode_str;
use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector; selectors are static strings, so a failure only
/// means the caller's field is skipped
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Collapses all whitespace runs in `text` to single spaces and trims it
pub(crate) fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, whitespace-normalized
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Normalized text of the first element matching `css` under `scope`
pub(crate) fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    scope
        .select(&sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Same as [`first_text`], over a whole document
pub(crate) fn document_text(document: &Html, css: &str) -> Option<String> {
    first_text(document.root_element(), css)
}

/// Tries each strategy in order and returns the first `Some`
pub(crate) fn first_match<'a, T>(
    scope: ElementRef<'a>,
    strategies: &[fn(ElementRef<'_>) -> Option<T>],
) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(scope))
}

/// Strips a leading label such as `Due:` or `Opened:` from date text
pub(crate) fn strip_label(text: &str, labels: &[&str]) -> String {
    let trimmed = text.trim();
    for label in labels {
        if let Some(rest) = trimmed.strip_prefix(label) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Opaque display dates read from an activity-dates region
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ActivityDates {
    pub due: Option<String>,
    pub open: Option<String>,
    pub close: Option<String>,
}

/// Reads the `Due:`, `Opens:`/`Opened:` and `Closes:`/`Closed:` lines under
/// `scope`. Later lines overwrite earlier ones with the same label.
pub(crate) fn activity_dates(scope: ElementRef<'_>) -> ActivityDates {
    let mut dates = ActivityDates::default();
    let Some(date_selector) = selector("[data-region='activity-dates'] div") else {
        return dates;
    };

    for div in scope.select(&date_selector) {
        let text = element_text(div);
        if text.contains("Due:") {
            dates.due = Some(strip_label(&text, &["Due:"]));
        } else if text.contains("Opens:") || text.contains("Opened:") {
            dates.open = Some(strip_label(&text, &["Opens:", "Opened:"]));
        } else if text.contains("Closes:") || text.contains("Closed:") {
            dates.close = Some(strip_label(&text, &["Closes:", "Closed:"]));
        }
    }
    dates
}

/// Label/value pairs from `th`/`td` rows and `dt`/`dd` lists
pub(crate) fn label_values(scope: ElementRef<'_>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let (Some(row_sel), Some(th_sel), Some(td_sel)) =
        (selector("tr"), selector("th"), selector("td"))
    {
        for row in scope.select(&row_sel) {
            let label = row.select(&th_sel).next().map(element_text);
            let value = row.select(&td_sel).next().map(element_text);
            if let (Some(label), Some(value)) = (label, value) {
                pairs.push((label.trim_end_matches(':').to_string(), value));
            }
        }
    }

    if let (Some(dt_sel), Some(dd_sel)) = (selector("dt"), selector("dd")) {
        let labels = scope.select(&dt_sel).map(element_text);
        let values = scope.select(&dd_sel).map(element_text);
        for (label, value) in labels.zip(values) {
            pairs.push((label.trim_end_matches(':').to_string(), value));
        }
    }

    pairs
}

/// Decodes HTML entities, then percent-encoding.
///
/// Each stage is best effort: when a stage cannot decode its input, the
/// output of the previous stage is returned unchanged. Never fails.
pub fn decode_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(text);
    let entity_decoded: String = fragment.root_element().text().collect();

    match percent_decode_str(&entity_decoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => entity_decoded,
    }
}
