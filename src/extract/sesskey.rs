//! Session action key extraction

use crate::extract::text::selector;
use regex::Regex;
use scraper::Html;

/// Marker of the inline script that carries the Moodle config object
const CONFIG_MARKER: &str = "M.cfg";

/// Extracts the session action key (`sesskey`) from a Moodle page.
///
/// Scans inline `<script>` blocks for the one defining the config object and
/// returns the first `"sesskey":"..."` value found there. There is no
/// fallback source.
pub fn extract_sesskey(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let script_selector = selector("script")?;
    let pattern = Regex::new(r#""sesskey":"([^"]+)""#).ok()?;

    document
        .select(&script_selector)
        .map(|script| script.text().collect::<String>())
        .filter(|body| body.contains(CONFIG_MARKER))
        .find_map(|body| {
            pattern
                .captures(&body)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
}
