//! Profile page extraction

use crate::extract::text::{decode_text, document_text, element_text, selector};
use crate::models::UserProfile;
use scraper::{ElementRef, Html};

/// Heading that carries the user's full name; the profile's primary anchor
const NAME_HEADING: &str = "h1.h2.mb-0";

/// Extracts the user profile from the `/user/profile.php` page.
///
/// Returns `None` when the name heading is missing or holds fewer than two
/// words. All words after the first form the last name.
pub fn extract_user_profile(html: &str) -> Option<UserProfile> {
    let document = Html::parse_document(html);

    let Some(full_name) = document_text(&document, NAME_HEADING) else {
        tracing::debug!("Profile page has no name heading");
        return None;
    };

    let mut parts = full_name.split_whitespace();
    let first_name = parts.next()?.to_string();
    let last_name = parts.collect::<Vec<_>>().join(" ");
    if last_name.is_empty() {
        tracing::debug!("Profile name has a single word, rejecting");
        return None;
    }

    Some(UserProfile {
        first_name,
        last_name,
        email: extract_email(&document),
    })
}

/// Reads the address from the link following the "Email address" term
fn extract_email(document: &Html) -> Option<String> {
    let dt_selector = selector("dt")?;
    let link_selector = selector("a")?;

    let definition = document
        .select(&dt_selector)
        .filter(|dt| element_text(*dt).contains("Email address"))
        .find_map(next_dd)?;
    let link = definition.select(&link_selector).next()?;

    let href = decode_text(link.value().attr("href").unwrap_or(""));
    let email = match href.strip_prefix("mailto:") {
        Some(address) if !address.is_empty() => decode_text(address),
        _ => decode_text(&link.inner_html()),
    };

    let email = email.trim().to_string();
    (!email.is_empty()).then_some(email)
}

/// The `<dd>` sibling that directly follows a `<dt>`
fn next_dd(dt: ElementRef<'_>) -> Option<ElementRef<'_>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|el| el.value().name() == "dd")
}
