//! Text helpers for event presentation fields.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a description that has to be truncated for the map card.
pub const DESCRIPTION_MAX_CHARS: usize = 140;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]*>").expect("Invalid tag regex"));

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Removes HTML tags and decodes the handful of entities editors emit.
pub fn strip_html(s: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(s, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    WHITESPACE_REGEX.replace_all(decoded.trim(), " ").into_owned()
}

/// Truncates `s` to at most `max_len` characters, ending in `...` if cut.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated.trim_end()))
}

/// Strips HTML and caps the result at [`DESCRIPTION_MAX_CHARS`].
///
/// Returns `None` if nothing but markup was present.
pub fn card_description(html: &str) -> Option<String> {
    let text = strip_html(html);
    if text.is_empty() {
        return None;
    }
    Some(ellipsis(&text, DESCRIPTION_MAX_CHARS).into_owned())
}

/// Returns `None` for missing or blank strings, the trimmed value otherwise.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
