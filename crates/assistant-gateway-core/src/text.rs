//! Plain-text helpers shared by the indexer and the retrieval engine.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Marker appended by [`trim_words`] when text was cut.
pub const ELLIPSIS: &str = "\u{2026}";

static SCRIPT_STYLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>").ok()
});

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());

fn remove_all<'a>(re: &LazyLock<Option<Regex>>, text: &'a str) -> Cow<'a, str> {
    match &**re {
        Some(re) => re.replace_all(text, ""),
        None => Cow::Borrowed(text),
    }
}

/// Remove markup from `html`.
///
/// `<script>` and `<style>` elements are dropped together with their
/// contents, every other tag is removed and its text kept. The result is
/// trimmed. Entities are left as-is.
pub fn strip_tags(html: &str) -> String {
    let without_blocks = remove_all(&SCRIPT_STYLE, html);
    let without_tags = remove_all(&TAG, &without_blocks);
    without_tags.trim().to_string()
}

/// Limit `text` to `max_words` whitespace-separated words.
///
/// Whitespace runs are collapsed to a single space. If words were dropped,
/// [`ELLIPSIS`] is appended.
pub fn trim_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut out = kept.join(" ");
    if words.next().is_some() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_keeps_text() {
        assert_eq!(
            strip_tags("<p>Hello <strong>world</strong></p>\n"),
            "Hello world"
        );
    }

    #[test]
    fn test_strip_tags_drops_script_and_style() {
        let html = "<style>p { color: red }</style><p>Visible</p><SCRIPT type=\"x\">alert(1)</SCRIPT>";
        assert_eq!(strip_tags(html), "Visible");
    }

    #[test]
    fn test_strip_tags_multiline_tag() {
        assert_eq!(strip_tags("<a\n href=\"x\">link</a>"), "link");
    }

    #[test]
    fn test_trim_words_short_text_normalized() {
        assert_eq!(trim_words("one  two\nthree", 5), "one two three");
    }

    #[test]
    fn test_trim_words_cuts_and_marks() {
        assert_eq!(trim_words("a b c d e", 3), format!("a b c{}", ELLIPSIS));
    }

    #[test]
    fn test_trim_words_exact_count_no_marker() {
        assert_eq!(trim_words("a b c", 3), "a b c");
    }
}
