//! Character reference decoding and escaping for text and attributes.

use std::borrow::Cow;

/// Decode character references (`&amp;`, `&eacute;`, `&#39;`, `&#x27;`, ...).
///
/// Unknown or malformed references are kept verbatim.
pub fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    html_escape::decode_html_entities(raw)
}

/// Escape a string for use as element text content.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape a string for use inside an attribute value delimited by `quote`.
pub fn escape_attribute(value: &str, quote: char) -> Cow<'_, str> {
    match quote {
        '\'' => html_escape::encode_single_quoted_attribute(value),
        _ => html_escape::encode_double_quoted_attribute(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode("&lt;b&gt;"), "<b>");
        assert_eq!(decode("it&#39;s"), "it's");
        assert_eq!(decode("it&#x27;s"), "it's");
        assert_eq!(decode("&copy; 2024"), "© 2024");
    }

    #[test]
    fn test_decode_full_named_table() {
        assert_eq!(decode("caf&eacute; &mdash; &hellip;"), "café — …");
        assert_eq!(decode("&Uuml;ber &frac12; &hearts;"), "Über ½ ♥");
    }

    #[test]
    fn test_decode_keeps_unknown_references() {
        assert_eq!(decode("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode("fish & chips"), "fish & chips");
        assert!(matches!(decode("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("plain"), "plain");
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_escape_attribute_respects_quote() {
        assert_eq!(escape_attribute(r#"say "hi""#, '"'), "say &quot;hi&quot;");
        assert_eq!(escape_attribute(r#"say "hi""#, '\''), r#"say "hi""#);

        let single = escape_attribute("it's", '\'');
        assert!(!single.contains('\''));
        assert_eq!(decode(&single), "it's");
    }
}
