use crate::mapping::{ExtractMode, SelectorMapping};
use pagesmith_parser::{parse, HtmlDocument};
use std::collections::BTreeMap;

/// Read one field out of `html`. Never fails: unparseable HTML, a missing
/// selector, or attribute mode without an attribute name all yield `""`.
pub fn extract_field(html: &str, selector: &str, mode: ExtractMode, attribute: Option<&str>) -> String {
    match parse(html) {
        Ok(doc) => read(&doc, selector, mode, attribute),
        Err(err) => {
            tracing::warn!(selector, error = %err, "cannot extract from unparseable HTML");
            String::new()
        }
    }
}

/// [`extract_field`] with the mode given by name; unknown modes yield `""`
pub fn extract_field_named(html: &str, selector: &str, mode: &str, attribute: Option<&str>) -> String {
    match mode.parse::<ExtractMode>() {
        Ok(mode) => extract_field(html, selector, mode, attribute),
        Err(err) => {
            tracing::warn!(selector, error = %err, "unrecognized extraction mode");
            String::new()
        }
    }
}

/// Read every mapped field, keyed by content path
pub fn extract_mapped_fields(html: &str, mappings: &[SelectorMapping]) -> BTreeMap<String, String> {
    let doc = parse(html).ok();
    mappings
        .iter()
        .map(|m| {
            let value = doc
                .as_ref()
                .map(|doc| read(doc, m.selector, m.mode, m.attribute))
                .unwrap_or_default();
            (m.path.to_string(), value)
        })
        .collect()
}

fn read(doc: &HtmlDocument, selector: &str, mode: ExtractMode, attribute: Option<&str>) -> String {
    match mode {
        ExtractMode::Text => doc.get_text(selector),
        ExtractMode::Html => doc.get_inner_html(selector),
        ExtractMode::Attribute => match attribute {
            Some(name) => doc.get_attribute(selector, name),
            None => {
                tracing::warn!(selector, "attribute mode requires an attribute name");
                String::new()
            }
        },
    }
}

/// Selectors whose inner HTML differs between two renders of a page.
///
/// A selector present on only one side counts as changed when that side has
/// content. Empty input or identical documents report nothing.
pub fn detect_changes<S: AsRef<str>>(original: &str, current: &str, selectors: &[S]) -> Vec<String> {
    if original.is_empty() || current.is_empty() || original == current {
        return Vec::new();
    }
    let (Ok(before), Ok(after)) = (parse(original), parse(current)) else {
        tracing::warn!("cannot diff unparseable HTML");
        return Vec::new();
    };

    selectors
        .iter()
        .map(AsRef::as_ref)
        .filter(|selector| inner(&before, selector) != inner(&after, selector))
        .map(str::to_string)
        .collect()
}

fn inner(doc: &HtmlDocument, selector: &str) -> String {
    doc.query_selector(selector)
        .map(|id| doc.inner_html(id))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::SELECTOR_MAPPINGS;
    use rstest::rstest;

    const PAGE: &str = r#"<html><head><title>T</title><meta name="description" content="D"></head>
<body><section class="hero"><h1>Hello <em>there</em></h1><a class="hero-cta" href="/go">Go</a></section></body></html>"#;

    #[rstest]
    #[case(".hero h1", "text", None, "Hello there")]
    #[case(".hero h1", "html", None, "Hello <em>there</em>")]
    #[case(".hero-cta", "attribute", Some("href"), "/go")]
    #[case(".hero-cta", "attribute", None, "")]
    #[case(".hero-cta", "markdown", None, "")]
    #[case(".missing", "text", None, "")]
    fn test_extract_field_named(
        #[case] selector: &str,
        #[case] mode: &str,
        #[case] attribute: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(extract_field_named(PAGE, selector, mode, attribute), expected);
    }

    #[test]
    fn test_extract_never_panics_on_bad_input() {
        assert_eq!(extract_field("", "h1", ExtractMode::Text, None), "");
        assert_eq!(extract_field("<<<>>>", "h1", ExtractMode::Html, None), "");
        assert_eq!(extract_field("<p>x</p>", "p >", ExtractMode::Text, None), "");
    }

    #[test]
    fn test_extract_mapped_fields() {
        let fields = extract_mapped_fields(PAGE, SELECTOR_MAPPINGS);
        assert_eq!(fields["metadata.title"], "T");
        assert_eq!(fields["metadata.description"], "D");
        assert_eq!(fields["hero.ctaLink"], "/go");
        assert_eq!(fields["faq.heading"], "");
        assert_eq!(fields.len(), SELECTOR_MAPPINGS.len());
    }

    #[test]
    fn test_detect_changes() {
        let before = r#"<div class="a">1</div><div class="b">2</div>"#;
        let after = r#"<div class="a">1</div><div class="b">3</div><div class="c">new</div>"#;
        let changed = detect_changes(before, after, &[".a", ".b", ".c", ".d"]);
        assert_eq!(changed, vec![".b".to_string(), ".c".to_string()]);
    }

    #[test]
    fn test_detect_changes_trivial_inputs() {
        let page = "<p>x</p>";
        assert!(detect_changes(page, page, &["p"]).is_empty());
        assert!(detect_changes("", page, &["p"]).is_empty());
        assert!(detect_changes(page, "", &["p"]).is_empty());
    }
}
