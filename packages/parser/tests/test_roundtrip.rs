use pagesmith_parser::parse;

const SAMPLES: &[&str] = &[
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>Café &mdash; Home</title>\n</head>\n<body></body>\n</html>\n",
    "<div class=x id='y' data-flag>\n\t<p>Unclosed paragraph\n\t<p>Another</div>",
    "<ul><li>one<li>two<li>three</ul>",
    "<table><tr><td>a<td>b<tr><td>c</table>",
    "<script>const s = \"</p>\"; if (a<b && c>d) {}</script><style>p > a { color: red }</style>",
    "<!-- comment with <b>markup</b> --><br/><img src=\"a.png\" / ><input disabled>",
    "text before any tag & stray </span> end tag < not a tag",
    "<svg viewBox=\"0 0 10 10\"><path d=\"M0 0L10 10\"/></svg><![CDATA[ raw ]]><?xml-ish ?>",
    "<p>emoji 🎉 and ünïcödé</p>",
    "<div><span>unterminated",
    "<a href=\"/x\" title = 'spaced' >link</a  >",
];

#[test]
fn test_unmodified_documents_roundtrip() {
    for source in SAMPLES {
        let doc = parse(source).unwrap();
        assert_eq!(doc.serialize(), *source, "roundtrip failed for {source:?}");
    }
}

#[test]
fn test_single_edit_leaves_rest_intact() {
    let source = "<div class=x id='y' data-flag>\n\t<p>Unclosed paragraph\n\t<p>Another</div>";
    let mut doc = parse(source).unwrap();
    let paragraphs = doc.query_selector_all("#y p");
    assert_eq!(paragraphs.len(), 2);
    assert!(doc.set_text_of(paragraphs[0], "Changed\n\t"));
    assert_eq!(
        doc.serialize(),
        "<div class=x id='y' data-flag>\n\t<p>Changed\n\t<p>Another</div>"
    );
}

#[test]
fn test_attribute_edit_on_unquoted_value() {
    let mut doc = parse("<div class=x>hi</div>").unwrap();
    let div = doc.query_selector(".x").unwrap();
    assert!(doc.set_attribute_of(div, "class", "x y"));
    assert_eq!(doc.serialize(), "<div class=\"x y\">hi</div>");
}

#[test]
fn test_text_is_escaped_on_write() {
    let mut doc = parse("<h1>Old</h1>").unwrap();
    let h1 = doc.query_selector("h1").unwrap();
    doc.set_text_of(h1, "<Fish & Chips>");
    assert_eq!(doc.serialize(), "<h1>&lt;Fish &amp; Chips&gt;</h1>");
    assert_eq!(doc.text_content(h1), "<Fish & Chips>");
}

#[test]
fn test_named_entities_decode_in_text() {
    let doc = parse("<html><body><p>caf&eacute; &mdash; &hellip;</p></body></html>").unwrap();
    assert_eq!(doc.get_text("p"), "café — …");
}

#[test]
fn test_extreme_nth_selector_matches_nothing() {
    let doc = parse("<html><body><ul><li>a</li><li>b</li></ul></body></html>").unwrap();
    assert_eq!(doc.count_matches("li:nth-child(-n-2147483648)"), 0);
    assert_eq!(doc.count_matches("li:nth-child(2147483647n-2147483648)"), 0);
}
