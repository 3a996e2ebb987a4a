use pagesmith_content::{
    detect_changes, extract_field, extract_mapped_fields, inject_with_report, validate_html_structure,
    validate_selectors, ContentDocument, ExtractMode, InjectWarning, SELECTOR_MAPPINGS,
};

const TEMPLATE: &str = include_str!("fixtures/landing.html");
const CONTENT: &str = include_str!("fixtures/content.json");

fn content() -> ContentDocument {
    serde_json::from_str(CONTENT).unwrap()
}

#[test]
fn test_fixture_template_is_valid() {
    assert!(validate_html_structure(TEMPLATE));
    let report = validate_selectors(TEMPLATE);
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn test_inject_full_document() {
    let report = inject_with_report(TEMPLATE, &content()).unwrap();
    let html = &report.html;

    assert!(html.contains("<title>Riverside Studio &amp; Co</title>"));
    assert!(html.contains(r#"<meta name="keywords" content="studio, river, classes">"#));
    assert!(html.contains(r#"<meta property="og:title" content="Riverside Studio &amp; Co">"#));
    assert!(html.contains(r#"<meta property="og:image" content="/img/og-2.jpg">"#));
    assert!(html.contains("<h1>Make things by the river</h1>"));
    assert!(html.contains(r#"<a class="hero-cta" href="/courses">See classes</a>"#));
    assert!(html.contains(r#"<div class="banner">"#));
    assert!(html.contains(r#"<span class="banner-text">Summer term is open</span>"#));
    assert!(html.contains(r#"<div class="content-body">We started in 2015.<br>We moved in 2020.</div>"#));
    assert!(html.contains(r#"<div class="team-member featured">"#));
    assert!(html.contains(r#"<p class="member-role">Head teacher</p>"#));
    assert_eq!(html.matches(r#"<span class="featured-badge">Lead</span>"#).count(), 1);
    assert!(html.contains(r#"<p class="faq-answer">10+</p>"#));
    assert!(!html.contains("Refunds?"));

    // Untouched regions come through byte-for-byte
    let footer_start = TEMPLATE.find(r#"<footer class="footer">"#).unwrap();
    assert!(html.ends_with(&TEMPLATE[footer_start..]));
    assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n"));

    assert_eq!(report.warnings.len(), 2);
    assert!(matches!(
        &report.warnings[0],
        InjectWarning::ItemsDropped { section_id, supplied: 3, available: 2, .. } if section_id == "faq"
    ));
    assert!(matches!(
        &report.warnings[1],
        InjectWarning::UnknownSectionType { type_name, .. } if type_name == "testimonials"
    ));
}

#[test]
fn test_injection_is_idempotent() {
    let doc = content();
    let once = inject_with_report(TEMPLATE, &doc).unwrap().html;
    let twice = inject_with_report(&once, &doc).unwrap().html;
    assert_eq!(once, twice);
}

#[test]
fn test_injected_values_extract_back() {
    let html = inject_with_report(TEMPLATE, &content()).unwrap().html;
    let fields = extract_mapped_fields(&html, SELECTOR_MAPPINGS);
    assert_eq!(fields["metadata.title"], "Riverside Studio & Co");
    assert_eq!(fields["hero.heading"], "Make things by the river");
    assert_eq!(fields["hero.ctaLink"], "/courses");
    assert_eq!(fields["content.body"], "We started in 2015.<br>We moved in 2020.");
    assert_eq!(
        extract_field(&html, ".team-member .member-role", ExtractMode::Text, None),
        "Founder"
    );
}

#[test]
fn test_detect_changes_after_injection() {
    let html = inject_with_report(TEMPLATE, &content()).unwrap().html;
    let selectors: Vec<&str> = SELECTOR_MAPPINGS.iter().map(|m| m.selector).collect();
    let changed = detect_changes(TEMPLATE, &html, &selectors);

    assert!(changed.contains(&"title".to_string()));
    assert!(changed.contains(&".hero h1".to_string()));
    assert!(changed.contains(&".team .team-member".to_string()));
    assert!(!changed.contains(&".footer .footer-text".to_string()));
    // meta tags have no inner HTML, so attribute edits do not show up here
    assert!(!changed.contains(&r#"meta[name="description"]"#.to_string()));
}
