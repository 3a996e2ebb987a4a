use crate::error::UnknownExtractMode;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How a mapped field is read back out of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    Text,
    Html,
    Attribute,
}

impl FromStr for ExtractMode {
    type Err = UnknownExtractMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ExtractMode::Text),
            "html" => Ok(ExtractMode::Html),
            "attribute" => Ok(ExtractMode::Attribute),
            other => Err(UnknownExtractMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractMode::Text => write!(f, "text"),
            ExtractMode::Html => write!(f, "html"),
            ExtractMode::Attribute => write!(f, "attribute"),
        }
    }
}

/// One content-path to selector correspondence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectorMapping {
    pub path: &'static str,
    pub selector: &'static str,
    pub mode: ExtractMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<&'static str>,
}

impl SelectorMapping {
    pub const fn text(path: &'static str, selector: &'static str) -> Self {
        Self {
            path,
            selector,
            mode: ExtractMode::Text,
            attribute: None,
        }
    }

    pub const fn html(path: &'static str, selector: &'static str) -> Self {
        Self {
            path,
            selector,
            mode: ExtractMode::Html,
            attribute: None,
        }
    }

    pub const fn attribute(
        path: &'static str,
        selector: &'static str,
        attribute: &'static str,
    ) -> Self {
        Self {
            path,
            selector,
            mode: ExtractMode::Attribute,
            attribute: Some(attribute),
        }
    }
}

/// Page structure the injector writes into, as seen by the validator
pub const SELECTOR_MAPPINGS: &[SelectorMapping] = &[
    // Metadata
    SelectorMapping::text("metadata.title", "title"),
    SelectorMapping::attribute("metadata.description", r#"meta[name="description"]"#, "content"),
    SelectorMapping::attribute("metadata.keywords", r#"meta[name="keywords"]"#, "content"),
    SelectorMapping::attribute("metadata.ogTitle", r#"meta[property="og:title"]"#, "content"),
    SelectorMapping::attribute(
        "metadata.ogDescription",
        r#"meta[property="og:description"]"#,
        "content",
    ),
    SelectorMapping::attribute("metadata.ogImage", r#"meta[property="og:image"]"#, "content"),
    // Hero
    SelectorMapping::text("hero.heading", ".hero h1"),
    SelectorMapping::text("hero.subheading", ".hero .hero-subtitle"),
    SelectorMapping::text("hero.ctaText", ".hero .hero-cta"),
    SelectorMapping::attribute("hero.ctaLink", ".hero .hero-cta", "href"),
    SelectorMapping::attribute("hero.image", ".hero .hero-image", "src"),
    // Banner
    SelectorMapping::text("banner.text", ".banner .banner-text"),
    SelectorMapping::attribute("banner.linkUrl", ".banner .banner-link", "href"),
    // Content
    SelectorMapping::text("content.heading", ".content-section h2"),
    SelectorMapping::html("content.body", ".content-section .content-body"),
    // Team
    SelectorMapping::text("team.heading", ".team h2"),
    SelectorMapping::html("team.members", ".team .team-member"),
    // Events
    SelectorMapping::text("events.heading", ".events h2"),
    SelectorMapping::html("events.events", ".events .event-item"),
    // Form
    SelectorMapping::text("form.heading", ".form-section h2"),
    SelectorMapping::text("form.description", ".form-section .form-description"),
    SelectorMapping::text("form.submitLabel", r#".form-section button[type="submit"]"#),
    SelectorMapping::attribute("form.action", ".form-section form", "action"),
    // Info
    SelectorMapping::html("info.items", ".info .info-item"),
    // FAQ
    SelectorMapping::text("faq.heading", ".faq h2"),
    SelectorMapping::html("faq.items", ".faq .faq-item"),
    // Contact
    SelectorMapping::text("contact.address", ".contact .contact-address"),
    SelectorMapping::text("contact.phone", ".contact .contact-phone"),
    SelectorMapping::text("contact.email", ".contact .contact-email"),
    SelectorMapping::html("contact.buttons", ".contact .contact-button"),
    // Footer
    SelectorMapping::text("footer.text", ".footer .footer-text"),
    SelectorMapping::text("footer.copyright", ".footer .footer-copyright"),
];

/// Look up a mapping by content path
pub fn mapping_for(path: &str) -> Option<&'static SelectorMapping> {
    SELECTOR_MAPPINGS.iter().find(|m| m.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesmith_parser::SelectorList;
    use std::collections::HashSet;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("html".parse::<ExtractMode>(), Ok(ExtractMode::Html));
        assert!("markdown".parse::<ExtractMode>().is_err());
    }

    #[test]
    fn test_table_is_well_formed() {
        let mut paths = HashSet::new();
        for mapping in SELECTOR_MAPPINGS {
            assert!(paths.insert(mapping.path), "duplicate path {}", mapping.path);
            assert!(
                SelectorList::parse(mapping.selector).is_ok(),
                "selector {} does not compile",
                mapping.selector
            );
            assert_eq!(
                mapping.mode == ExtractMode::Attribute,
                mapping.attribute.is_some(),
                "{}",
                mapping.path
            );
        }
    }

    #[test]
    fn test_lookup_by_path() {
        let hero = mapping_for("hero.heading").unwrap();
        assert_eq!(hero.selector, ".hero h1");
        assert!(mapping_for("nope").is_none());
    }
}
